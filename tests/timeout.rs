//! End-to-end: a step whose action never resolves fails once its timeout
//! elapses, and the failure message names it as a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use testurio::component::AsyncServer;
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::testcase::{TestCase, TestCaseMetadata};
use testurio::transport::{InMemoryAsyncNetwork, InMemoryAsyncServer};
use testurio::util::Address;

#[tokio::test]
async fn waiting_for_a_message_that_never_arrives_times_out() {
    let network = InMemoryAsyncNetwork::new();
    let listen = Address::local(4200);

    let server = AsyncServer::new(
        "server",
        Arc::new(InMemoryAsyncServer::new(network, listen.clone())),
        listen,
    );

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(server);
    scenario.start().await.unwrap();

    let test_case = TestCase::new("never-arrives", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);
        let server = builder.use_component::<AsyncServer<InMemoryAsyncServer>>("server").unwrap();
        server
            .wait_message("ping")
            .with_timeout(Duration::from_millis(200))
            .assert(|_payload| Ok(true));
    });

    let started = Instant::now();
    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(!result.test_cases[0].passed);
    assert!(result
        .test_cases[0]
        .errors
        .iter()
        .any(|e| e.to_lowercase().contains("timeout")));
    assert!(started.elapsed() < Duration::from_secs(2));
}
