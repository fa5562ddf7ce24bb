//! End-to-end: an async server replies to one message type with an event,
//! and a client waits for that event. The client's `wait_event` hook is
//! pre-registered at build time, so the pong is captured even if the
//! server answers before the wait step is reached by the executor.

use std::sync::Arc;

use serde_json::json;

use testurio::component::{AsyncClient, AsyncServer};
use testurio::hook::HandlerOutput;
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::testcase::{TestCase, TestCaseMetadata};
use testurio::transport::{InMemoryAsyncClient, InMemoryAsyncNetwork, InMemoryAsyncServer};
use testurio::util::Address;

#[tokio::test]
async fn client_observes_the_pong_event_even_though_it_never_polls() {
    let network = InMemoryAsyncNetwork::new();
    let listen = Address::local(4100);

    let server = AsyncServer::new(
        "server",
        Arc::new(InMemoryAsyncServer::new(network.clone(), listen.clone())),
        listen.clone(),
    );
    let client = AsyncClient::new(
        "client",
        Arc::new(InMemoryAsyncClient::new(network)),
        listen,
    );

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(server);
    scenario.register(client);
    scenario.start().await.unwrap();

    let test_case = TestCase::new("ping-pong", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);

        let server = builder.use_component::<AsyncServer<InMemoryAsyncServer>>("server").unwrap();
        server.on_message("ping").mock_event("pong", |payload| {
            Ok(HandlerOutput::Value(json!({"seq": payload["seq"]})))
        });

        // `wait_event` registers its capture hook immediately, before the
        // `send` step below ever runs, so the pong is captured no matter
        // how quickly the server answers relative to step execution order.
        let client = builder.use_component::<AsyncClient<InMemoryAsyncClient>>("client").unwrap();
        let wait = client.wait_event("pong");
        client.send("ping", json!({"seq": 42}));
        wait.assert(|payload| Ok(payload["seq"] == 42));
    });

    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(result.all_passed(), "errors: {:?}", result.test_cases[0].errors);
}
