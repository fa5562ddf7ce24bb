//! Two invariants in one file since they share the same fixture:
//! - Test-case isolation: a non-persistent mock registered by one test
//!   case is gone by the time the next test case in the same group runs.
//! - Unhandled-error capture: a handler error with no `wait` step
//!   listening for it still fails the test case once drained from the
//!   component's unhandled-error queue.

use std::sync::Arc;

use serde_json::json;

use testurio::component::{AsyncClient, AsyncServer, SyncClient, SyncServer};
use testurio::hook::{HandlerError, HandlerOutput};
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::testcase::{TestCase, TestCaseMetadata};
use testurio::transport::{
    InMemoryAsyncClient, InMemoryAsyncNetwork, InMemoryAsyncServer, InMemorySyncClient,
    InMemorySyncNetwork, InMemorySyncServer,
};
use testurio::util::Address;

#[tokio::test]
async fn a_mock_registered_in_one_test_case_does_not_leak_into_the_next() {
    let network = InMemorySyncNetwork::new();
    let listen = Address::local(3400);

    let server = SyncServer::new(
        "backend",
        Arc::new(InMemorySyncServer::new(network.clone(), listen.clone())),
        listen.clone(),
    );
    let client = SyncClient::new("api", Arc::new(InMemorySyncClient::new(network)), listen);

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(server);
    scenario.register(client);
    scenario.start().await.unwrap();

    let first = TestCase::new("with-mock", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);
        let backend = builder.use_component::<SyncServer<InMemorySyncServer>>("backend").unwrap();
        backend
            .on_request("getUser")
            .mock_response(|_req| Ok(HandlerOutput::Value(json!({"code": 200}))));

        let api = builder.use_component::<SyncClient<InMemorySyncClient>>("api").unwrap();
        api.request("getUser", json!({})).on_response(|response| {
            if response["code"] == 200 {
                Ok(())
            } else {
                Err(HandlerError::new("expected the mock to answer"))
            }
        });
    });

    let second = TestCase::new("without-mock", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);
        let api = builder.use_component::<SyncClient<InMemorySyncClient>>("api").unwrap();
        api.request("getUser", json!({})).on_response(|response| {
            if response["code"] == 200 {
                Err(HandlerError::new(
                    "first test case's mock leaked into the second",
                ))
            } else {
                Ok(())
            }
        });
    });

    let result = scenario.run(vec![vec![first, second]]).await;
    scenario.stop().await;

    assert!(
        result.test_cases[0].passed,
        "errors: {:?}",
        result.test_cases[0].errors
    );
    assert!(
        result.test_cases[1].passed,
        "errors: {:?}",
        result.test_cases[1].errors
    );
}

#[tokio::test]
async fn a_handler_error_with_no_wait_listening_still_fails_the_test_case() {
    let network = InMemoryAsyncNetwork::new();
    let listen = Address::local(4300);

    let server = AsyncServer::new(
        "server",
        Arc::new(InMemoryAsyncServer::new(network.clone(), listen.clone())),
        listen.clone(),
    );
    let client = AsyncClient::new("client", Arc::new(InMemoryAsyncClient::new(network)), listen);

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(server);
    scenario.register(client);
    scenario.start().await.unwrap();

    let test_case = TestCase::new("server-side-handler-blows-up", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);

        let server = builder.use_component::<AsyncServer<InMemoryAsyncServer>>("server").unwrap();
        server
            .on_message("ping")
            .mock_event("pong", |_payload| Err(HandlerError::new("handler exploded")));

        let client = builder.use_component::<AsyncClient<InMemoryAsyncClient>>("client").unwrap();
        client.send("ping", json!({}));
    });

    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(!result.test_cases[0].passed);
    assert!(result.test_cases[0]
        .errors
        .iter()
        .any(|e| e.contains("handler exploded")));
}
