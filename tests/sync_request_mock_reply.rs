//! End-to-end: a client sends a request, a server mocks the reply, the
//! client asserts against it.

use std::sync::Arc;

use serde_json::json;

use testurio::component::{SyncClient, SyncServer};
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::testcase::{TestCase, TestCaseMetadata};
use testurio::transport::{InMemorySyncClient, InMemorySyncNetwork, InMemorySyncServer};
use testurio::util::Address;

#[tokio::test]
async fn client_sees_the_mocked_response() {
    let network = InMemorySyncNetwork::new();
    let listen = Address::local(3000);

    let server = SyncServer::new(
        "backend",
        Arc::new(InMemorySyncServer::new(network.clone(), listen.clone())),
        listen.clone(),
    );
    let client = SyncClient::new(
        "api",
        Arc::new(InMemorySyncClient::new(network)),
        listen,
    );

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(server);
    scenario.register(client);
    scenario.start().await.unwrap();

    let test_case = TestCase::new("getUser", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);

        let backend = builder.use_component::<SyncServer<InMemorySyncServer>>("backend").unwrap();
        backend
            .on_request("getUser")
            .mock_response(|_req| Ok(testurio::hook::HandlerOutput::Value(json!({"code": 200, "body": {"id": 1, "name": "Alice"}}))));

        let api = builder.use_component::<SyncClient<InMemorySyncClient>>("api").unwrap();
        api.request("getUser", json!({"method": "GET", "path": "/users/1"}))
            .on_response(|response| {
                if response["code"] == 200 && response["body"]["name"] == "Alice" {
                    Ok(())
                } else {
                    Err(testurio::hook::HandlerError::new("unexpected response"))
                }
            });
    });

    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(result.all_passed(), "errors: {:?}", result.test_cases[0].errors);
    assert_eq!(result.test_cases[0].step_results.len(), 1);
}

#[tokio::test]
async fn no_matching_mock_yields_a_404_and_the_assertion_fails() {
    let network = InMemorySyncNetwork::new();
    let listen = Address::local(3010);

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

    let test_case = TestCase::new("getUser-unmocked", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);
        let api = builder.use_component::<SyncClient<InMemorySyncClient>>("api").unwrap();
        api.request("getUser", json!({}))
            .on_response(|response| {
                if response["code"] == 200 {
                    Ok(())
                } else {
                    Err(testurio::hook::HandlerError::new("expected a mocked 200"))
                }
            });
    });

    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(!result.all_passed());
}
