//! End-to-end: a `DataSource` is seeded in an Init step, a request handler
//! reads through it, and a later step asserts the value it returns came
//! from the seeded cache rather than a fresh lookup.

use std::sync::Arc;

use serde_json::json;

use testurio::component::{DataSource, SyncClient, SyncServer};
use testurio::hook::HandlerOutput;
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::testcase::{TestCase, TestCaseMetadata};
use testurio::transport::{InMemoryKvStore, InMemorySyncClient, InMemorySyncNetwork, InMemorySyncServer};
use testurio::util::Address;

#[tokio::test]
async fn cached_value_is_served_without_touching_the_backend() {
    let network = InMemorySyncNetwork::new();
    let listen = Address::local(3300);

    let cache = DataSource::new("cache", InMemoryKvStore::new());
    let server = SyncServer::new(
        "backend",
        Arc::new(InMemorySyncServer::new(network.clone(), listen.clone())),
        listen.clone(),
    );
    let client = SyncClient::new("api", Arc::new(InMemorySyncClient::new(network)), listen);

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(cache.clone());
    scenario.register(server);
    scenario.register(client);
    scenario.start().await.unwrap();

    let seed = TestCase::new("seed-cache", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Init);
        let cache = builder.use_component::<DataSource<InMemoryKvStore>>("cache").unwrap();
        cache
            .exec("seed", |store| {
                store.set("user:1", json!({"id": 1, "name": "Alice"}));
                Ok(json!(null))
            })
            .run();
    });
    let seed_result = scenario.run_init(&seed).await;
    assert!(seed_result.passed, "errors: {:?}", seed_result.errors);

    let test_case = TestCase::new("getUser-from-cache", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);

        let backend = builder.use_component::<SyncServer<InMemorySyncServer>>("backend").unwrap();
        backend.on_request("getUser").mock_response(|_req| {
            Ok(HandlerOutput::Value(json!({"code": 200, "body": {"id": 1, "name": "stale-backend-value"}})))
        });

        let cache = builder.use_component::<DataSource<InMemoryKvStore>>("cache").unwrap();
        cache
            .exec("lookup", |store| {
                Ok(store.get("user:1").unwrap_or(json!(null)))
            })
            .assert(|value| Ok(value["name"] == "Alice"));

        let api = builder.use_component::<SyncClient<InMemorySyncClient>>("api").unwrap();
        api.request("getUser", json!({}))
            .on_response(|_response| Ok(()));
    });

    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(result.all_passed(), "errors: {:?}", result.test_cases[0].errors);
    assert_eq!(result.test_cases[0].step_results.len(), 2);
}
