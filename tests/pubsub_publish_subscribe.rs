//! End-to-end: a subscriber subscribes to a topic, a publisher publishes
//! to it, and the subscriber's pre-registered `wait_event` hook captures
//! the message regardless of delivery timing.

use std::sync::Arc;

use serde_json::json;

use testurio::component::{Publisher, Subscriber};
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::testcase::{TestCase, TestCaseMetadata};
use testurio::transport::{InMemoryMqBroker, InMemoryPublisher, InMemorySubscriber};

#[tokio::test]
async fn subscriber_observes_a_published_message_after_subscribing() {
    let broker = InMemoryMqBroker::new();

    let publisher = Publisher::new("pub", Arc::new(InMemoryPublisher::new(broker.clone())));
    let subscriber = Subscriber::new("sub", Arc::new(InMemorySubscriber::new(broker)));

    let scenario = TestScenario::new(TestScenarioConfig::default());
    scenario.register(publisher);
    scenario.register(subscriber);
    scenario.start().await.unwrap();

    let test_case = TestCase::new("fanout", TestCaseMetadata::new(), |builder| {
        builder.set_phase(Phase::Test);

        let subscriber = builder
            .use_component::<Subscriber<InMemorySubscriber>>("sub")
            .unwrap();
        subscriber.subscribe("orders");
        let wait = subscriber.wait_event("order-created");

        let publisher = builder
            .use_component::<Publisher<InMemoryPublisher>>("pub")
            .unwrap();
        publisher.publish("orders", "order-created", json!({"id": 7}));

        wait.assert(|payload| Ok(payload["id"] == 7));
    });

    let result = scenario.run(vec![vec![test_case]]).await;
    scenario.stop().await;

    assert!(result.all_passed(), "errors: {:?}", result.test_cases[0].errors);
    assert_eq!(result.test_cases[0].step_results.len(), 3);
}
