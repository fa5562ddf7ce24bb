//! End-to-end: groups of test cases run concurrently, and a failure in one
//! group doesn't affect test cases in another (§8 "parallel groups").

use std::sync::Arc;
use std::time::{Duration, Instant};

use testurio::component::ComponentError;
use testurio::phase::Phase;
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::step::{CustomAction, Step, StepAction, TestContext};
use testurio::testcase::{TestCase, TestCaseMetadata};

fn passing(name: &str) -> TestCase {
    let name = name.to_string();
    TestCase::new(name.clone(), TestCaseMetadata::new(), move |builder| {
        builder.set_phase(Phase::Test);
        let action: CustomAction = Arc::new(|_ctx: TestContext| Box::pin(async { Ok(()) }));
        builder.register_step(Step::new(format!("noop-{name}"), Phase::Test, StepAction::Custom(action)));
    })
}

fn failing(name: &str) -> TestCase {
    let name = name.to_string();
    TestCase::new(name.clone(), TestCaseMetadata::new(), move |builder| {
        builder.set_phase(Phase::Test);
        let action: CustomAction = Arc::new(|_ctx: TestContext| {
            Box::pin(async { Err(ComponentError::AssertionFailed("deliberately failing".into())) })
        });
        builder.register_step(Step::new(format!("fail-{name}"), Phase::Test, StepAction::Custom(action)));
    })
}

#[tokio::test]
async fn one_failing_case_does_not_affect_other_groups() {
    let scenario = TestScenario::new(TestScenarioConfig::default());

    let groups = vec![
        vec![passing("tc1"), failing("tc2"), passing("tc3")],
        vec![passing("tc4")],
    ];

    let result = scenario.run(groups).await;

    assert_eq!(result.test_cases.len(), 4);
    assert!(!result.all_passed());

    let by_name = |name: &str| {
        result
            .test_cases
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("missing test case {name}"))
    };

    assert!(by_name("tc1").passed);
    assert!(!by_name("tc2").passed);
    assert!(by_name("tc3").passed);
    assert!(by_name("tc4").passed);
}

fn sleeper(name: &str, millis: u64) -> TestCase {
    let name = name.to_string();
    TestCase::new(name.clone(), TestCaseMetadata::new(), move |builder| {
        builder.set_phase(Phase::Test);
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(())
            })
        });
        builder.register_step(Step::new(format!("sleep-{name}"), Phase::Test, StepAction::Custom(action)));
    })
}

#[tokio::test]
async fn groups_actually_run_concurrently_on_the_wall_clock() {
    let scenario = TestScenario::new(TestScenarioConfig::default());
    let sleep_ms = 200;

    let groups = vec![
        vec![sleeper("slow-a", sleep_ms)],
        vec![sleeper("slow-b", sleep_ms)],
    ];

    let started = Instant::now();
    let result = scenario.run(groups).await;
    let elapsed = started.elapsed();

    assert!(result.all_passed());
    // Two groups each sleeping `sleep_ms` run concurrently, so the total
    // wall clock stays close to one sleep rather than summing to two.
    assert!(
        elapsed < Duration::from_millis(sleep_ms * 2),
        "groups did not run concurrently: took {elapsed:?} for two {sleep_ms}ms sleeps"
    );
}
