//! The reporter is a pure observer: attaching one doesn't change which
//! test cases pass or fail, and it sees exactly the events the run
//! actually produced (§8 "Reporter neutrality").

use std::sync::Arc;

use async_trait::async_trait;

use testurio::phase::Phase;
use testurio::reporter::{InMemoryReporter, Reporter, ReporterEvent};
use testurio::scenario::{TestScenario, TestScenarioConfig};
use testurio::step::{CustomAction, Step, StepAction, TestContext};
use testurio::testcase::{TestCase, TestCaseMetadata, TestCaseResult};

fn step_case(name: &str, should_pass: bool) -> TestCase {
    let name = name.to_string();
    TestCase::new(name.clone(), TestCaseMetadata::new(), move |builder| {
        builder.set_phase(Phase::Test);
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            Box::pin(async move {
                if should_pass {
                    Ok(())
                } else {
                    Err(testurio::component::ComponentError::AssertionFailed(
                        "deliberate failure".into(),
                    ))
                }
            })
        });
        builder.register_step(Step::new(format!("step-{name}"), Phase::Test, StepAction::Custom(action)));
    })
}

#[tokio::test]
async fn reporter_observes_without_altering_outcomes() {
    let bare = TestScenario::new(TestScenarioConfig::default());
    let bare_result = bare
        .run(vec![vec![step_case("a", true), step_case("b", false)]])
        .await;

    let reporter = Arc::new(InMemoryReporter::new());
    let observed = TestScenario::with_reporter(TestScenarioConfig::default(), reporter.clone());
    observed.start().await.unwrap();
    let observed_result = observed
        .run(vec![vec![step_case("a", true), step_case("b", false)]])
        .await;
    observed.stop().await;

    assert_eq!(bare_result.summary(), observed_result.summary());
    assert_eq!(bare_result.all_passed(), observed_result.all_passed());

    let events = reporter.events();
    assert!(matches!(events.first(), Some(ReporterEvent::Start)));
    assert!(matches!(events.last(), Some(ReporterEvent::Complete(_))));
    assert!(events
        .iter()
        .any(|e| matches!(e, ReporterEvent::TestCaseStart(name) if name == "a")));
    assert!(events
        .iter()
        .any(|e| matches!(e, ReporterEvent::TestCaseComplete(r) if r.name == "b" && !r.passed)));
}

/// A reporter that panics in `on_test_case_complete`, to prove a misbehaving
/// reporter doesn't stop the others from observing the rest of the run.
struct PanickingReporter;

#[async_trait]
impl Reporter for PanickingReporter {
    async fn on_test_case_complete(&self, _result: &TestCaseResult) {
        panic!("this reporter always misbehaves");
    }
}

#[tokio::test]
async fn a_misbehaving_reporter_does_not_stop_other_reporters_from_observing() {
    let well_behaved = Arc::new(InMemoryReporter::new());
    let misbehaving: Arc<dyn Reporter> = Arc::new(PanickingReporter);

    let scenario = TestScenario::with_reporters(
        TestScenarioConfig::default(),
        vec![misbehaving, well_behaved.clone()],
    );
    scenario.start().await.unwrap();
    let result = scenario.run(vec![vec![step_case("a", true)]]).await;
    scenario.stop().await;

    assert!(result.all_passed());

    let events = well_behaved.events();
    assert!(matches!(events.first(), Some(ReporterEvent::Start)));
    assert!(matches!(events.last(), Some(ReporterEvent::Complete(_))));
    assert!(events
        .iter()
        .any(|e| matches!(e, ReporterEvent::TestCaseComplete(r) if r.name == "a" && r.passed)));
}
