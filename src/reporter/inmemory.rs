//! Test-friendly reporter that just accumulates every callback it receives,
//! so assertions can inspect exactly what a scenario run reported.

use parking_lot::Mutex;

use async_trait::async_trait;

use crate::scenario::Summary;
use crate::step::StepResult;
use crate::testcase::TestCaseResult;

use super::traits::Reporter;

#[derive(Debug, Clone)]
pub enum ReporterEvent {
    Start,
    TestCaseStart(String),
    StepComplete { test_case: String, result: StepResult },
    TestCaseComplete(TestCaseResult),
    Complete(Summary),
}

#[derive(Default)]
pub struct InMemoryReporter {
    events: Mutex<Vec<ReporterEvent>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReporterEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl Reporter for InMemoryReporter {
    async fn on_start(&self) {
        self.events.lock().push(ReporterEvent::Start);
    }

    async fn on_test_case_start(&self, name: &str) {
        self.events
            .lock()
            .push(ReporterEvent::TestCaseStart(name.to_string()));
    }

    async fn on_step_complete(&self, test_case: &str, result: &StepResult) {
        self.events.lock().push(ReporterEvent::StepComplete {
            test_case: test_case.to_string(),
            result: result.clone(),
        });
    }

    async fn on_test_case_complete(&self, result: &TestCaseResult) {
        self.events
            .lock()
            .push(ReporterEvent::TestCaseComplete(result.clone()));
    }

    async fn on_complete(&self, summary: Summary) {
        self.events.lock().push(ReporterEvent::Complete(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testcase::TestCaseMetadata;
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn records_events_in_call_order() {
        let reporter = InMemoryReporter::new();
        reporter.on_start().await;
        reporter.on_test_case_start("case-1").await;
        let now = Utc::now();
        reporter
            .on_test_case_complete(&TestCaseResult {
                name: "case-1".into(),
                passed: true,
                step_results: Vec::new(),
                duration: Duration::from_millis(0),
                start_time: now,
                end_time: now,
                passed_steps: 0,
                failed_steps: 0,
                total_steps: 0,
                metadata: TestCaseMetadata::new(),
                interactions: None,
                errors: Vec::new(),
            })
            .await;
        reporter
            .on_complete(Summary {
                total: 1,
                passed: 1,
                failed: 0,
                pass_rate: 1.0,
                average_duration: Duration::from_millis(0),
            })
            .await;

        let events = reporter.events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], ReporterEvent::Start));
        assert!(matches!(events[3], ReporterEvent::Complete(_)));
    }
}
