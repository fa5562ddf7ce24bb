//! Outcome of running one `TestCase` (§4.7).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::message::Interaction;
use crate::step::StepResult;

use super::metadata::TestCaseMetadata;

#[derive(Debug, Clone)]
pub struct TestCaseResult {
    pub name: String,
    pub passed: bool,
    pub step_results: Vec<StepResult>,
    pub duration: Duration,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub total_steps: usize,
    /// The test case's own metadata, merged with its scenario's defaults
    /// (§4.7). Carried on the result so a reporter can group/filter without
    /// going back to the `TestCase` it came from.
    pub metadata: TestCaseMetadata,
    /// Every component's wire exchange during this test case, drained once
    /// execution finishes. `None` when the scenario's `recording` config is
    /// off; components still have their own interaction mailboxes drained
    /// either way, so memory doesn't grow unbounded across test cases.
    pub interactions: Option<Vec<Interaction>>,
    /// Assertion/handler failures and drained component `unhandled_errors`,
    /// in the order they were observed.
    pub errors: Vec<String>,
}

impl TestCaseResult {
    pub fn failing_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.step_results.iter().filter(|result| !result.is_passed())
    }
}
