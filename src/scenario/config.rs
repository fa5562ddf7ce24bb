//! Scenario-wide configuration (§4.5).

use std::time::Duration;

/// `{recording, timeout}`: `recording` controls whether each component's
/// wire-level `Interaction`s are drained and aggregated into
/// `TestCaseResult::interactions`/`TestResult::interactions` (§6); turning it
/// off still drains each component's interaction mailbox every test case (so
/// memory doesn't grow unbounded) but reports `None` instead of the
/// collected list, for scenarios with many test cases where keeping every
/// exchange isn't worth the memory. It does not affect `StepResult`s, which
/// are always kept. `timeout` bounds an entire `run()` call, distinct from
/// the per-step timeout in [`crate::step::DEFAULT_STEP_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct TestScenarioConfig {
    pub recording: bool,
    pub timeout: Duration,
    pub fail_fast: bool,
}

impl Default for TestScenarioConfig {
    fn default() -> Self {
        Self {
            recording: true,
            timeout: Duration::from_secs(300),
            fail_fast: true,
        }
    }
}
