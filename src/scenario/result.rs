//! Scenario-level run results (§4.7).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::message::Interaction;
use crate::testcase::TestCaseResult;

/// Every test case's result from one `TestScenario::run` call.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub test_cases: Vec<TestCaseResult>,
    pub passed: bool,
    pub duration: Duration,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub total_tests: usize,
    /// Concatenation of every test case's own `interactions`, present only
    /// when the scenario's `recording` config is on (§6).
    pub interactions: Option<Vec<Interaction>>,
}

impl TestResult {
    pub fn summary(&self) -> Summary {
        let total = self.test_cases.len();
        let passed = self.test_cases.iter().filter(|r| r.passed).count();
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };
        let average_duration = if total == 0 {
            Duration::from_secs(0)
        } else {
            self.test_cases.iter().map(|r| r.duration).sum::<Duration>() / total as u32
        };
        Summary {
            total,
            passed,
            failed: total - passed,
            pass_rate,
            average_duration,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.test_cases.iter().all(|r| r.passed)
    }
}

/// `{total, passed, failed, passRate, averageDuration}` (§4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub average_duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testcase::TestCaseMetadata;

    fn result(name: &str, passed: bool, millis: u64) -> TestCaseResult {
        let now = Utc::now();
        TestCaseResult {
            name: name.into(),
            passed,
            step_results: Vec::new(),
            duration: Duration::from_millis(millis),
            start_time: now,
            end_time: now,
            passed_steps: 0,
            failed_steps: 0,
            total_steps: 0,
            metadata: TestCaseMetadata::new(),
            interactions: None,
            errors: Vec::new(),
        }
    }

    fn run(test_cases: Vec<TestCaseResult>) -> TestResult {
        let now = Utc::now();
        let total = test_cases.len();
        let passed = test_cases.iter().filter(|r| r.passed).count();
        TestResult {
            passed: passed == total,
            duration: Duration::from_millis(0),
            start_time: now,
            end_time: now,
            passed_tests: passed,
            failed_tests: total - passed,
            total_tests: total,
            interactions: None,
            test_cases,
        }
    }

    #[test]
    fn summary_counts_pass_and_fail() {
        let result = run(vec![
            result("a", true, 10),
            result("b", false, 20),
            result("c", true, 30),
        ]);
        let summary = result.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.pass_rate - (2.0 / 3.0)).abs() < f64::EPSILON);
        assert_eq!(summary.average_duration, Duration::from_millis(20));
        assert!(!result.all_passed());
    }

    #[test]
    fn all_passed_is_true_when_nothing_failed() {
        let result = run(vec![result("a", true, 5)]);
        assert!(result.all_passed());
        assert_eq!(result.summary().pass_rate, 1.0);
    }
}
