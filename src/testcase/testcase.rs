//! `TestCase`: a name, accumulated metadata, and a `buildFn` that records
//! steps against a fresh `TestCaseBuilder` every time it runs (§4.7).

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, instrument, warn};

use crate::component::{Component, ComponentFactory, ComponentScope};
use crate::phase::Phase;
use crate::step::StepExecutor;

use super::builder::TestCaseBuilder;
use super::metadata::TestCaseMetadata;
use super::result::TestCaseResult;

type BuildFn = Arc<dyn Fn(&TestCaseBuilder) + Send + Sync>;

#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub metadata: TestCaseMetadata,
    build: BuildFn,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, metadata: TestCaseMetadata, build: F) -> Self
    where
        F: Fn(&TestCaseBuilder) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            metadata,
            build: Arc::new(build),
        }
    }

    /// Runs the §4.7 algorithm: build the step list, start any components
    /// `use()` touched for the first time (constructing a fresh one from
    /// `factories` when the name isn't already registered), run phases in
    /// `init, before, test, after` order (fail-fast within
    /// `init`/`before`/`test`, `after` always runs so cleanup hooks fire),
    /// drain unhandled component errors and wire interactions, tear down
    /// any `TestCase`-scoped dynamic component, and report.
    #[instrument(skip(self, components, factories, executor), fields(test_case = %self.name))]
    pub async fn execute(
        &self,
        components: Arc<DashMap<String, Arc<dyn Component>>>,
        factories: Arc<DashMap<String, (ComponentScope, ComponentFactory)>>,
        executor: &StepExecutor,
        fail_fast: bool,
        recording: bool,
    ) -> TestCaseResult {
        let started = Instant::now();
        let start_time = Utc::now();
        let builder = TestCaseBuilder::new(components.clone(), factories);
        (self.build)(&builder);

        for name in builder.get_pending_components() {
            if let Some(component) = components.get(&name) {
                if let Err(e) = component.start().await {
                    warn!(component = %name, error = %e, "pending component failed to start");
                }
            }
        }
        builder.clear_pending_components();

        let context = builder.context();
        let steps = builder.get_steps();
        let mut step_results = Vec::new();
        let mut failed = false;

        for phase in Phase::TEST_CASE_ORDER {
            if failed && phase != Phase::After {
                continue;
            }
            for step in steps.iter().filter(|s| s.phase == phase) {
                let result = executor.execute(step, &context, &components).await;
                let passed = result.is_passed();
                step_results.push(result);
                if !passed {
                    failed = true;
                    if fail_fast && phase != Phase::After {
                        break;
                    }
                }
            }
        }

        let mut errors: Vec<String> = step_results
            .iter()
            .filter_map(|r| match &r.outcome {
                crate::step::StepOutcome::Failed(message) => Some(message.clone()),
                crate::step::StepOutcome::TimedOut => {
                    Some(format!("step '{}' exceeded its timeout", r.name))
                }
                crate::step::StepOutcome::Passed => None,
            })
            .collect();

        let mut interactions = if recording { Some(Vec::new()) } else { None };

        for entry in components.iter() {
            for error in entry.value().take_unhandled_errors() {
                failed = true;
                errors.push(error.to_string());
            }
            let drained = entry.value().take_interactions();
            if let Some(sink) = interactions.as_mut() {
                sink.extend(drained);
            }
            entry.value().clear_test_case_hooks();
        }

        for (name, scope) in builder.get_dynamic_components() {
            if scope == ComponentScope::TestCase {
                if let Some((_, component)) = components.remove(&name) {
                    if let Err(e) = component.stop().await {
                        warn!(component = %name, error = %e, "dynamic component failed to stop cleanly");
                    }
                }
            }
        }

        if failed {
            info!(test_case = %self.name, "test case failed");
        }

        let passed_steps = step_results.iter().filter(|r| r.is_passed()).count();
        let total_steps = step_results.len();

        TestCaseResult {
            name: self.name.clone(),
            passed: !failed,
            step_results,
            duration: started.elapsed(),
            start_time,
            end_time: Utc::now(),
            passed_steps,
            failed_steps: total_steps - passed_steps,
            total_steps,
            metadata: self.metadata.clone(),
            interactions,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use crate::step::{Step, StepAction};

    #[tokio::test]
    async fn a_test_case_with_only_passing_steps_passes() {
        let components: Arc<DashMap<String, Arc<dyn Component>>> = Arc::new(DashMap::new());
        let test_case = TestCase::new("trivial", TestCaseMetadata::new(), |builder| {
            builder.set_phase(Phase::Test);
            builder.register_step(Step::new(
                "noop",
                Phase::Test,
                StepAction::Sleep(std::time::Duration::from_millis(1)),
            ));
        });
        let factories = Arc::new(DashMap::new());
        let executor = StepExecutor::new();
        let result = test_case
            .execute(components, factories, &executor, true, true)
            .await;
        assert!(result.passed);
        assert_eq!(result.step_results.len(), 1);
        assert_eq!(result.passed_steps, 1);
        assert_eq!(result.total_steps, 1);
        assert!(result.interactions.is_some());
    }

    #[tokio::test]
    async fn fail_fast_skips_remaining_test_steps_but_still_runs_after() {
        let components: Arc<DashMap<String, Arc<dyn Component>>> = Arc::new(DashMap::new());
        let test_case = TestCase::new("failing", TestCaseMetadata::new(), |builder| {
            builder.set_phase(Phase::Test);
            builder.register_step(Step::new(
                "boom",
                Phase::Test,
                StepAction::Custom(Arc::new(|_ctx| {
                    Box::pin(async { Err(crate::component::ComponentError::misuse("boom")) })
                })),
            ));
            builder.register_step(Step::new(
                "never-reached",
                Phase::Test,
                StepAction::Custom(Arc::new(|_ctx| {
                    Box::pin(async { panic!("should be skipped") })
                })),
            ));
            builder.set_phase(Phase::After);
            builder.register_step(Step::new(
                "cleanup",
                Phase::After,
                StepAction::Sleep(std::time::Duration::from_millis(1)),
            ));
        });
        let factories = Arc::new(DashMap::new());
        let executor = StepExecutor::new();
        let result = test_case
            .execute(components, factories, &executor, true, true)
            .await;
        assert!(!result.passed);
        assert_eq!(result.step_results.len(), 2);
        assert!(result.step_results[1].is_passed());
        assert_eq!(result.failed_steps, 1);
    }
}
