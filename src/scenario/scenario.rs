//! `TestScenario` (§4.5, §4.7, §4.8): owns every component for a run, starts
//! and stops them in tier order, and drives groups of `TestCase`s through
//! the engine.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use tracing::{instrument, warn};

use crate::component::{Component, ComponentError, ComponentFactory, ComponentScope, StartTier};
use crate::reporter::{NoopReporter, Reporter};
use crate::step::{StepExecutor, StepResult};
use crate::testcase::{TestCase, TestCaseMetadata, TestCaseResult};

use super::config::TestScenarioConfig;
use super::result::{Summary, TestResult};

const START_TIERS: [StartTier; 3] = [StartTier::Listener, StartTier::Proxy, StartTier::Client];

type FactoryTable = Arc<DashMap<String, (ComponentScope, ComponentFactory)>>;

pub struct TestScenario {
    components: Arc<DashMap<String, Arc<dyn Component>>>,
    factories: FactoryTable,
    executor: StepExecutor,
    config: TestScenarioConfig,
    reporters: Vec<Arc<dyn Reporter>>,
}

impl TestScenario {
    pub fn new(config: TestScenarioConfig) -> Self {
        Self::with_reporter(config, Arc::new(NoopReporter))
    }

    pub fn with_reporter(config: TestScenarioConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self::with_reporters(config, vec![reporter])
    }

    /// Like `with_reporter`, but wires up several reporters at once. Every
    /// reporter observes the same run independently; a reporter that panics
    /// in one of its callbacks doesn't stop the others from observing the
    /// rest of the run (§8 "Reporter neutrality").
    pub fn with_reporters(config: TestScenarioConfig, reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self {
            components: Arc::new(DashMap::new()),
            factories: Arc::new(DashMap::new()),
            executor: StepExecutor::new(),
            config,
            reporters,
        }
    }

    /// Adds a component to the scenario's registry, keyed by its name.
    /// Typically called once per component right after it's constructed
    /// with `SyncClient::new`/`AsyncServer::new`/etc.
    pub fn register(&self, component: Arc<dyn Component>) {
        self.components
            .insert(component.name().to_string(), component);
    }

    /// Registers a constructor for a component that doesn't exist yet when
    /// a test case calls `use_component(name)` (§4.5). `scope` decides
    /// whether the instance `TestCaseBuilder` builds from `factory` lives
    /// only for the owning test case or persists for the rest of the
    /// scenario like a `register`ed component.
    pub fn register_factory(
        &self,
        name: impl Into<String>,
        scope: ComponentScope,
        factory: ComponentFactory,
    ) {
        self.factories.insert(name.into(), (scope, factory));
    }

    pub fn components(&self) -> Arc<DashMap<String, Arc<dyn Component>>> {
        self.components.clone()
    }

    /// Starts every registered component, tier by tier (listeners, then
    /// proxies, then clients), all components within a tier concurrently
    /// (§4.8).
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), ComponentError> {
        self.notify_start().await;
        for tier in START_TIERS {
            self.start_tier(tier).await?;
        }
        Ok(())
    }

    /// Stops every component in the reverse order, so a client never
    /// outlives the listener it's connected to.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        for tier in START_TIERS.iter().rev() {
            self.stop_tier(*tier).await;
        }
    }

    async fn start_tier(&self, tier: StartTier) -> Result<(), ComponentError> {
        let targets = self.components_in_tier(tier);
        let results = futures::future::join_all(targets.iter().map(|c| c.start())).await;
        results.into_iter().collect::<Result<Vec<()>, _>>()?;
        Ok(())
    }

    async fn stop_tier(&self, tier: StartTier) {
        let targets = self.components_in_tier(tier);
        let results = futures::future::join_all(targets.iter().map(|c| c.stop())).await;
        for (component, result) in targets.iter().zip(results) {
            if let Err(e) = result {
                warn!(component = %component.name(), error = %e, "component failed to stop cleanly");
            }
        }
    }

    fn components_in_tier(&self, tier: StartTier) -> Vec<Arc<dyn Component>> {
        self.components
            .iter()
            .filter(|entry| entry.value().start_tier() == tier)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Runs a one-off `TestCase` (conventionally one whose `buildFn` only
    /// registers `Init`-phase steps) before any test-case group (§4.5).
    pub async fn run_init(&self, init: &TestCase) -> TestCaseResult {
        init.execute(
            self.components.clone(),
            self.factories.clone(),
            &self.executor,
            self.config.fail_fast,
            self.config.recording,
        )
        .await
    }

    /// Runs a one-off `TestCase` (conventionally `Stop`-phase steps) after
    /// every group has finished, before `stop()` tears components down
    /// (§4.8).
    pub async fn run_stop(&self, stop: &TestCase) -> TestCaseResult {
        stop.execute(
            self.components.clone(),
            self.factories.clone(),
            &self.executor,
            self.config.fail_fast,
            self.config.recording,
        )
        .await
    }

    /// Runs every group concurrently; within one group, test cases run in
    /// declaration order since later cases in a group may depend on earlier
    /// ones' side effects (§4.7 "parallel groups").
    #[instrument(skip(self, groups))]
    pub async fn run(&self, groups: Vec<Vec<TestCase>>) -> TestResult {
        let start_time = Utc::now();
        let started = std::time::Instant::now();

        let run_groups = async {
            let group_futures = groups.into_iter().map(|group| self.run_group(group));
            futures::future::join_all(group_futures).await
        };

        let test_cases: Vec<TestCaseResult> = match tokio::time::timeout(self.config.timeout, run_groups).await {
            Ok(results) => results.into_iter().flatten().collect(),
            Err(_) => {
                warn!(timeout_s = self.config.timeout.as_secs(), "scenario run exceeded its timeout");
                let now = Utc::now();
                vec![TestCaseResult {
                    name: "<scenario timeout>".to_string(),
                    passed: false,
                    step_results: Vec::new(),
                    duration: self.config.timeout,
                    start_time: now,
                    end_time: now,
                    passed_steps: 0,
                    failed_steps: 0,
                    total_steps: 0,
                    metadata: TestCaseMetadata::new(),
                    interactions: None,
                    errors: vec!["scenario run exceeded its configured timeout".to_string()],
                }]
            }
        };

        let end_time = Utc::now();
        let total_tests = test_cases.len();
        let passed_tests = test_cases.iter().filter(|r| r.passed).count();
        let failed_tests = total_tests - passed_tests;

        let interactions = if self.config.recording {
            Some(
                test_cases
                    .iter()
                    .filter_map(|r| r.interactions.clone())
                    .flatten()
                    .collect(),
            )
        } else {
            None
        };

        let result = TestResult {
            passed: failed_tests == 0,
            duration: started.elapsed(),
            start_time,
            end_time,
            passed_tests,
            failed_tests,
            total_tests,
            interactions,
            test_cases,
        };

        self.notify_complete(result.summary()).await;
        result
    }

    async fn run_group(&self, group: Vec<TestCase>) -> Vec<TestCaseResult> {
        let mut results = Vec::with_capacity(group.len());
        for test_case in group {
            self.notify_test_case_start(&test_case.name).await;
            let result = test_case
                .execute(
                    self.components.clone(),
                    self.factories.clone(),
                    &self.executor,
                    self.config.fail_fast,
                    self.config.recording,
                )
                .await;
            for step_result in &result.step_results {
                self.notify_step_complete(&result.name, step_result).await;
            }
            self.notify_test_case_complete(&result).await;
            results.push(result);
        }
        results
    }

    /// Calls every reporter's `on_start`, isolating a panic in one reporter
    /// from the rest (§8 "Reporter neutrality").
    async fn notify_start(&self) {
        for reporter in &self.reporters {
            let reporter = reporter.clone();
            let call = async move { reporter.on_start().await };
            if std::panic::AssertUnwindSafe(call).catch_unwind().await.is_err() {
                warn!("reporter panicked in on_start; continuing with the remaining reporters");
            }
        }
    }

    async fn notify_test_case_start(&self, name: &str) {
        for reporter in &self.reporters {
            let reporter = reporter.clone();
            let name = name.to_string();
            let call = async move { reporter.on_test_case_start(&name).await };
            if std::panic::AssertUnwindSafe(call).catch_unwind().await.is_err() {
                warn!("reporter panicked in on_test_case_start; continuing with the remaining reporters");
            }
        }
    }

    async fn notify_step_complete(&self, test_case: &str, result: &StepResult) {
        for reporter in &self.reporters {
            let reporter = reporter.clone();
            let test_case = test_case.to_string();
            let result = result.clone();
            let call = async move { reporter.on_step_complete(&test_case, &result).await };
            if std::panic::AssertUnwindSafe(call).catch_unwind().await.is_err() {
                warn!("reporter panicked in on_step_complete; continuing with the remaining reporters");
            }
        }
    }

    async fn notify_test_case_complete(&self, result: &TestCaseResult) {
        for reporter in &self.reporters {
            let reporter = reporter.clone();
            let result = result.clone();
            let call = async move { reporter.on_test_case_complete(&result).await };
            if std::panic::AssertUnwindSafe(call).catch_unwind().await.is_err() {
                warn!("reporter panicked in on_test_case_complete; continuing with the remaining reporters");
            }
        }
    }

    async fn notify_complete(&self, summary: Summary) {
        for reporter in &self.reporters {
            let reporter = reporter.clone();
            let call = async move { reporter.on_complete(summary).await };
            if std::panic::AssertUnwindSafe(call).catch_unwind().await.is_err() {
                warn!("reporter panicked in on_complete; continuing with the remaining reporters");
            }
        }
    }
}
