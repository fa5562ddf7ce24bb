//! `DataSource` (§4.3, §4.4, §8 "DataSource setup + cache hit"): wraps a
//! native handle (a DB pool, a KV client) rather than a `Transport` trait —
//! assertions run directly against the handle instead of going through the
//! hook-dispatch machinery the wire-facing components use.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::hook::HookRegistry;
use crate::step::{CustomAction, Step, StepAction, TestContext};
use crate::testcase::TestCaseBuilderHandle;

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};

pub struct DataSource<H: Send + Sync + 'static> {
    core: Arc<ComponentCore>,
    handle: Arc<H>,
}

impl<H: Send + Sync + 'static> DataSource<H> {
    pub fn new(name: impl Into<String>, handle: Arc<H>) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            handle,
        })
    }

    pub fn handle(&self) -> &Arc<H> {
        &self.handle
    }
}

#[async_trait]
impl<H: Send + Sync + 'static> Component for DataSource<H> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn start_tier(&self) -> StartTier {
        StartTier::Listener
    }

    fn state(&self) -> ComponentState {
        self.core.state()
    }

    /// The handle is assumed already connected when the component is
    /// constructed; `start`/`stop` only flip lifecycle state.
    async fn start(&self) -> Result<(), ComponentError> {
        self.core.start_once(|| async move { Ok(()) }).await
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        self.core.stop_once(|| async move { Ok(()) }).await
    }

    fn hook_registry(&self) -> &HookRegistry {
        self.core.registry()
    }

    fn take_unhandled_errors(&self) -> Vec<ComponentError> {
        self.core.take_unhandled_errors()
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
        self
    }
}

impl<H: Send + Sync + 'static> HasStepBuilder for DataSource<H> {
    type StepBuilder = DataSourceStepBuilder<H>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        DataSourceStepBuilder {
            data_source: self.clone(),
            test_case,
        }
    }
}

pub struct DataSourceStepBuilder<H: Send + Sync + 'static> {
    data_source: Arc<DataSource<H>>,
    test_case: TestCaseBuilderHandle,
}

impl<H: Send + Sync + 'static> DataSourceStepBuilder<H> {
    /// `exec(name, fn)`: begins a chain that must end in `.run()` (fire for
    /// effect) or `.assert(predicate)` (fire, then check the result).
    pub fn exec<F>(&self, name: impl Into<String>, f: F) -> DataSourceExecBuilder<H>
    where
        F: Fn(&H) -> Result<Value, ComponentError> + Send + Sync + 'static,
    {
        DataSourceExecBuilder {
            data_source: self.data_source.clone(),
            test_case: self.test_case.clone(),
            name: name.into(),
            exec: Arc::new(f),
        }
    }
}

pub struct DataSourceExecBuilder<H: Send + Sync + 'static> {
    data_source: Arc<DataSource<H>>,
    test_case: TestCaseBuilderHandle,
    name: String,
    exec: Arc<dyn Fn(&H) -> Result<Value, ComponentError> + Send + Sync>,
}

impl<H: Send + Sync + 'static> DataSourceExecBuilder<H> {
    /// Runs `fn` against the handle for its side effect; the value it
    /// returns is discarded.
    pub fn run(self) {
        let phase = self.test_case.current_phase();
        let data_source = self.data_source.clone();
        let exec = self.exec.clone();
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let data_source = data_source.clone();
            let exec = exec.clone();
            Box::pin(async move {
                data_source.core.ensure_started()?;
                exec(data_source.handle.as_ref()).map(|_| ())
            })
        });
        self.test_case
            .register_step(Step::new(self.name, phase, StepAction::Custom(action)));
    }

    /// Runs `fn` against the handle, then `predicate` against its result,
    /// failing the step if `predicate` returns `Ok(false)`.
    pub fn assert<P>(self, predicate: P)
    where
        P: Fn(&Value) -> Result<bool, ComponentError> + Send + Sync + 'static,
    {
        let phase = self.test_case.current_phase();
        let data_source = self.data_source.clone();
        let exec = self.exec.clone();
        let predicate = Arc::new(predicate);
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let data_source = data_source.clone();
            let exec = exec.clone();
            let predicate = predicate.clone();
            Box::pin(async move {
                data_source.core.ensure_started()?;
                let value = exec(data_source.handle.as_ref())?;
                if !predicate(&value)? {
                    return Err(ComponentError::AssertionFailed(format!(
                        "data source assertion failed for {value}"
                    )));
                }
                Ok(())
            })
        });
        self.test_case
            .register_step(Step::new(self.name, phase, StepAction::Custom(action)));
    }
}
