//! `TestCaseBuilder` (§4.4, §4.6): the object a test case's `buildFn`
//! receives. Collects steps across the four build-time phases and hands
//! each `use()`d component a protocol-specific step builder.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::component::{
    downcast_component, Component, ComponentError, ComponentFactory, ComponentScope,
    HasStepBuilder,
};
use crate::phase::Phase;
use crate::step::{new_test_context, Step, StepAction, TestContext, WaitPredicate};

type FactoryTable = Arc<DashMap<String, (ComponentScope, ComponentFactory)>>;

struct Inner {
    components: Arc<DashMap<String, Arc<dyn Component>>>,
    factories: FactoryTable,
    context: TestContext,
    steps: Mutex<Vec<Step>>,
    phase: Mutex<Phase>,
    pending_components: Mutex<Vec<String>>,
    /// Names (with their scope) of components `use_component` constructed
    /// on the fly via a factory rather than finding already registered, so
    /// `TestCase::execute` knows which ones to tear down again afterwards
    /// (§4.5, §6).
    dynamic_components: Mutex<Vec<(String, ComponentScope)>>,
}

/// Cheap to clone: every clone shares the same step list, phase cursor and
/// context. Component step builders hold one of these so `request(...)`,
/// `onMessage(...)` and friends can call back into it (§4.4).
#[derive(Clone)]
pub struct TestCaseBuilder {
    inner: Arc<Inner>,
}

/// The handle type `HasStepBuilder::create_step_builder` receives. It *is*
/// `TestCaseBuilder` — kept as a distinct name in the component-facing API
/// so a reader of `component::traits` isn't sent hunting through
/// `testcase` for an unfamiliar type.
pub type TestCaseBuilderHandle = TestCaseBuilder;

impl TestCaseBuilder {
    pub fn new(components: Arc<DashMap<String, Arc<dyn Component>>>, factories: FactoryTable) -> Self {
        Self {
            inner: Arc::new(Inner {
                components,
                factories,
                context: new_test_context(),
                steps: Mutex::new(Vec::new()),
                phase: Mutex::new(Phase::Init),
                pending_components: Mutex::new(Vec::new()),
                dynamic_components: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Looks up a component by name and hands back its protocol-specific
    /// step builder (§4.4 `use(component)`). A name already registered on
    /// the scenario is returned as-is; a name that isn't, but has a factory
    /// registered via `TestScenario::register_factory`, is constructed on
    /// the spot, inserted into the shared registry, and recorded so
    /// `TestCase::execute` can tear it down again when its `ComponentScope`
    /// is `TestCase` (§4.5). Flags the component pending if it hasn't
    /// started yet, so `TestCase::execute` starts it before running the
    /// first step that touches it.
    pub fn use_component<C>(&self, name: &str) -> Result<C::StepBuilder, ComponentError>
    where
        C: HasStepBuilder + 'static,
    {
        let existing = self
            .inner
            .components
            .get(name)
            .map(|entry| entry.value().clone());

        let component = match existing {
            Some(component) => component,
            None => {
                let (scope, factory) = self
                    .inner
                    .factories
                    .get(name)
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| ComponentError::misuse(format!("no component named '{name}'")))?;
                let component = factory();
                self.inner
                    .components
                    .insert(name.to_string(), component.clone());
                self.inner
                    .dynamic_components
                    .lock()
                    .push((name.to_string(), scope));
                component
            }
        };

        let typed: Arc<C> = downcast_component::<C>(&component).ok_or_else(|| {
            ComponentError::misuse(format!("component '{name}' is not the requested type"))
        })?;

        if typed.state() != crate::component::ComponentState::Started {
            self.inner.pending_components.lock().push(name.to_string());
        }

        Ok(typed.create_step_builder(self.clone()))
    }

    pub fn register_step(&self, step: Step) {
        self.inner.steps.lock().push(step);
    }

    pub fn set_phase(&self, phase: Phase) {
        *self.inner.phase.lock() = phase;
    }

    pub fn current_phase(&self) -> Phase {
        *self.inner.phase.lock()
    }

    pub fn get_steps(&self) -> Vec<Step> {
        self.inner.steps.lock().clone()
    }

    pub fn get_pending_components(&self) -> Vec<String> {
        self.inner.pending_components.lock().clone()
    }

    pub fn clear_pending_components(&self) {
        self.inner.pending_components.lock().clear();
    }

    /// Every component `use_component` constructed via a factory during
    /// this build, with the scope it was registered under.
    pub fn get_dynamic_components(&self) -> Vec<(String, ComponentScope)> {
        self.inner.dynamic_components.lock().clone()
    }

    pub fn context(&self) -> TestContext {
        self.inner.context.clone()
    }

    /// `wait(ms)`: a plain phase-agnostic pause, independent of any
    /// component (§4.6).
    pub fn wait(&self, millis: u64) {
        let phase = self.current_phase();
        self.register_step(Step::new(
            format!("wait({millis}ms)"),
            phase,
            StepAction::Sleep(std::time::Duration::from_millis(millis)),
        ));
    }

    /// `waitUntil(predicate)`: polls `predicate` against the shared
    /// context until it returns `true` or the step times out (§4.6).
    pub fn wait_until(&self, name: impl Into<String>, predicate: WaitPredicate) {
        let phase = self.current_phase();
        self.register_step(Step::new(name, phase, StepAction::WaitUntil(predicate)));
    }
}
