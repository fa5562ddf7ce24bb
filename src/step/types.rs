//! Steps as instruction records (§3 SUPPLEMENT), not bare closures: the
//! executor interprets a small, fixed set of actions, with `Custom` as the
//! escape hatch every protocol-specific step builder compiles down to.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;

use crate::component::ComponentError;
use crate::hook::Hook;
use crate::phase::Phase;
use crate::util::StepId;

/// Scratch data shared by every step within one test case run (§4.6): the
/// vehicle a `waitForEvent` step uses to hand a later `assert` step the
/// value it captured, for instance.
pub type TestContext = Arc<RwLock<HashMap<String, Value>>>;

pub fn new_test_context() -> TestContext {
    Arc::new(RwLock::new(HashMap::new()))
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A protocol-specific step compiled down to a closure over the concrete
/// component `Arc` and transport it was built against (§9 Design Notes:
/// "closures as step actions" confined to the one place the instruction
/// record can't stay generic).
pub type CustomAction = Arc<dyn Fn(TestContext) -> BoxFuture<Result<(), ComponentError>> + Send + Sync>;

/// Polled by `waitUntil` at a fixed interval until it returns `true` or the
/// step times out.
pub type WaitPredicate = Arc<dyn Fn(&TestContext) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum StepAction {
    /// `TestCaseBuilder::wait(ms)`.
    Sleep(Duration),
    /// `TestCaseBuilder::waitUntil(predicate)`.
    WaitUntil(WaitPredicate),
    /// A hook registered directly against a named component outside of a
    /// component-specific step builder (rare; most hooks are registered via
    /// `onRequest`/`onMessage`/`waitEvent` at build time, §4.6).
    RegisterHook { component: String, hook: Hook },
    Custom(CustomAction),
}

impl std::fmt::Debug for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepAction::Sleep(d) => f.debug_tuple("Sleep").field(d).finish(),
            StepAction::WaitUntil(_) => f.write_str("WaitUntil(..)"),
            StepAction::RegisterHook { component, .. } => f
                .debug_struct("RegisterHook")
                .field("component", component)
                .finish(),
            StepAction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub id: StepId,
    pub name: String,
    pub phase: Phase,
    pub action: StepAction,
    /// Overrides the executor's default per-step timeout (§4.6).
    pub timeout: Option<Duration>,
}

impl Step {
    pub fn new(name: impl Into<String>, phase: Phase, action: StepAction) -> Self {
        Self {
            id: StepId::new(),
            name: name.into(),
            phase,
            action,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Passed,
    Failed(String),
    TimedOut,
}

impl StepOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_id: StepId,
    pub name: String,
    pub phase: Phase,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

impl StepResult {
    pub fn is_passed(&self) -> bool {
        self.outcome.is_passed()
    }
}
