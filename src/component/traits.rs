//! The `Component` contract shared by every variant (§4.3).

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::hook::{Hook, HookRegistry};
use crate::message::Interaction;

use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};

/// Contract exposed to step builders and to `TestScenario`.
///
/// Object-safe so a scenario can hold a single heterogeneous
/// `DashMap<String, Arc<dyn Component>>` across `SyncClient`, `SyncServer`,
/// `AsyncClient`, `AsyncServer`, `Proxy`, `Publisher`, `Subscriber` and
/// `DataSource`. A component MUST NOT call back into user step-builder code;
/// all user-facing mutation happens on the builder's main thread of
/// control (§4.3).
#[async_trait]
pub trait Component: Send + Sync {
    /// Unique within the scenario.
    fn name(&self) -> &str;

    /// The tier this component starts/stops in (§4.8): listeners before
    /// proxies before clients, and the reverse on shutdown.
    fn start_tier(&self) -> StartTier;

    fn state(&self) -> ComponentState;

    /// Idempotent; a no-op after the first successful call.
    async fn start(&self) -> Result<(), ComponentError>;

    /// Idempotent.
    async fn stop(&self) -> Result<(), ComponentError>;

    fn hook_registry(&self) -> &HookRegistry;

    /// Drained by the scenario between steps to convert background
    /// failures into test-case failures.
    fn take_unhandled_errors(&self) -> Vec<ComponentError>;

    /// Drained once per test case and aggregated into `TestCaseResult::
    /// interactions` when recording is on (§6). Components that don't
    /// exchange wire-level messages (data sources, pub/sub) keep the
    /// empty default.
    fn take_interactions(&self) -> Vec<Interaction> {
        Vec::new()
    }

    fn register_hook(&self, hook: Hook) {
        self.hook_registry().register(hook);
    }

    fn clear_test_case_hooks(&self) {
        self.hook_registry().clear_non_persistent();
    }

    fn clear_all_hooks(&self) {
        self.hook_registry().clear();
    }

    /// Lets `TestScenario`/`TestCaseBuilder` recover the concrete type
    /// behind an `Arc<dyn Component>` (see [`downcast_component`]). Every
    /// variant implements this as a one-line `self` coercion; it cannot be
    /// a default method because a default can't name `Self: Sized` and
    /// still be callable through the trait object.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Builds a fresh component instance on demand. Stored type-erased
/// alongside a [`super::lifecycle::ComponentScope`] in a scenario's factory
/// table so `TestCaseBuilder::use_component` can construct a name nothing
/// pre-registered (§4.5 `use()` with a constructor).
pub type ComponentFactory = Arc<dyn Fn() -> Arc<dyn Component> + Send + Sync>;

/// Recovers the concrete component type `C` a scenario stored behind
/// `Arc<dyn Component>`, the way `TestCaseBuilder::use()` hands a caller a
/// protocol-specific step builder for a name it only knows dynamically.
pub fn downcast_component<C: Component + 'static>(
    component: &Arc<dyn Component>,
) -> Option<Arc<C>> {
    component.clone().into_any_arc().downcast::<C>().ok()
}

/// Implemented by every concrete component variant to hand the
/// `TestCaseBuilder` its protocol-flavoured `StepBuilder` (§4.4). Kept
/// separate from `Component` (rather than an associated type on it) so
/// `Component` itself stays object-safe.
pub trait HasStepBuilder: Component + Sized {
    type StepBuilder;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: crate::testcase::TestCaseBuilderHandle,
    ) -> Self::StepBuilder;
}
