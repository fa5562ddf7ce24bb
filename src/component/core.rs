//! Shared bookkeeping every component variant embeds: name, lifecycle
//! state, hook registry, and the unhandled-error mailbox (§3 Ownership,
//! §4.3).

use parking_lot::{Mutex, RwLock};

use crate::hook::HookRegistry;
use crate::message::Interaction;

use super::error::ComponentError;
use super::lifecycle::ComponentState;

/// Embedded (not inherited — Rust has no struct inheritance) by every
/// concrete component variant. Each variant wraps `Arc<ComponentCore>` and
/// a transport handle, and implements `Component` by delegating to this.
pub struct ComponentCore {
    name: String,
    state: RwLock<ComponentState>,
    registry: HookRegistry,
    unhandled_errors: Mutex<Vec<ComponentError>>,
    interactions: Mutex<Vec<Interaction>>,
}

impl ComponentCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(ComponentState::Created),
            registry: HookRegistry::new(),
            unhandled_errors: Mutex::new(Vec::new()),
            interactions: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ComponentState {
        *self.state.read()
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn push_unhandled_error(&self, error: ComponentError) {
        self.unhandled_errors.lock().push(error);
    }

    pub fn take_unhandled_errors(&self) -> Vec<ComponentError> {
        std::mem::take(&mut *self.unhandled_errors.lock())
    }

    pub fn push_interaction(&self, interaction: Interaction) {
        self.interactions.lock().push(interaction);
    }

    pub fn take_interactions(&self) -> Vec<Interaction> {
        std::mem::take(&mut *self.interactions.lock())
    }

    /// Transitions `Created -> Started` if not already started, running
    /// `connect` to actually bind/connect the transport. A no-op (returns
    /// `Ok(())` without calling `connect`) if already started or stopped.
    pub async fn start_once<F, Fut>(&self, connect: F) -> Result<(), ComponentError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), ComponentError>>,
    {
        if !self.state.read().should_start() {
            return Ok(());
        }
        connect().await?;
        *self.state.write() = ComponentState::Started;
        Ok(())
    }

    /// Transitions `Started -> Stopped` if currently started, running
    /// `disconnect`. A no-op otherwise. Per §6 resource policy, `stop`
    /// errors are swallowed (logged) so they never mask the primary
    /// failure; `disconnect`'s error is still surfaced to the caller so a
    /// scenario/component `stop()` wrapper can choose to log and continue.
    pub async fn stop_once<F, Fut>(&self, disconnect: F) -> Result<(), ComponentError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), ComponentError>>,
    {
        if !self.state.read().should_stop() {
            return Ok(());
        }
        let result = disconnect().await;
        *self.state.write() = ComponentState::Stopped;
        result
    }

    pub fn ensure_started(&self) -> Result<(), ComponentError> {
        if self.state() == ComponentState::Started {
            Ok(())
        } else {
            Err(ComponentError::misuse(format!(
                "component '{}' used before start()",
                self.name
            )))
        }
    }
}
