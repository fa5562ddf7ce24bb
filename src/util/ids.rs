//! Identifier newtypes shared across the engine.
//!
//! Every identifier is a thin wrapper over `uuid::Uuid` (or a plain string
//! for human-assigned names), following the same pattern as
//! `airssys_rt::util::ids::ActorAddress` / `ActorId`: cheap to clone, stable
//! across the lifetime of the thing they name, and safe to serialize into
//! reporter output.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique id for a registered [`crate::hook::Hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookId(Uuid);

impl HookId {
    /// Generate a fresh, random hook id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique id for a [`crate::step::Step`] within one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation key threading a sync request with its response through hooks
/// and proxies (the spec's "Traceid").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A component's name within a scenario. Names are author-assigned and must
/// be unique per `TestScenario` (§4.8); plain `String` is used rather than a
/// generated id because components are addressed by name throughout the
/// public API (`use(component)`, reporter events, error messages).
pub type ComponentName = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(HookId::new(), HookId::new());
        assert_ne!(StepId::new(), StepId::new());
        assert_ne!(TraceId::new(), TraceId::new());
    }

    #[test]
    fn display_is_non_empty() {
        assert!(!HookId::new().to_string().is_empty());
    }
}
