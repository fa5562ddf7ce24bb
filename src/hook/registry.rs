//! Per-component hook registry (§4.2).

use parking_lot::RwLock;

use crate::message::Message;

use super::types::Hook;

/// `register(hook)`, `clearNonPersistent()`, `clear()`,
/// `findFirstMatch(message)->hook|none` (§4.2).
///
/// Hooks are scanned in registration order; the engine always picks the
/// *first* hook whose matcher and payload matcher both accept a given
/// inbound message — this is the "First-match" testable property in §8.
/// Registration order, not specificity scoring, is load-bearing here (see
/// §9 Design Notes): do not re-introduce a scored lookup.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to the end of the registration order.
    pub fn register(&self, hook: Hook) {
        self.hooks.write().push(hook);
    }

    /// Drops every non-persistent hook, preserving registration order among
    /// the persistent hooks that remain.
    pub fn clear_non_persistent(&self) {
        self.hooks.write().retain(|hook| hook.persistent);
    }

    /// Drops every hook, persistent or not (used on component teardown).
    pub fn clear(&self) {
        self.hooks.write().clear();
    }

    /// The first registered hook accepting `message`, if any.
    pub fn find_first_match(&self, message: &Message) -> Option<Hook> {
        self.hooks
            .read()
            .iter()
            .find(|hook| hook.accepts(message))
            .cloned()
    }

    /// Removes a hook by id, used by one-shot `waitEvent`/`waitMessage`
    /// hooks once they have fired so a second inbound match doesn't
    /// re-trigger an already-completed step.
    pub fn remove(&self, hook_id: crate::util::HookId) {
        self.hooks.write().retain(|hook| hook.id != hook_id);
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Snapshot of currently registered hooks, in registration order.
    pub fn snapshot(&self) -> Vec<Hook> {
        self.hooks.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::hook::{Hook, Matcher};
    use crate::phase::Phase;

    use super::*;

    fn msg(message_type: &str) -> Message {
        Message::new(message_type, json!({}))
    }

    #[test]
    fn first_match_wins_even_when_a_later_hook_also_matches() {
        let registry = HookRegistry::new();
        let first = Hook::new("svc", Phase::Test, Matcher::literal("ping"));
        let first_id = first.id;
        registry.register(first);
        registry.register(Hook::new("svc", Phase::Test, Matcher::literal("ping")));

        let found = registry.find_first_match(&msg("ping")).unwrap();
        assert_eq!(found.id, first_id);
    }

    #[test]
    fn non_matching_hooks_never_fire() {
        let registry = HookRegistry::new();
        registry.register(Hook::new("svc", Phase::Test, Matcher::literal("pong")));
        assert!(registry.find_first_match(&msg("ping")).is_none());
    }

    #[test]
    fn clear_non_persistent_keeps_persistent_hooks() {
        let registry = HookRegistry::new();
        registry.register(Hook::new("svc", Phase::Test, Matcher::literal("ping")).persistent());
        registry.register(Hook::new("svc", Phase::Test, Matcher::literal("pong")));
        assert_eq!(registry.len(), 2);

        registry.clear_non_persistent();
        assert_eq!(registry.len(), 1);
        assert!(registry.find_first_match(&msg("ping")).is_some());
        assert!(registry.find_first_match(&msg("pong")).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let registry = HookRegistry::new();
        registry.register(Hook::new("svc", Phase::Test, Matcher::literal("ping")).persistent());
        registry.clear();
        assert!(registry.is_empty());
    }
}
