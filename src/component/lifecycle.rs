//! Component lifecycle state machine (§3 DATA MODEL: `created -> started ->
//! stopped`, monotonic per scenario run).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Created,
    Started,
    Stopped,
}

impl ComponentState {
    /// `start()` is a no-op after the first successful call; only a
    /// `Created` component actually transitions.
    pub fn should_start(self) -> bool {
        matches!(self, ComponentState::Created)
    }

    /// `stop()` is idempotent; only a `Started` component actually
    /// transitions.
    pub fn should_stop(self) -> bool {
        matches!(self, ComponentState::Started)
    }
}

/// Lifetime qualifier for a dynamic component created via `use()` (§4.5,
/// §6): `Scenario`-scoped components live until `runStop`; `TestCase`-scoped
/// components are started before the first step and stopped/removed after
/// the owning test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentScope {
    Scenario,
    TestCase,
}

impl Default for ComponentScope {
    fn default() -> Self {
        Self::TestCase
    }
}

/// The tier a component starts/stops in (§4.8): servers and proxies start
/// first and stop last so clients never connect to an unbound port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StartTier {
    /// Mock servers, publishers, subscribers, data sources: things other
    /// components connect *to*.
    Listener = 0,
    /// Proxies sit between listeners and clients.
    Proxy = 1,
    /// Sync/async clients: connect last, stop first.
    Client = 2,
}
