//! [`Phase`]: the lifecycle bucket every [`crate::step::Step`] and
//! [`crate::hook::Hook`] carries (§3 DATA MODEL).

use serde::{Deserialize, Serialize};

/// One of `init, before, test, after, stop`. Steps execute strictly in this
/// order within a test case; within a phase, in declaration order (§4.6,
/// §8 "Phase order").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Init,
    Before,
    Test,
    After,
    Stop,
}

impl Phase {
    /// The four phases a `TestCase::execute` partitions and runs in order;
    /// `Stop` is reserved for the scenario-level stop builder (§4.8) and is
    /// not run as part of an individual test case.
    pub const TEST_CASE_ORDER: [Phase; 4] = [Phase::Init, Phase::Before, Phase::Test, Phase::After];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Init => "init",
            Phase::Before => "before",
            Phase::Test => "test",
            Phase::After => "after",
            Phase::Stop => "stop",
        };
        write!(f, "{s}")
    }
}
