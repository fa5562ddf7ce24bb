//! Small shared value types and identifiers used across the engine.
//!
//! Mirrors `airssys_rt::util`'s role: nothing here depends on `component`,
//! `hook`, `step`, `testcase` or `scenario` — only the reverse.

mod address;
mod ids;

pub use address::Address;
pub use ids::{ComponentName, HookId, StepId, TraceId};
