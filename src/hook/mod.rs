//! Expectations over inbound messages: a matcher plus an ordered handler
//! chain, scanned in registration order (§4.2).

mod chain;
mod registry;
mod types;

pub use chain::{mock_event_type, run_chain, ChainError, ChainOutcome};
pub use registry::HookRegistry;
pub use types::{Handler, HandlerError, HandlerOutput, Hook, Matcher, PayloadMatcher};
