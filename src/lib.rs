//! Testurio: a scenario-driven integration test engine.
//!
//! A scenario wires together [`component`]s (sync/async clients and
//! servers, proxies, publishers/subscribers, data sources), each of which
//! exposes a step builder for recording [`step::Step`]s against
//! [`testcase::TestCase`]s. A [`scenario::TestScenario`] starts components
//! tier by tier, runs groups of test cases, and reports the outcome
//! through a [`reporter::Reporter`].

pub mod component;
pub mod error;
pub mod hook;
pub mod message;
pub mod phase;
pub mod prelude;
pub mod reporter;
pub mod scenario;
pub mod step;
pub mod testcase;
pub mod transport;
pub mod util;

pub use error::{Result, TesturioError};
