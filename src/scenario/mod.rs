//! Scenario orchestration (§4.5, §4.7, §4.8): the top-level object a test
//! author constructs, registers components onto, and drives through
//! `start`/`runInit`/`run`/`runStop`/`stop`.

mod config;
mod result;
#[allow(clippy::module_inception)]
mod scenario;

pub use config::TestScenarioConfig;
pub use result::{Summary, TestResult};
pub use scenario::TestScenario;
