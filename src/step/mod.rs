//! Step instruction records and their interpreter (§4.6, §9 supplement).

mod executor;
mod types;

pub use executor::{StepExecutor, DEFAULT_STEP_TIMEOUT};
pub use types::{
    new_test_context, CustomAction, Step, StepAction, StepOutcome, StepResult, TestContext,
    WaitPredicate,
};
