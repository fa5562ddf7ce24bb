//! Test-case construction and execution (§4.4, §4.7).

mod builder;
mod metadata;
mod result;
#[allow(clippy::module_inception)]
mod testcase;

pub use builder::{TestCaseBuilder, TestCaseBuilderHandle};
pub use metadata::TestCaseMetadata;
pub use result::TestCaseResult;
pub use testcase::TestCase;
