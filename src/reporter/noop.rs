//! The default reporter: discards everything. Used when a scenario is
//! constructed without an explicit reporter.

use async_trait::async_trait;

use super::traits::Reporter;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

#[async_trait]
impl Reporter for NoopReporter {}
