//! `Reporter` (§4.9): an observer over a scenario run. Every method has an
//! empty default so an implementor only overrides what it cares about,
//! mirroring the `Step`/`Hook` "opt into what you need" shape elsewhere in
//! the engine.

use async_trait::async_trait;

use crate::step::StepResult;
use crate::testcase::TestCaseResult;

#[async_trait]
pub trait Reporter: Send + Sync {
    async fn on_start(&self) {}

    async fn on_test_case_start(&self, _name: &str) {}

    async fn on_step_complete(&self, _test_case: &str, _result: &StepResult) {}

    async fn on_test_case_complete(&self, _result: &TestCaseResult) {}

    async fn on_complete(&self, _summary: crate::scenario::Summary) {}
}
