//! Shared "await one captured inbound message" step, used by both
//! `AsyncClient::wait_event` and `AsyncServer::wait_message` (§4.4, §5).
//! The hook that fills the slot is registered by the caller at build time,
//! *before* this builder's step ever runs, so an event/message arriving in
//! between is never missed (§8 "early arrival").

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::hook::HandlerError;
use crate::message::Message;
use crate::phase::Phase;
use crate::step::{CustomAction, Step, StepAction, TestContext};
use crate::testcase::TestCaseBuilderHandle;

use super::error::ComponentError;

pub struct EventWaitBuilder {
    test_case: TestCaseBuilderHandle,
    phase: Phase,
    slot: Arc<Mutex<Option<Message>>>,
    notify: Arc<Notify>,
    timeout: Option<std::time::Duration>,
}

impl EventWaitBuilder {
    pub fn new(
        test_case: TestCaseBuilderHandle,
        phase: Phase,
        slot: Arc<Mutex<Option<Message>>>,
        notify: Arc<Notify>,
    ) -> Self {
        Self {
            test_case,
            phase,
            slot,
            notify,
            timeout: None,
        }
    }

    /// Overrides the executor's default per-step timeout for this wait
    /// (§4.4 `waitEvent(type, {timeout})`/`waitMessage(type, {timeout})`).
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Registers the wait as a step, running `predicate` against the
    /// captured message's payload once it arrives.
    pub fn assert<F>(self, predicate: F)
    where
        F: Fn(&Value) -> Result<bool, HandlerError> + Send + Sync + 'static,
    {
        self.register(Some(Arc::new(predicate)));
    }

    /// Waits without asserting anything about the captured payload.
    pub fn register_plain(self) {
        self.register(None);
    }

    fn register(
        self,
        predicate: Option<Arc<dyn Fn(&Value) -> Result<bool, HandlerError> + Send + Sync>>,
    ) {
        let slot = self.slot;
        let notify = self.notify;
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let slot = slot.clone();
            let notify = notify.clone();
            let predicate = predicate.clone();
            Box::pin(async move {
                if slot.lock().is_none() {
                    notify.notified().await;
                }
                let message = slot.lock().clone();
                let message = message.ok_or_else(|| {
                    ComponentError::misuse("wait step woke with no captured message")
                })?;
                if let Some(predicate) = predicate {
                    if !predicate(&message.payload).map_err(ComponentError::from)? {
                        return Err(ComponentError::AssertionFailed(format!(
                            "wait assertion failed for {}",
                            message.payload
                        )));
                    }
                }
                Ok(())
            })
        });
        let mut step = Step::new("wait", self.phase, StepAction::Custom(action));
        step.timeout = self.timeout;
        self.test_case.register_step(step);
    }
}
