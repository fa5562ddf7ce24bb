//! `SyncServer` (§4.3, §4.4): a mock endpoint. `onRequest(matcher)
//! .mockResponse(fn)` registers a hook immediately at build time, not as a
//! deferred step — matching the engine's "hooks at build time" concurrency
//! rule (§5).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::hook::{run_chain, ChainOutcome, Handler, HandlerError, Hook, HookRegistry, Matcher};
use crate::message::{Interaction, InteractionDirection, Message};
use crate::phase::Phase;
use crate::testcase::TestCaseBuilderHandle;
use crate::transport::{InboundHandler, SyncServerTransport};
use crate::util::Address;

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};

pub struct SyncServer<T: SyncServerTransport> {
    core: Arc<ComponentCore>,
    transport: Arc<T>,
    listen: Address,
}

impl<T: SyncServerTransport + 'static> SyncServer<T> {
    pub fn new(name: impl Into<String>, transport: Arc<T>, listen: Address) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            transport,
            listen,
        })
    }
}

#[async_trait]
impl<T: SyncServerTransport + 'static> Component for SyncServer<T> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn start_tier(&self) -> StartTier {
        StartTier::Listener
    }

    fn state(&self) -> ComponentState {
        self.core.state()
    }

    async fn start(&self) -> Result<(), ComponentError> {
        let transport = self.transport.clone();
        let listen = self.listen.clone();
        let core = self.core.clone();
        self.core
            .start_once(|| async move {
                let dispatch_core = core.clone();
                let dispatch_transport = transport.clone();
                let on_request: InboundHandler = Arc::new(move |message: Message| {
                    let core = dispatch_core.clone();
                    let transport = dispatch_transport.clone();
                    Box::pin(async move {
                        dispatch(&core, transport.as_ref(), message).await;
                    })
                });
                transport.start_server(listen, on_request).await
            })
            .await
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        let transport = self.transport.clone();
        self.core
            .stop_once(|| async move { transport.stop_server().await })
            .await
    }

    fn hook_registry(&self) -> &HookRegistry {
        self.core.registry()
    }

    fn take_unhandled_errors(&self) -> Vec<ComponentError> {
        self.core.take_unhandled_errors()
    }

    fn take_interactions(&self) -> Vec<Interaction> {
        self.core.take_interactions()
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
        self
    }
}

#[instrument(skip(core, transport, message), fields(message_type = %message.message_type))]
async fn dispatch<T: SyncServerTransport>(core: &ComponentCore, transport: &T, message: Message) {
    let trace_id = match message.trace_id {
        Some(id) => id,
        None => {
            warn!("sync request arrived without a traceId; cannot respond");
            return;
        }
    };

    core.push_interaction(Interaction::new(core.name(), InteractionDirection::Inbound, &message));

    let hook = core.registry().find_first_match(&message);
    let response_delay = hook.as_ref().and_then(|h| h.response_delay);
    let response_payload = match hook {
        Some(hook) => match run_chain(&hook.handlers, message.payload.clone()) {
            Ok(ChainOutcome::Value(value)) | Ok(ChainOutcome::Respond(value)) => value,
            Ok(ChainOutcome::Dropped) => return,
            Err(e) => {
                core.push_unhandled_error(ComponentError::from(e));
                json!({"code": 500, "body": {"error": "handler failed"}})
            }
        },
        None => json!({"code": 404, "body": {"error": "no matching mock"}}),
    };

    if let Some(delay) = response_delay {
        tokio::time::sleep(delay).await;
    }

    let response = Message::new(message.message_type, response_payload).with_trace_id(trace_id);
    core.push_interaction(Interaction::new(core.name(), InteractionDirection::Outbound, &response));
    if let Err(e) = transport.respond(trace_id, response).await {
        warn!(error = %e, "failed to send mock response");
    }
}

impl<T: SyncServerTransport + 'static> HasStepBuilder for SyncServer<T> {
    type StepBuilder = SyncServerStepBuilder<T>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        SyncServerStepBuilder {
            server: self.clone(),
            test_case,
        }
    }
}

pub struct SyncServerStepBuilder<T: SyncServerTransport> {
    server: Arc<SyncServer<T>>,
    test_case: TestCaseBuilderHandle,
}

impl<T: SyncServerTransport + 'static> SyncServerStepBuilder<T> {
    /// `onRequest(messageType)`: begins a chain that must end in
    /// `.mock_response(...)` to actually register a hook.
    pub fn on_request(&self, message_type: impl Into<String>) -> MockRequestBuilder<T> {
        MockRequestBuilder {
            server: self.server.clone(),
            phase: self.test_case.current_phase(),
            matcher: Matcher::literal(message_type),
            delay: None,
        }
    }
}

pub struct MockRequestBuilder<T: SyncServerTransport> {
    server: Arc<SyncServer<T>>,
    phase: Phase,
    matcher: Matcher,
    delay: Option<Duration>,
}

impl<T: SyncServerTransport + 'static> MockRequestBuilder<T> {
    /// `.delay(ms)`: holds the response for `ms` before it's sent, so a
    /// test can exercise a caller's own timeout handling against a mock
    /// that's merely slow rather than absent.
    pub fn delay(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    /// `.mockResponse(fn)`: registers a hook that replies with `fn`'s
    /// output. Non-persistent: cleared at the end of the owning test case.
    pub fn mock_response<F>(self, response_factory: F)
    where
        F: Fn(&Value) -> Result<crate::hook::HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        let mut hook = Hook::new(self.server.name(), self.phase, self.matcher)
            .with_handlers(vec![Handler::mock_reply(response_factory)]);
        hook.response_delay = self.delay;
        self.server.register_hook(hook);
    }
}
