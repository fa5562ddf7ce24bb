//! `AsyncServer` (§4.3, §4.4): the server side of a persistent connection.
//! `onMessage(type).mockEvent(type, fn)` registers a hook at build time;
//! `waitMessage` mirrors `AsyncClient::waitEvent`'s early-arrival guarantee.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::hook::{run_chain, ChainOutcome, Handler, HandlerError, HandlerOutput, Hook, HookRegistry, Matcher};
use crate::message::{Interaction, InteractionDirection, Message};
use crate::phase::Phase;
use crate::testcase::TestCaseBuilderHandle;
use crate::transport::{AsyncServerTransport, InboundHandler};
use crate::util::Address;

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};
use super::wait::EventWaitBuilder;

pub struct AsyncServer<T: AsyncServerTransport> {
    core: Arc<ComponentCore>,
    transport: Arc<T>,
    listen: Address,
}

impl<T: AsyncServerTransport + 'static> AsyncServer<T> {
    pub fn new(name: impl Into<String>, transport: Arc<T>, listen: Address) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            transport,
            listen,
        })
    }

    pub async fn send_event(&self, message: Message) -> Result<(), ComponentError> {
        self.core.ensure_started()?;
        self.core.push_interaction(Interaction::new(
            self.core.name(),
            InteractionDirection::Outbound,
            &message,
        ));
        self.transport.send_message(message).await
    }
}

async fn dispatch<T: AsyncServerTransport>(core: &ComponentCore, transport: &T, message: Message) {
    core.push_interaction(Interaction::new(core.name(), InteractionDirection::Inbound, &message));

    let Some(hook) = core.registry().find_first_match(&message) else {
        return;
    };
    match run_chain(&hook.handlers, message.payload.clone()) {
        Ok(ChainOutcome::Value(value)) | Ok(ChainOutcome::Respond(value)) => {
            if let Some(event_type) = crate::hook::mock_event_type(&hook.handlers) {
                let event = Message::new(event_type, value);
                if let Err(e) = transport.send_message(event.clone()).await {
                    core.push_unhandled_error(ComponentError::transport(e.to_string()));
                } else {
                    core.push_interaction(Interaction::new(core.name(), InteractionDirection::Outbound, &event));
                }
            }
        }
        Ok(ChainOutcome::Dropped) => {}
        Err(e) => core.push_unhandled_error(ComponentError::from(e)),
    }
}

#[async_trait]
impl<T: AsyncServerTransport + 'static> Component for AsyncServer<T> {
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
                let on_message: InboundHandler = Arc::new(move |message: Message| {
                    let core = dispatch_core.clone();
                    let transport = dispatch_transport.clone();
                    Box::pin(async move {
                        dispatch(&core, transport.as_ref(), message).await;
                    })
                });
                transport.start_server(listen, on_message).await
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

impl<T: AsyncServerTransport + 'static> HasStepBuilder for AsyncServer<T> {
    type StepBuilder = AsyncServerStepBuilder<T>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        AsyncServerStepBuilder {
            server: self.clone(),
            test_case,
        }
    }
}

pub struct AsyncServerStepBuilder<T: AsyncServerTransport> {
    server: Arc<AsyncServer<T>>,
    test_case: TestCaseBuilderHandle,
}

impl<T: AsyncServerTransport + 'static> AsyncServerStepBuilder<T> {
    /// `onMessage(messageType)`: begins a chain that must end in
    /// `.mock_event(...)` to register a hook immediately.
    pub fn on_message(&self, message_type: impl Into<String>) -> MockEventBuilder<T> {
        MockEventBuilder {
            server: self.server.clone(),
            phase: self.test_case.current_phase(),
            matcher: Matcher::literal(message_type),
        }
    }

    /// `waitMessage(messageType)`: pre-registers a one-shot hook at build
    /// time so an inbound message arriving before the step runs is still
    /// captured (§5, §8).
    pub fn wait_message(&self, message_type: impl Into<String>) -> EventWaitBuilder {
        let message_type = message_type.into();
        let slot: Arc<Mutex<Option<Message>>> = Arc::new(Mutex::new(None));
        let notify = Arc::new(Notify::new());

        let core = self.server.core.clone();
        let hook_slot = slot.clone();
        let hook_notify = notify.clone();
        let registry_core = core.clone();
        let hook = Hook::new(
            Component::name(self.server.as_ref()),
            self.test_case.current_phase(),
            Matcher::literal(message_type.clone()),
        );
        let hook_id = hook.id;
        let hook = hook.with_handlers(vec![Handler::transform(None, move |value: &Value| {
            let message = Message::new(message_type.clone(), value.clone());
            *hook_slot.lock() = Some(message);
            hook_notify.notify_one();
            registry_core.registry().remove(hook_id);
            Ok(HandlerOutput::Value(value.clone()))
        })]);
        core.registry().register(hook);

        EventWaitBuilder::new(
            self.test_case.clone(),
            self.test_case.current_phase(),
            slot,
            notify,
        )
    }
}

pub struct MockEventBuilder<T: AsyncServerTransport> {
    server: Arc<AsyncServer<T>>,
    phase: Phase,
    matcher: Matcher,
}

impl<T: AsyncServerTransport + 'static> MockEventBuilder<T> {
    /// `.mockEvent(eventType, fn)`: registers a hook that, on a matching
    /// inbound message, broadcasts `fn`'s output tagged `eventType`.
    pub fn mock_event<F>(self, event_type: impl Into<String>, event_factory: F)
    where
        F: Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        let hook = Hook::new(Component::name(self.server.as_ref()), self.phase, self.matcher)
            .with_handlers(vec![Handler::mock_event(event_type, event_factory)]);
        self.server.register_hook(hook);
    }
}
