//! `AsyncClient` (§4.3, §4.4): a persistent connection exchanging
//! fire-and-forget messages. `waitEvent` pre-registers its one-shot hook at
//! build time so an event arriving before the step executes is still
//! captured (§5, §8 "early arrival").

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::hook::{run_chain, Handler, HandlerError, HandlerOutput, Hook, HookRegistry, Matcher};
use crate::message::{Interaction, InteractionDirection, Message};
use crate::step::{CustomAction, Step, StepAction, TestContext};
use crate::testcase::TestCaseBuilderHandle;
use crate::transport::{AsyncClientTransport, InboundHandler};
use crate::util::Address;

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};
use super::wait::EventWaitBuilder;

pub struct AsyncClient<T: AsyncClientTransport> {
    core: Arc<ComponentCore>,
    transport: Arc<T>,
    target: Address,
}

impl<T: AsyncClientTransport + 'static> AsyncClient<T> {
    pub fn new(name: impl Into<String>, transport: Arc<T>, target: Address) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            transport,
            target,
        })
    }

    pub async fn send_message(&self, message: Message) -> Result<(), ComponentError> {
        self.core.ensure_started()?;
        self.core.push_interaction(Interaction::new(
            self.core.name(),
            InteractionDirection::Outbound,
            &message,
        ));
        self.transport.send_message(message).await
    }

    /// Tears down the transport connection independently of `stop()`: a
    /// test can simulate the peer going away mid-case without waiting for
    /// the component's own lifecycle teardown (§4.4).
    pub async fn disconnect(&self) -> Result<(), ComponentError> {
        self.transport.close_client().await
    }
}

async fn dispatch(core: &ComponentCore, message: Message) {
    core.push_interaction(Interaction::new(core.name(), InteractionDirection::Inbound, &message));
    if let Some(hook) = core.registry().find_first_match(&message) {
        if let Err(e) = run_chain(&hook.handlers, message.payload.clone()) {
            core.push_unhandled_error(ComponentError::from(e));
        }
    }
}

#[async_trait]
impl<T: AsyncClientTransport + 'static> Component for AsyncClient<T> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn start_tier(&self) -> StartTier {
        StartTier::Client
    }

    fn state(&self) -> ComponentState {
        self.core.state()
    }

    async fn start(&self) -> Result<(), ComponentError> {
        let transport = self.transport.clone();
        let target = self.target.clone();
        let core = self.core.clone();
        self.core
            .start_once(|| async move {
                let dispatch_core = core.clone();
                let on_message: InboundHandler = Arc::new(move |message: Message| {
                    let core = dispatch_core.clone();
                    Box::pin(async move {
                        dispatch(&core, message).await;
                    })
                });
                transport.create_client(target, on_message).await
            })
            .await
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        let transport = self.transport.clone();
        self.core
            .stop_once(|| async move { transport.close_client().await })
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

impl<T: AsyncClientTransport + 'static> HasStepBuilder for AsyncClient<T> {
    type StepBuilder = AsyncClientStepBuilder<T>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        AsyncClientStepBuilder {
            client: self.clone(),
            test_case,
        }
    }
}

pub struct AsyncClientStepBuilder<T: AsyncClientTransport> {
    client: Arc<AsyncClient<T>>,
    test_case: TestCaseBuilderHandle,
}

impl<T: AsyncClientTransport + 'static> AsyncClientStepBuilder<T> {
    /// `send(messageType, payload)` (§4.4): fire-and-forget, registered as
    /// one step.
    pub fn send(&self, message_type: impl Into<String>, payload: Value) {
        let phase = self.test_case.current_phase();
        let client = self.client.clone();
        let message = Message::new(message_type, payload);
        let name = format!("send({})", message.message_type);
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let client = client.clone();
            let message = message.clone();
            Box::pin(async move { client.send_message(message).await })
        });
        self.test_case
            .register_step(Step::new(name, phase, StepAction::Custom(action)));
    }

    /// `disconnect()` (§4.4): registers a step that tears down the
    /// transport connection, independent of the component's own `stop()`.
    pub fn disconnect(&self) {
        let phase = self.test_case.current_phase();
        let client = self.client.clone();
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let client = client.clone();
            Box::pin(async move { client.disconnect().await })
        });
        self.test_case
            .register_step(Step::new("disconnect", phase, StepAction::Custom(action)));
    }

    /// `onEvent(eventType)`: registers a persistent hook immediately so it
    /// keeps matching across every step (and, unlike `wait_event`, across
    /// however many events of that type arrive) until the owning component
    /// clears its hooks wholesale (§4.4).
    pub fn on_event(&self, event_type: impl Into<String>) -> AsyncClientEventBuilder<T> {
        AsyncClientEventBuilder {
            client: self.client.clone(),
            phase: self.test_case.current_phase(),
            matcher: Matcher::literal(event_type),
        }
    }

    /// Registers a one-shot hook for `eventType` *now* (at build time) so
    /// an event that arrives before the returned step runs is still
    /// captured, then hands back a builder whose terminal `.assert(...)`
    /// (or plain `.register()`) turns that capture into a step (§5, §8).
    pub fn wait_event(&self, event_type: impl Into<String>) -> EventWaitBuilder {
        let event_type = event_type.into();
        let slot: Arc<Mutex<Option<Message>>> = Arc::new(Mutex::new(None));
        let notify = Arc::new(Notify::new());

        let core = self.client.core.clone();
        let hook_slot = slot.clone();
        let hook_notify = notify.clone();
        let registry_core = core.clone();
        let hook = Hook::new(
            Component::name(self.client.as_ref()),
            self.test_case.current_phase(),
            Matcher::literal(event_type.clone()),
        );
        let hook_id = hook.id;
        let hook = hook.with_handlers(vec![Handler::transform(None, move |value: &Value| {
            let message = Message::new(event_type.clone(), value.clone());
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

pub struct AsyncClientEventBuilder<T: AsyncClientTransport> {
    client: Arc<AsyncClient<T>>,
    phase: Phase,
    matcher: Matcher,
}

impl<T: AsyncClientTransport + 'static> AsyncClientEventBuilder<T> {
    /// `.handle(fn)`: registers a persistent hook that runs `fn` against
    /// every matching event's payload for as long as the component's hooks
    /// live, rather than a `wait_event`-style one-shot capture.
    pub fn handle<F>(self, handle: F)
    where
        F: Fn(&Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handle = Arc::new(handle);
        let hook = Hook::new(Component::name(self.client.as_ref()), self.phase, self.matcher)
            .with_handlers(vec![Handler::transform(None, move |value: &Value| {
                handle(value)?;
                Ok(HandlerOutput::Value(value.clone()))
            })])
            .persistent();
        self.client.register_hook(hook);
    }
}
