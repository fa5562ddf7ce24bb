//! `Publisher`/`Subscriber` (§4.3, §4.4): one-way MQ-style components.
//! Subscriptions are a dynamic, runtime-changeable set rather than something
//! fixed at build time, so `subscribe`/`unsubscribe` are steps, not builder
//! calls (§6 "dynamic topic sets").

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock as PLRwLock};
use serde_json::Value;
use tokio::sync::Notify;

use crate::hook::{run_chain, Handler, HandlerOutput, Hook, HookRegistry, Matcher};
use crate::message::Message;
use crate::step::{CustomAction, Step, StepAction, TestContext};
use crate::testcase::TestCaseBuilderHandle;
use crate::transport::{InboundHandler, PublisherTransport, SubscriberTransport};

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};
use super::wait::EventWaitBuilder;

pub struct Publisher<T: PublisherTransport> {
    core: Arc<ComponentCore>,
    transport: Arc<T>,
}

impl<T: PublisherTransport + 'static> Publisher<T> {
    pub fn new(name: impl Into<String>, transport: Arc<T>) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            transport,
        })
    }

    pub async fn publish(
        &self,
        topic: &str,
        message: Message,
        key: Option<String>,
    ) -> Result<(), ComponentError> {
        self.core.ensure_started()?;
        self.transport.publish(topic, message, key).await
    }
}

#[async_trait]
impl<T: PublisherTransport + 'static> Component for Publisher<T> {
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
        self.core
            .start_once(|| async move { transport.connect().await })
            .await
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        let transport = self.transport.clone();
        self.core
            .stop_once(|| async move { transport.close().await })
            .await
    }

    fn hook_registry(&self) -> &HookRegistry {
        self.core.registry()
    }

    fn take_unhandled_errors(&self) -> Vec<ComponentError> {
        self.core.take_unhandled_errors()
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
        self
    }
}

impl<T: PublisherTransport + 'static> HasStepBuilder for Publisher<T> {
    type StepBuilder = PublisherStepBuilder<T>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        PublisherStepBuilder {
            publisher: self.clone(),
            test_case,
        }
    }
}

pub struct PublisherStepBuilder<T: PublisherTransport> {
    publisher: Arc<Publisher<T>>,
    test_case: TestCaseBuilderHandle,
}

impl<T: PublisherTransport + 'static> PublisherStepBuilder<T> {
    /// `publish(topic, messageType, payload)`, with an optional partition
    /// key (§6).
    pub fn publish(&self, topic: impl Into<String>, message_type: impl Into<String>, payload: Value) {
        self.publish_with_key(topic, message_type, payload, None)
    }

    pub fn publish_with_key(
        &self,
        topic: impl Into<String>,
        message_type: impl Into<String>,
        payload: Value,
        key: Option<String>,
    ) {
        let phase = self.test_case.current_phase();
        let topic = topic.into();
        let publisher = self.publisher.clone();
        let message = Message::new(message_type, payload);
        let name = format!("publish({topic}, {})", message.message_type);
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let publisher = publisher.clone();
            let message = message.clone();
            let topic = topic.clone();
            let key = key.clone();
            Box::pin(async move { publisher.publish(&topic, message, key).await })
        });
        self.test_case
            .register_step(Step::new(name, phase, StepAction::Custom(action)));
    }
}

pub struct Subscriber<T: SubscriberTransport> {
    core: Arc<ComponentCore>,
    transport: Arc<T>,
    subscribed: PLRwLock<HashSet<String>>,
}

impl<T: SubscriberTransport + 'static> Subscriber<T> {
    pub fn new(name: impl Into<String>, transport: Arc<T>) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            transport,
            subscribed: PLRwLock::new(HashSet::new()),
        })
    }

    pub async fn subscribe(&self, topic: &str) -> Result<(), ComponentError> {
        self.core.ensure_started()?;
        self.transport.subscribe(topic).await?;
        self.subscribed.write().insert(topic.to_string());
        Ok(())
    }

    pub async fn unsubscribe(&self, topic: &str) -> Result<(), ComponentError> {
        self.core.ensure_started()?;
        self.transport.unsubscribe(topic).await?;
        self.subscribed.write().remove(topic);
        Ok(())
    }
}

async fn dispatch(core: &ComponentCore, message: Message) {
    if let Some(hook) = core.registry().find_first_match(&message) {
        if let Err(e) = run_chain(&hook.handlers, message.payload.clone()) {
            core.push_unhandled_error(ComponentError::from(e));
        }
    }
}

#[async_trait]
impl<T: SubscriberTransport + 'static> Component for Subscriber<T> {
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
                transport.connect(on_message).await
            })
            .await
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        let transport = self.transport.clone();
        self.core
            .stop_once(|| async move { transport.close().await })
            .await
    }

    fn hook_registry(&self) -> &HookRegistry {
        self.core.registry()
    }

    fn take_unhandled_errors(&self) -> Vec<ComponentError> {
        self.core.take_unhandled_errors()
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
        self
    }
}

impl<T: SubscriberTransport + 'static> HasStepBuilder for Subscriber<T> {
    type StepBuilder = SubscriberStepBuilder<T>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        SubscriberStepBuilder {
            subscriber: self.clone(),
            test_case,
        }
    }
}

pub struct SubscriberStepBuilder<T: SubscriberTransport> {
    subscriber: Arc<Subscriber<T>>,
    test_case: TestCaseBuilderHandle,
}

impl<T: SubscriberTransport + 'static> SubscriberStepBuilder<T> {
    pub fn subscribe(&self, topic: impl Into<String>) {
        let phase = self.test_case.current_phase();
        let topic = topic.into();
        let subscriber = self.subscriber.clone();
        let name = format!("subscribe({topic})");
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let subscriber = subscriber.clone();
            let topic = topic.clone();
            Box::pin(async move { subscriber.subscribe(&topic).await })
        });
        self.test_case
            .register_step(Step::new(name, phase, StepAction::Custom(action)));
    }

    pub fn unsubscribe(&self, topic: impl Into<String>) {
        let phase = self.test_case.current_phase();
        let topic = topic.into();
        let subscriber = self.subscriber.clone();
        let name = format!("unsubscribe({topic})");
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let subscriber = subscriber.clone();
            let topic = topic.clone();
            Box::pin(async move { subscriber.unsubscribe(&topic).await })
        });
        self.test_case
            .register_step(Step::new(name, phase, StepAction::Custom(action)));
    }

    /// Pre-registers a one-shot hook at build time, mirroring
    /// `AsyncClient::wait_event`'s early-arrival guarantee (§5, §8).
    pub fn wait_event(&self, message_type: impl Into<String>) -> EventWaitBuilder {
        let message_type = message_type.into();
        let slot: Arc<Mutex<Option<Message>>> = Arc::new(Mutex::new(None));
        let notify = Arc::new(Notify::new());

        let core = self.subscriber.core.clone();
        let hook_slot = slot.clone();
        let hook_notify = notify.clone();
        let registry_core = core.clone();
        let hook = Hook::new(
            Component::name(self.subscriber.as_ref()),
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
