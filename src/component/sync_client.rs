//! `SyncClient` (§4.3, §4.4): sends a request and waits for its correlated
//! response. `request(...).onResponse(...)` compiles to one `Custom` step.

use std::sync::Arc;

use async_trait::async_trait;

use crate::hook::{HandlerError, HookRegistry};
use crate::message::{Interaction, InteractionDirection, Message};
use crate::step::{CustomAction, Step, StepAction, TestContext};
use crate::testcase::TestCaseBuilderHandle;
use crate::transport::SyncClientTransport;
use crate::util::{Address, TraceId};

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};

pub struct SyncClient<T: SyncClientTransport> {
    core: Arc<ComponentCore>,
    transport: Arc<T>,
    target: Address,
}

impl<T: SyncClientTransport + 'static> SyncClient<T> {
    pub fn new(name: impl Into<String>, transport: Arc<T>, target: Address) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            transport,
            target,
        })
    }

    pub async fn request(&self, message: Message) -> Result<Message, ComponentError> {
        self.core.ensure_started()?;
        self.core.push_interaction(Interaction::new(
            self.core.name(),
            InteractionDirection::Outbound,
            &message,
        ));
        let response = self.transport.request(message).await?;
        self.core.push_interaction(Interaction::new(
            self.core.name(),
            InteractionDirection::Inbound,
            &response,
        ));
        Ok(response)
    }
}

#[async_trait]
impl<T: SyncClientTransport + 'static> Component for SyncClient<T> {
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
        self.core
            .start_once(|| async move { transport.create_client(target).await })
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

impl<T: SyncClientTransport + 'static> HasStepBuilder for SyncClient<T> {
    type StepBuilder = SyncClientStepBuilder<T>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        SyncClientStepBuilder {
            client: self.clone(),
            test_case,
        }
    }
}

pub struct SyncClientStepBuilder<T: SyncClientTransport> {
    client: Arc<SyncClient<T>>,
    test_case: TestCaseBuilderHandle,
}

impl<T: SyncClientTransport + 'static> SyncClientStepBuilder<T> {
    /// `request(messageType, payload)` (§4.4): begins a fluent chain that
    /// must end in `.on_response(...)` to become a registered step.
    pub fn request(&self, message_type: impl Into<String>, payload: serde_json::Value) -> RequestBuilder<T> {
        RequestBuilder {
            client: self.client.clone(),
            test_case: self.test_case.clone(),
            message: Message::new(message_type, payload),
        }
    }
}

pub struct RequestBuilder<T: SyncClientTransport> {
    client: Arc<SyncClient<T>>,
    test_case: TestCaseBuilderHandle,
    message: Message,
}

impl<T: SyncClientTransport + 'static> RequestBuilder<T> {
    /// `.onResponse(handler)`: registers one step that sends the request and
    /// runs `handler` against the response payload, failing the step if it
    /// returns `Err` (§4.4).
    pub fn on_response<F>(self, handler: F)
    where
        F: Fn(&serde_json::Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let phase = self.test_case.current_phase();
        let client = self.client;
        let name = format!("request({})", self.message.message_type);
        let message = self.message.with_trace_id(TraceId::new());
        let handler = Arc::new(handler);
        let action: CustomAction = Arc::new(move |_ctx: TestContext| {
            let client = client.clone();
            let message = message.clone();
            let handler = handler.clone();
            Box::pin(async move {
                let response = client.request(message).await?;
                handler(&response.payload).map_err(ComponentError::from)
            })
        });
        self.test_case
            .register_step(Step::new(name, phase, StepAction::Custom(action)));
    }
}
