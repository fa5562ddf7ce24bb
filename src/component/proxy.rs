//! `Proxy` (§4.3, §4.4, §9 "Proxy duality"): sits between an upstream
//! listener and a downstream backend, forwarding sync requests/responses
//! through two independent hook registries. Transparent pass-through only
//! kicks in when nothing matches; a matched-and-dropped hook suppresses
//! forwarding entirely rather than falling back to pass-through.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::hook::{run_chain, ChainOutcome, Handler, HandlerError, Hook, HookRegistry, Matcher};
use crate::message::{Interaction, InteractionDirection, Message};
use crate::phase::Phase;
use crate::testcase::TestCaseBuilderHandle;
use crate::transport::{InboundHandler, SyncClientTransport, SyncServerTransport};
use crate::util::Address;

use super::core::ComponentCore;
use super::error::ComponentError;
use super::lifecycle::{ComponentState, StartTier};
use super::traits::{Component, HasStepBuilder};

pub struct Proxy<U: SyncServerTransport, D: SyncClientTransport> {
    core: Arc<ComponentCore>,
    downstream_hooks: Arc<HookRegistry>,
    upstream_transport: Arc<U>,
    downstream_transport: Arc<D>,
    listen: Address,
    target: Address,
}

impl<U: SyncServerTransport + 'static, D: SyncClientTransport + 'static> Proxy<U, D> {
    pub fn new(
        name: impl Into<String>,
        upstream_transport: Arc<U>,
        downstream_transport: Arc<D>,
        listen: Address,
        target: Address,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(ComponentCore::new(name)),
            downstream_hooks: Arc::new(HookRegistry::new()),
            upstream_transport,
            downstream_transport,
            listen,
            target,
        })
    }

    pub fn register_downstream_hook(&self, hook: Hook) {
        self.downstream_hooks.register(hook);
    }
}

/// What the upstream-direction hook chain decided to do with a request
/// (§9 "Proxy duality"): forward it on to the backend, answer the caller
/// directly without ever reaching the backend, or drop it silently.
enum RequestDecision {
    Forward(serde_json::Value),
    Respond(serde_json::Value),
    Drop,
}

async fn dispatch<U: SyncServerTransport, D: SyncClientTransport>(
    core: &ComponentCore,
    downstream_hooks: &HookRegistry,
    upstream: &U,
    downstream: &D,
    message: Message,
) {
    let Some(trace_id) = message.trace_id else {
        warn!("proxy received a request without a traceId; dropping");
        return;
    };

    core.push_interaction(Interaction::new(core.name(), InteractionDirection::Inbound, &message));

    let decision = match core.registry().find_first_match(&message) {
        Some(hook) => match run_chain(&hook.handlers, message.payload.clone()) {
            Ok(ChainOutcome::Value(value)) => RequestDecision::Forward(value),
            Ok(ChainOutcome::Respond(value)) => RequestDecision::Respond(value),
            Ok(ChainOutcome::Dropped) => RequestDecision::Drop,
            Err(e) => {
                core.push_unhandled_error(ComponentError::from(e));
                RequestDecision::Drop
            }
        },
        None => RequestDecision::Forward(message.payload.clone()),
    };

    let response = match decision {
        RequestDecision::Drop => return,
        RequestDecision::Respond(payload) => {
            let final_message =
                Message::new(message.message_type, payload).with_trace_id(trace_id);
            core.push_interaction(Interaction::new(
                core.name(),
                InteractionDirection::Outbound,
                &final_message,
            ));
            if let Err(e) = upstream.respond(trace_id, final_message).await {
                warn!(error = %e, "proxy failed to relay mock response upstream");
            }
            return;
        }
        RequestDecision::Forward(payload) => {
            let forward_message =
                Message::new(message.message_type.clone(), payload).with_trace_id(trace_id);
            match downstream.request(forward_message).await {
                Ok(response) => response,
                Err(e) => {
                    core.push_unhandled_error(e);
                    return;
                }
            }
        }
    };

    let final_payload = match downstream_hooks.find_first_match(&response) {
        Some(hook) => match run_chain(&hook.handlers, response.payload.clone()) {
            Ok(ChainOutcome::Value(value)) | Ok(ChainOutcome::Respond(value)) => Some(value),
            Ok(ChainOutcome::Dropped) => None,
            Err(e) => {
                core.push_unhandled_error(ComponentError::from(e));
                None
            }
        },
        None => Some(response.payload.clone()),
    };

    if let Some(payload) = final_payload {
        let final_message = Message::new(response.message_type, payload).with_trace_id(trace_id);
        core.push_interaction(Interaction::new(
            core.name(),
            InteractionDirection::Outbound,
            &final_message,
        ));
        if let Err(e) = upstream.respond(trace_id, final_message).await {
            warn!(error = %e, "proxy failed to relay response upstream");
        }
    }
}

#[async_trait]
impl<U: SyncServerTransport + 'static, D: SyncClientTransport + 'static> Component for Proxy<U, D> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn start_tier(&self) -> StartTier {
        StartTier::Proxy
    }

    fn state(&self) -> ComponentState {
        self.core.state()
    }

    async fn start(&self) -> Result<(), ComponentError> {
        let upstream_transport = self.upstream_transport.clone();
        let downstream_transport = self.downstream_transport.clone();
        let listen = self.listen.clone();
        let target = self.target.clone();
        let core = self.core.clone();
        let downstream_hooks = self.downstream_hooks.clone();
        self.core
            .start_once(|| async move {
                downstream_transport.create_client(target).await?;
                let dispatch_core = core.clone();
                let dispatch_downstream_hooks = downstream_hooks.clone();
                let dispatch_downstream = downstream_transport.clone();
                let dispatch_upstream = upstream_transport.clone();
                let on_request: InboundHandler = Arc::new(move |message: Message| {
                    let core = dispatch_core.clone();
                    let downstream_hooks = dispatch_downstream_hooks.clone();
                    let upstream = dispatch_upstream.clone();
                    let downstream = dispatch_downstream.clone();
                    Box::pin(async move {
                        dispatch(
                            &core,
                            downstream_hooks.as_ref(),
                            upstream.as_ref(),
                            downstream.as_ref(),
                            message,
                        )
                        .await;
                    })
                });
                upstream_transport.start_server(listen, on_request).await
            })
            .await
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        let upstream_transport = self.upstream_transport.clone();
        let downstream_transport = self.downstream_transport.clone();
        self.core
            .stop_once(|| async move {
                downstream_transport.close_client().await?;
                upstream_transport.stop_server().await
            })
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

    fn clear_test_case_hooks(&self) {
        self.core.registry().clear_non_persistent();
        self.downstream_hooks.clear_non_persistent();
    }

    fn clear_all_hooks(&self) {
        self.core.registry().clear();
        self.downstream_hooks.clear();
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
        self
    }
}

impl<U: SyncServerTransport + 'static, D: SyncClientTransport + 'static> HasStepBuilder
    for Proxy<U, D>
{
    type StepBuilder = ProxyStepBuilder<U, D>;

    fn create_step_builder(
        self: &Arc<Self>,
        test_case: TestCaseBuilderHandle,
    ) -> Self::StepBuilder {
        ProxyStepBuilder {
            proxy: self.clone(),
            test_case,
        }
    }
}

pub struct ProxyStepBuilder<U: SyncServerTransport, D: SyncClientTransport> {
    proxy: Arc<Proxy<U, D>>,
    test_case: TestCaseBuilderHandle,
}

impl<U: SyncServerTransport + 'static, D: SyncClientTransport + 'static> ProxyStepBuilder<U, D> {
    /// `onRequest(messageType)`: upstream-direction hook, registered
    /// immediately at build time.
    pub fn on_request(&self, message_type: impl Into<String>) -> ProxyHookBuilder<U, D> {
        ProxyHookBuilder {
            proxy: self.proxy.clone(),
            phase: self.test_case.current_phase(),
            matcher: Matcher::literal(message_type),
            downstream: false,
        }
    }

    /// `onResponse(messageType)`: downstream-direction hook.
    pub fn on_response(&self, message_type: impl Into<String>) -> ProxyHookBuilder<U, D> {
        ProxyHookBuilder {
            proxy: self.proxy.clone(),
            phase: self.test_case.current_phase(),
            matcher: Matcher::literal(message_type),
            downstream: true,
        }
    }
}

pub struct ProxyHookBuilder<U: SyncServerTransport, D: SyncClientTransport> {
    proxy: Arc<Proxy<U, D>>,
    phase: Phase,
    matcher: Matcher,
    downstream: bool,
}

impl<U: SyncServerTransport + 'static, D: SyncClientTransport + 'static> ProxyHookBuilder<U, D> {
    /// `.transform(fn)`: runs `fn` over the request (or response) payload,
    /// forwarding its output, short-circuiting on `HandlerOutput::Dropped`
    /// (§9 "Proxy duality").
    pub fn transform<F>(self, execute: F)
    where
        F: Fn(&Value) -> Result<crate::hook::HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        let hook = Hook::new(self.proxy.name(), self.phase, self.matcher)
            .with_handlers(vec![Handler::proxy(execute)]);
        if self.downstream {
            self.proxy.register_downstream_hook(hook);
        } else {
            self.proxy.register_hook(hook);
        }
    }

    /// `.mockResponse(fn)`: on the request direction, answers the caller
    /// with `fn`'s output without ever invoking the downstream backend
    /// (§8 End-to-End Scenario 2 "backend never called").
    pub fn mock_response<F>(self, response_factory: F)
    where
        F: Fn(&Value) -> Result<crate::hook::HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        let hook = Hook::new(self.proxy.name(), self.phase, self.matcher)
            .with_handlers(vec![Handler::proxy_mock_response(response_factory)]);
        if self.downstream {
            self.proxy.register_downstream_hook(hook);
        } else {
            self.proxy.register_hook(hook);
        }
    }
}
