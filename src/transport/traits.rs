//! Transport driver contract (§6 EXTERNAL INTERFACES).
//!
//! Every concrete adapter (HTTP, WebSocket, TCP, gRPC, Kafka/RabbitMQ/Redis,
//! Postgres/Redis/Mongo) implements the subset of these traits appropriate
//! to its kind. The engine exchanges only the internal [`Message`] shape
//! with adapters; protocol framing lives entirely in the adapter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::component::ComponentError;
use crate::message::Message;
use crate::util::{Address, TraceId};

/// Callback the engine hands a transport so inbound messages flow into the
/// component's hook-dispatch logic (§4.3 "Transport callback"). Transports
/// never call back into user step-builder code directly — they call this,
/// which is owned by the component.
pub type InboundHandler =
    Arc<dyn Fn(Message) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// `{type, async, supportsProxy, supportsMock, streaming, requiresConnection,
/// bidirectional}` (§6). Consulted by step builders at build time so that
/// calling a method the transport doesn't support is a build-time misuse
/// error (§7) rather than a silent no-op.
#[derive(Debug, Clone, Copy)]
pub struct TransportCharacteristics {
    pub transport_type: &'static str,
    pub is_async: bool,
    pub supports_proxy: bool,
    pub supports_mock: bool,
    pub streaming: bool,
    pub requires_connection: bool,
    pub bidirectional: bool,
}

/// Sync server side: `startServer`, `stopServer`, `onRequest` (mock mode is
/// implemented by the engine's hook dispatch, not the transport), `respond`
/// for the reply channel bound to a request's `traceId`.
#[async_trait]
pub trait SyncServerTransport: Send + Sync {
    fn characteristics(&self) -> TransportCharacteristics;
    async fn start_server(
        &self,
        listen: Address,
        on_request: InboundHandler,
    ) -> Result<(), ComponentError>;
    async fn stop_server(&self) -> Result<(), ComponentError>;
    async fn respond(&self, trace_id: TraceId, message: Message) -> Result<(), ComponentError>;
}

/// Sync client side: `createClient`, `closeClient`, `request`.
#[async_trait]
pub trait SyncClientTransport: Send + Sync {
    fn characteristics(&self) -> TransportCharacteristics;
    async fn create_client(&self, target: Address) -> Result<(), ComponentError>;
    async fn close_client(&self) -> Result<(), ComponentError>;
    async fn request(&self, message: Message) -> Result<Message, ComponentError>;
}

/// Async stream server side (`onMessage`/`waitMessage`/`mockEvent` surface
/// on top): `startServer`, `stopServer`, `sendMessage`.
#[async_trait]
pub trait AsyncServerTransport: Send + Sync {
    fn characteristics(&self) -> TransportCharacteristics;
    async fn start_server(
        &self,
        listen: Address,
        on_message: InboundHandler,
    ) -> Result<(), ComponentError>;
    async fn stop_server(&self) -> Result<(), ComponentError>;
    async fn send_message(&self, message: Message) -> Result<(), ComponentError>;
}

/// Async stream client side.
#[async_trait]
pub trait AsyncClientTransport: Send + Sync {
    fn characteristics(&self) -> TransportCharacteristics;
    async fn create_client(
        &self,
        target: Address,
        on_message: InboundHandler,
    ) -> Result<(), ComponentError>;
    async fn close_client(&self) -> Result<(), ComponentError>;
    async fn send_message(&self, message: Message) -> Result<(), ComponentError>;
}

/// MQ publisher: `createPublisher(codec)->{publish, publishBatch, close,
/// isConnected}`.
#[async_trait]
pub trait PublisherTransport: Send + Sync {
    async fn connect(&self) -> Result<(), ComponentError>;
    async fn close(&self) -> Result<(), ComponentError>;
    async fn publish(
        &self,
        topic: &str,
        message: Message,
        key: Option<String>,
    ) -> Result<(), ComponentError>;
}

/// MQ subscriber: `createSubscriber(codec)->{subscribe, unsubscribe,
/// onMessage, onError, onDisconnect, close}` with dynamic topic sets.
#[async_trait]
pub trait SubscriberTransport: Send + Sync {
    async fn connect(&self, on_message: InboundHandler) -> Result<(), ComponentError>;
    async fn close(&self) -> Result<(), ComponentError>;
    async fn subscribe(&self, topic: &str) -> Result<(), ComponentError>;
    async fn unsubscribe(&self, topic: &str) -> Result<(), ComponentError>;
}
