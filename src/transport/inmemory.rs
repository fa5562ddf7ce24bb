//! In-process reference transports (§6, SPEC_FULL §6 "exactly one concrete
//! transport family").
//!
//! These are not network transports: they wire components together with
//! `tokio` channels inside one process. They exist so the engine's own
//! tests and the §8 end-to-end scenarios can run without a real HTTP/WS/
//! MQ/DB adapter, and they double as the reference a real adapter crate
//! would follow.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::component::ComponentError;
use crate::message::Message;
use crate::util::{Address, TraceId};

use super::traits::{
    AsyncClientTransport, AsyncServerTransport, InboundHandler, PublisherTransport,
    SubscriberTransport, SyncClientTransport, SyncServerTransport, TransportCharacteristics,
};

fn characteristics(is_async: bool, bidirectional: bool) -> TransportCharacteristics {
    TransportCharacteristics {
        transport_type: "in-memory",
        is_async,
        supports_proxy: true,
        supports_mock: true,
        streaming: is_async,
        requires_connection: true,
        bidirectional,
    }
}

/// Shared registry backing the sync in-memory transport: one entry per
/// listening address, plus a table of in-flight requests keyed by trace id
/// so a server's `respond` reaches the right waiting client.
#[derive(Default)]
pub struct InMemorySyncNetwork {
    servers: DashMap<Address, InboundHandler>,
    pending: DashMap<TraceId, oneshot::Sender<Message>>,
}

impl InMemorySyncNetwork {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }
}

/// Sync server endpoint bound to one listen address on a shared network.
pub struct InMemorySyncServer {
    network: Arc<InMemorySyncNetwork>,
    listen: Address,
}

impl InMemorySyncServer {
    pub fn new(network: Arc<InMemorySyncNetwork>, listen: Address) -> Self {
        Self { network, listen }
    }
}

#[async_trait]
impl SyncServerTransport for InMemorySyncServer {
    fn characteristics(&self) -> TransportCharacteristics {
        characteristics(false, false)
    }

    async fn start_server(
        &self,
        _listen: Address,
        on_request: InboundHandler,
    ) -> Result<(), ComponentError> {
        self.network.servers.insert(self.listen.clone(), on_request);
        Ok(())
    }

    async fn stop_server(&self) -> Result<(), ComponentError> {
        self.network.servers.remove(&self.listen);
        Ok(())
    }

    async fn respond(&self, trace_id: TraceId, message: Message) -> Result<(), ComponentError> {
        if let Some((_, sender)) = self.network.pending.remove(&trace_id) {
            let _ = sender.send(message);
        }
        Ok(())
    }
}

/// Sync client endpoint targeting one address on a shared network.
pub struct InMemorySyncClient {
    network: Arc<InMemorySyncNetwork>,
    target: RwLock<Option<Address>>,
}

impl InMemorySyncClient {
    pub fn new(network: Arc<InMemorySyncNetwork>) -> Self {
        Self {
            network,
            target: RwLock::new(None),
        }
    }
}

#[async_trait]
impl SyncClientTransport for InMemorySyncClient {
    fn characteristics(&self) -> TransportCharacteristics {
        characteristics(false, false)
    }

    async fn create_client(&self, target: Address) -> Result<(), ComponentError> {
        *self.target.write() = Some(target);
        Ok(())
    }

    async fn close_client(&self) -> Result<(), ComponentError> {
        *self.target.write() = None;
        Ok(())
    }

    async fn request(&self, message: Message) -> Result<Message, ComponentError> {
        let target = self
            .target
            .read()
            .clone()
            .ok_or_else(|| ComponentError::misuse("request sent before create_client"))?;
        let handler = self
            .network
            .servers
            .get(&target)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ComponentError::transport(format!("connection refused: {target}")))?;

        let trace_id = message
            .trace_id
            .ok_or_else(|| ComponentError::misuse("sync request message is missing a traceId"))?;
        let (tx, rx) = oneshot::channel();
        self.network.pending.insert(trace_id, tx);
        handler(message).await;
        rx.await
            .map_err(|_| ComponentError::transport("server disconnected before responding"))
    }
}

/// Shared registry backing the async in-memory transport: the server's
/// inbound handler, plus the set of connected clients' inbound handlers so
/// the server can broadcast outbound events/messages.
#[derive(Default)]
pub struct InMemoryAsyncNetwork {
    servers: DashMap<Address, InboundHandler>,
    clients: DashMap<Address, Vec<InboundHandler>>,
}

impl InMemoryAsyncNetwork {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }
}

pub struct InMemoryAsyncServer {
    network: Arc<InMemoryAsyncNetwork>,
    listen: Address,
}

impl InMemoryAsyncServer {
    pub fn new(network: Arc<InMemoryAsyncNetwork>, listen: Address) -> Self {
        Self { network, listen }
    }
}

#[async_trait]
impl AsyncServerTransport for InMemoryAsyncServer {
    fn characteristics(&self) -> TransportCharacteristics {
        characteristics(true, true)
    }

    async fn start_server(
        &self,
        _listen: Address,
        on_message: InboundHandler,
    ) -> Result<(), ComponentError> {
        self.network.servers.insert(self.listen.clone(), on_message);
        Ok(())
    }

    async fn stop_server(&self) -> Result<(), ComponentError> {
        self.network.servers.remove(&self.listen);
        self.network.clients.remove(&self.listen);
        Ok(())
    }

    async fn send_message(&self, message: Message) -> Result<(), ComponentError> {
        if let Some(handlers) = self.network.clients.get(&self.listen) {
            for handler in handlers.value() {
                handler(message.clone()).await;
            }
        }
        Ok(())
    }
}

pub struct InMemoryAsyncClient {
    network: Arc<InMemoryAsyncNetwork>,
    target: RwLock<Option<Address>>,
}

impl InMemoryAsyncClient {
    pub fn new(network: Arc<InMemoryAsyncNetwork>) -> Self {
        Self {
            network,
            target: RwLock::new(None),
        }
    }
}

#[async_trait]
impl AsyncClientTransport for InMemoryAsyncClient {
    fn characteristics(&self) -> TransportCharacteristics {
        characteristics(true, true)
    }

    async fn create_client(
        &self,
        target: Address,
        on_message: InboundHandler,
    ) -> Result<(), ComponentError> {
        self.network
            .clients
            .entry(target.clone())
            .or_default()
            .push(on_message);
        *self.target.write() = Some(target);
        Ok(())
    }

    async fn close_client(&self) -> Result<(), ComponentError> {
        *self.target.write() = None;
        Ok(())
    }

    async fn send_message(&self, message: Message) -> Result<(), ComponentError> {
        let target = self
            .target
            .read()
            .clone()
            .ok_or_else(|| ComponentError::misuse("sendMessage before create_client"))?;
        let handler = self
            .network
            .servers
            .get(&target)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ComponentError::transport(format!("connection refused: {target}")))?;
        handler(message).await;
        Ok(())
    }
}

/// Topic-keyed in-memory MQ broker backing `Publisher`/`Subscriber`.
#[derive(Default)]
pub struct InMemoryMqBroker {
    topics: DashMap<String, Vec<InboundHandler>>,
}

impl InMemoryMqBroker {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }
}

pub struct InMemoryPublisher {
    broker: Arc<InMemoryMqBroker>,
}

impl InMemoryPublisher {
    pub fn new(broker: Arc<InMemoryMqBroker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl PublisherTransport for InMemoryPublisher {
    async fn connect(&self) -> Result<(), ComponentError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ComponentError> {
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        message: Message,
        _key: Option<String>,
    ) -> Result<(), ComponentError> {
        if let Some(handlers) = self.broker.topics.get(topic) {
            for handler in handlers.value() {
                handler(message.clone()).await;
            }
        }
        Ok(())
    }
}

pub struct InMemorySubscriber {
    broker: Arc<InMemoryMqBroker>,
    on_message: RwLock<Option<InboundHandler>>,
}

impl InMemorySubscriber {
    pub fn new(broker: Arc<InMemoryMqBroker>) -> Self {
        Self {
            broker,
            on_message: RwLock::new(None),
        }
    }
}

#[async_trait]
impl SubscriberTransport for InMemorySubscriber {
    async fn connect(&self, on_message: InboundHandler) -> Result<(), ComponentError> {
        *self.on_message.write() = Some(on_message);
        Ok(())
    }

    async fn close(&self) -> Result<(), ComponentError> {
        *self.on_message.write() = None;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), ComponentError> {
        let handler = self
            .on_message
            .read()
            .clone()
            .ok_or_else(|| ComponentError::misuse("subscribe before connect"))?;
        self.broker.topics.entry(topic.to_string()).or_default().push(handler);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ComponentError> {
        self.broker.topics.remove(topic);
        Ok(())
    }
}

/// In-memory key/value handle standing in for a Postgres/Redis/Mongo
/// connection pool in `DataSource` examples and tests.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryKvStore {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::future::Future;
    use std::pin::Pin;

    fn handler(
        f: impl Fn(Message) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    ) -> InboundHandler {
        Arc::new(f)
    }

    #[tokio::test]
    async fn sync_request_reaches_registered_server_and_response_routes_back() {
        let network = InMemorySyncNetwork::new();
        let listen = Address::local(4000);
        let server = InMemorySyncServer::new(network.clone(), listen.clone());
        let client = InMemorySyncClient::new(network.clone());

        let responder = InMemorySyncServer::new(network.clone(), listen.clone());
        server
            .start_server(
                listen.clone(),
                handler(move |msg| {
                    let responder = InMemorySyncServer::new(network.clone(), listen.clone());
                    let trace_id = msg.trace_id.unwrap();
                    Box::pin(async move {
                        let _ = responder
                            .respond(trace_id, Message::new("getUser", json!({"id": 1})))
                            .await;
                    })
                }),
            )
            .await
            .unwrap();
        drop(responder);

        client.create_client(listen.clone()).await.unwrap();
        let trace_id = TraceId::new();
        let request = Message::new("getUser", json!({})).with_trace_id(trace_id);
        let response = client.request(request).await.unwrap();
        assert_eq!(response.payload, json!({"id": 1}));
    }

    #[tokio::test]
    async fn request_to_unbound_address_is_a_transport_failure() {
        let network = InMemorySyncNetwork::new();
        let client = InMemorySyncClient::new(network);
        client.create_client(Address::local(4001)).await.unwrap();
        let request = Message::new("getUser", json!({})).with_trace_id(TraceId::new());
        let err = client.request(request).await.unwrap_err();
        assert!(matches!(err, ComponentError::Transport(_)));
    }
}
