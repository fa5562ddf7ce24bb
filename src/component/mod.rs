//! Component variants (§4.3, §4.4): the protocol-specific participants a
//! scenario wires together. Every variant embeds a `ComponentCore` and an
//! `Arc<Transport>` handle, and implements `Component` by delegating
//! lifecycle/hook-registry bookkeeping to the former.

mod async_client;
mod async_server;
mod core;
mod datasource;
mod error;
mod lifecycle;
mod proxy;
mod pubsub;
mod sync_client;
mod sync_server;
mod traits;
mod wait;

pub use async_client::{AsyncClient, AsyncClientEventBuilder, AsyncClientStepBuilder};
pub use async_server::{AsyncServer, AsyncServerStepBuilder, MockEventBuilder};
pub use core::ComponentCore;
pub use datasource::{DataSource, DataSourceExecBuilder, DataSourceStepBuilder};
pub use error::ComponentError;
pub use lifecycle::{ComponentScope, ComponentState, StartTier};
pub use proxy::{Proxy, ProxyHookBuilder, ProxyStepBuilder};
pub use pubsub::{Publisher, PublisherStepBuilder, Subscriber, SubscriberStepBuilder};
pub use sync_client::{RequestBuilder, SyncClient, SyncClientStepBuilder};
pub use sync_server::{MockRequestBuilder, SyncServer, SyncServerStepBuilder};
pub use traits::{downcast_component, Component, ComponentFactory, HasStepBuilder};
pub use wait::EventWaitBuilder;
