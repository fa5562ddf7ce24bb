//! Transport driver boundary (§6). `traits` is the contract every adapter
//! (a separate crate, in the general case) implements; `inmemory` is the
//! one concrete family this crate ships, used by its own tests and the
//! end-to-end scenarios.

mod inmemory;
mod traits;

pub use inmemory::{
    InMemoryAsyncClient, InMemoryAsyncNetwork, InMemoryAsyncServer, InMemoryKvStore,
    InMemoryMqBroker, InMemoryPublisher, InMemorySubscriber, InMemorySyncClient,
    InMemorySyncNetwork, InMemorySyncServer,
};
pub use traits::{
    AsyncClientTransport, AsyncServerTransport, InboundHandler, PublisherTransport,
    SubscriberTransport, SyncClientTransport, SyncServerTransport, TransportCharacteristics,
};
