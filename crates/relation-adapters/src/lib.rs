//! relation-adapters: the Cache (component D) and Broker (component E)
//! adapters, both server-side collaborators of `relation_core::GraphStore`.

pub mod broker;
pub mod cache;

pub use broker::AmqpBroker;
pub use cache::RedisCache;
