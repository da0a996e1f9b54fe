//! relation-client: the client-side Consumer Pool (component G) plus a
//! thin HTTP wrapper (`http_client`) used by the CLI.
//!
//! Modules:
//! - `message`: the `Message` delivered to receivers.
//! - `consumer`: one broker connection's fan-out/attach/detach/redial state
//!   machine.
//! - `pool`: `ConsumerPool`, the attach-policy surface (`listen_detached`,
//!   `listen_attached`, `listen_attached_last`).
//! - `dial`: the production `lapin`-backed `DialFn`.
//! - `http_client`: `RelationClient`, the REST wrapper.

pub mod consumer;
pub mod dial;
pub mod http_client;
pub mod message;
pub mod pool;

pub use consumer::{BrokerConnection, Consumer, NoopConnection};
pub use dial::amqp_dial;
pub use http_client::RelationClient;
pub use message::Message;
pub use pool::{AttachPolicy, ConsumerPool, DialFn};
