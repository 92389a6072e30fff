//! Connection layer: single-peer exchange, roster failover, leader pinning
//!
//! A connection carries one request/response exchange per call. Three
//! flavors share the [`Connection`] trait:
//! - [`WebSocketConnection`]: one fixed node address
//! - [`RosterConnection`]: tries every roster node in order
//! - [`LeaderConnection`]: pinned to the roster's first node

pub mod errors;
pub mod failover;
pub mod transport;
pub mod websocket;

pub use errors::ConnectionError;
pub use failover::{LeaderConnection, RosterConnection};
pub use transport::{
    TransportAdapter, TransportEvent, TransportFactory, WsFactory, CLOSE_NORMAL, CLOSE_TIMEOUT,
};
pub use websocket::{WebSocketConnection, DEFAULT_TIMEOUT};

use crate::codec::Payload;
use async_trait::async_trait;

/// A connection able to send a message to one or more distant peers.
///
/// Sending a message of an unregistered type, or expecting an unregistered
/// reply type, fails with [`ConnectionError::TypeNotRegistered`] before any
/// network I/O.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send `message` and await the decoded reply of type `R`.
    async fn send<M: Payload, R: Payload>(&self, message: &M) -> Result<R, ConnectionError>;
}
