//! Multi-peer failover and leader-pinned connections

use super::errors::ConnectionError;
use super::transport::{TransportFactory, WsFactory};
use super::websocket::{WebSocketConnection, DEFAULT_TIMEOUT};
use super::Connection;
use crate::codec::Payload;
use crate::roster::{NodeAddress, Roster};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection that tries every roster node in order until one succeeds.
///
/// Each call snapshots the address list and keeps its attempt state local,
/// so concurrent calls on one instance are independent.
///
/// Failover is exhaustive: a node-local failure (transport fault, timeout)
/// advances to the next address, and the call fails only once every node
/// failed, with an aggregate error naming each failure. Local usage errors
/// (unregistered type, codec, configuration) short-circuit instead: no
/// other node can succeed where they failed.
pub struct RosterConnection {
    addresses: Vec<NodeAddress>,
    service: String,
    timeout: Duration,
    factory: Arc<dyn TransportFactory>,
}

impl RosterConnection {
    pub fn new(roster: &Roster, service: impl Into<String>) -> Self {
        Self::with_factory(roster, service, Arc::new(WsFactory))
    }

    pub fn with_factory(
        roster: &Roster,
        service: impl Into<String>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            addresses: roster.addresses().to_vec(),
            service: service.into(),
            timeout: DEFAULT_TIMEOUT,
            factory,
        }
    }

    /// Set the per-attempt timeout for subsequent calls.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Connection for RosterConnection {
    async fn send<M: Payload, R: Payload>(&self, message: &M) -> Result<R, ConnectionError> {
        let mut failures = Vec::new();

        for addr in &self.addresses {
            let mut peer = WebSocketConnection::with_factory(
                addr.clone(),
                self.service.clone(),
                Arc::clone(&self.factory),
            );
            peer.set_timeout(self.timeout);

            match peer.send(message).await {
                Ok(reply) => {
                    if !failures.is_empty() {
                        debug!(node = %addr, skipped = failures.len(), "succeeded after failover");
                    }
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() => {
                    warn!(node = %addr, error = %err, "node failed, advancing to next");
                    failures.push(format!("{addr}: {err}"));
                }
                Err(err) => return Err(err),
            }
        }

        Err(ConnectionError::AllNodesFailed(failures))
    }
}

impl std::fmt::Debug for RosterConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterConnection")
            .field("addresses", &self.addresses)
            .field("service", &self.service)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Connection pinned to the roster's leader (its first node). No failover.
///
/// Used where only the designated leader may legally service the call.
#[derive(Debug)]
pub struct LeaderConnection {
    inner: WebSocketConnection,
}

impl LeaderConnection {
    pub fn new(roster: &Roster, service: impl Into<String>) -> Result<Self, ConnectionError> {
        Self::with_factory(roster, service, Arc::new(WsFactory))
    }

    pub fn with_factory(
        roster: &Roster,
        service: impl Into<String>,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self, ConnectionError> {
        let leader = roster.leader().ok_or_else(|| {
            ConnectionError::Configuration("roster should have at least one node".to_string())
        })?;
        Ok(Self {
            inner: WebSocketConnection::with_factory(leader.clone(), service, factory),
        })
    }

    /// The leader's address.
    pub fn url(&self) -> &NodeAddress {
        self.inner.url()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.inner.set_timeout(timeout);
    }
}

#[async_trait]
impl Connection for LeaderConnection {
    async fn send<M: Payload, R: Payload>(&self, message: &M) -> Result<R, ConnectionError> {
        self.inner.send(message).await
    }
}
