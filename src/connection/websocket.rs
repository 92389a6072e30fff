//! Single-peer request/response exchange
//!
//! One call opens one transport to one node, sends one encoded message,
//! waits for one reply and closes. A per-call timer bounds the whole
//! exchange; whichever terminal event fires first (reply, abnormal close,
//! adapter error, timeout) decides the outcome and every later event is
//! ignored.

use super::errors::ConnectionError;
use super::transport::{
    TransportAdapter, TransportEvent, TransportFactory, WsFactory, CLOSE_NORMAL, CLOSE_TIMEOUT,
};
use super::Connection;
use crate::codec::{self, Payload};
use crate::roster::NodeAddress;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-process call sequence, used only to correlate log lines of one
/// exchange.
static NEXT_CALL: AtomicU64 = AtomicU64::new(0);

/// A connection to one fixed node address.
pub struct WebSocketConnection {
    url: NodeAddress,
    service: String,
    timeout: Duration,
    factory: Arc<dyn TransportFactory>,
}

impl WebSocketConnection {
    /// Connection to `addr` for the named service, over real WebSockets.
    pub fn new(addr: NodeAddress, service: impl Into<String>) -> Self {
        Self::with_factory(addr, service, Arc::new(WsFactory))
    }

    /// Same, with an injected transport factory.
    pub fn with_factory(
        addr: NodeAddress,
        service: impl Into<String>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            url: addr,
            service: service.into(),
            timeout: DEFAULT_TIMEOUT,
            factory,
        }
    }

    /// The node address this connection is bound to.
    pub fn url(&self) -> &NodeAddress {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the timeout for subsequent calls. An already-armed timer of an
    /// in-flight call is unaffected.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Drive one attempt up to its first terminal event.
    ///
    /// A failed write after open is not terminal by itself: the
    /// authoritative outcome arrives as a close or error event, or as the
    /// caller's timeout. Likewise a normal-code close without a reply, or
    /// the event stream ending, leaves the call pending for the timer.
    async fn exchange(
        transport: &mut dyn TransportAdapter,
        bytes: Vec<u8>,
        call: u64,
    ) -> Result<Vec<u8>, ConnectionError> {
        transport.open().await?;

        if let Err(err) = transport.send(bytes).await {
            warn!(call, error = %err, "send failed, awaiting close");
        }

        loop {
            match transport.next_event().await {
                Some(TransportEvent::Message(data)) => return Ok(data),
                Some(TransportEvent::Closed { code, reason }) if code != CLOSE_NORMAL => {
                    return Err(ConnectionError::Transport(format!(
                        "connection closed ({code}): {reason}"
                    )));
                }
                Some(TransportEvent::Closed { .. }) => {
                    debug!(call, "peer closed normally before a reply");
                }
                Some(TransportEvent::Error(err)) => return Err(ConnectionError::Transport(err)),
                None => {
                    debug!(call, "event stream ended without a reply");
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send<M: Payload, R: Payload>(&self, message: &M) -> Result<R, ConnectionError> {
        if !codec::is_registered(M::type_name()) {
            return Err(ConnectionError::TypeNotRegistered(M::type_name()));
        }
        if !codec::is_registered(R::type_name()) {
            return Err(ConnectionError::TypeNotRegistered(R::type_name()));
        }

        let call = NEXT_CALL.fetch_add(1, Ordering::Relaxed);
        let path = format!(
            "{}/{}/{}",
            self.url,
            self.service,
            codec::short_name(M::type_name())
        );

        // Encode before opening: a codec failure must not cost a connection.
        let bytes = codec::encode(message)?;

        let mut transport = self.factory.adapter(&path);
        debug!(call, path = %path, len = bytes.len(), "opening transport");

        let outcome =
            tokio::time::timeout(self.timeout, Self::exchange(transport.as_mut(), bytes, call))
                .await;
        match outcome {
            Ok(Ok(data)) => {
                transport.close(CLOSE_NORMAL, "done").await;
                let reply = codec::decode::<R>(&data)?;
                debug!(call, reply = R::type_name(), "reply decoded");
                Ok(reply)
            }
            Ok(Err(err)) => {
                warn!(call, category = err.category(), error = %err, "exchange failed");
                Err(err)
            }
            Err(_elapsed) => {
                debug!(call, timeout = ?self.timeout, "timeout reached, forcing close");
                transport.close(CLOSE_TIMEOUT, "timeout").await;
                Err(ConnectionError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("url", &self.url)
            .field("service", &self.service)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
