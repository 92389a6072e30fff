//! Transport adapter capability
//!
//! The connection layer never touches a socket directly: it consumes a small
//! adapter surface that can open one connection, push bytes, deliver events
//! and close with a status code. The production adapter wraps
//! tokio-tungstenite; tests script the same surface in memory.
//!
//! Factories are constructor-injected per connection instance. There is no
//! process-wide override point.

use super::errors::ConnectionError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Close code for a successfully completed exchange.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code used when the local timeout gives up on the peer, distinct
/// from any code a well-behaved peer would send.
pub const CLOSE_TIMEOUT: u16 = 4000;

/// One event delivered by an open transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A complete inbound message.
    Message(Vec<u8>),
    /// The peer closed the connection.
    Closed { code: u16, reason: String },
    /// The adapter hit a fault it cannot recover from.
    Error(String),
}

/// One message-oriented connection to one address.
///
/// Exactly one open/close cycle per single-peer attempt.
#[async_trait]
pub trait TransportAdapter: Send {
    /// Open the connection. Completion is the "open" event.
    async fn open(&mut self) -> Result<(), ConnectionError>;

    /// Send one binary message.
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), ConnectionError>;

    /// Next inbound event, or `None` once the event stream has ended.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Close with a status code. Infallible from the caller's perspective;
    /// failures are logged by the adapter.
    async fn close(&mut self, code: u16, reason: &str);
}

/// Produces a fresh, not-yet-opened adapter for a connection path.
pub trait TransportFactory: Send + Sync {
    fn adapter(&self, path: &str) -> Box<dyn TransportAdapter>;
}

/// Production factory: plain tokio-tungstenite WebSockets.
#[derive(Debug, Clone, Default)]
pub struct WsFactory;

impl TransportFactory for WsFactory {
    fn adapter(&self, path: &str) -> Box<dyn TransportAdapter> {
        Box::new(WsAdapter::new(path))
    }
}

/// WebSocket transport over tokio-tungstenite.
pub struct WsAdapter {
    url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WsAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: None,
        }
    }
}

#[async_trait]
impl TransportAdapter for WsAdapter {
    async fn open(&mut self) -> Result<(), ConnectionError> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ConnectionError::Transport(format!("error in websocket {}: {e}", self.url)))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), ConnectionError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ConnectionError::Transport("send on unopened transport".to_string()))?;
        stream
            .send(Message::Binary(bytes))
            .await
            .map_err(|e| ConnectionError::Transport(format!("websocket send failed: {e}")))
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        let stream = self.stream.as_mut()?;
        loop {
            return match stream.next().await? {
                Ok(Message::Binary(data)) => Some(TransportEvent::Message(data)),
                Ok(Message::Text(text)) => Some(TransportEvent::Message(text.into_bytes())),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((1005, String::new()));
                    Some(TransportEvent::Closed { code, reason })
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => Some(TransportEvent::Error(e.to_string())),
            };
        }
    }

    async fn close(&mut self, code: u16, reason: &str) {
        if let Some(mut stream) = self.stream.take() {
            let frame = CloseFrame {
                code: CloseCode::from(code),
                reason: Cow::Owned(reason.to_string()),
            };
            if let Err(e) = stream.close(Some(frame)).await {
                debug!(url = %self.url, code, error = %e, "websocket close failed");
            }
        }
    }
}

impl std::fmt::Debug for WsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAdapter")
            .field("url", &self.url)
            .field("open", &self.stream.is_some())
            .finish()
    }
}
