//! Scripted in-memory transport for connection tests
//!
//! Implements the same adapter surface as the WebSocket transport, driven
//! by a per-route script instead of a network. Routes are matched by
//! substring against the connection path, so behaviors can be keyed by node
//! address or by message type name.

// Each test binary only uses part of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use roster_client::connection::{
    ConnectionError, TransportAdapter, TransportEvent, TransportFactory,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Reject the open call.
    FailOpen,
    /// Open, then deliver one reply message.
    Reply(Vec<u8>),
    /// Open, accept the send, never deliver an event.
    Silent,
    /// Open, fail the send, then deliver an abnormal close.
    FailSend,
    /// Open, then deliver a close with this code.
    Close(u16, &'static str),
    /// Open, then deliver an adapter error event.
    ErrorEvent(&'static str),
}

/// Everything the scripted transport observed, shared across adapters.
#[derive(Debug, Default)]
pub struct Recorder {
    pub opens: AtomicUsize,
    pub closes: Mutex<Vec<u16>>,
    pub paths: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl Recorder {
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn close_codes(&self) -> Vec<u16> {
        self.closes.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

pub struct ScriptedFactory {
    routes: Vec<(String, Behavior)>,
    pub recorder: Arc<Recorder>,
}

impl ScriptedFactory {
    /// Routes are tried in order; the first whose key is a substring of the
    /// connection path wins. Unmatched paths stay silent.
    pub fn new(routes: Vec<(&str, Behavior)>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(key, behavior)| (key.to_string(), behavior))
                .collect(),
            recorder: Arc::new(Recorder::default()),
        }
    }
}

impl TransportFactory for ScriptedFactory {
    fn adapter(&self, path: &str) -> Box<dyn TransportAdapter> {
        self.recorder.paths.lock().unwrap().push(path.to_string());
        let behavior = self
            .routes
            .iter()
            .find(|(key, _)| path.contains(key.as_str()))
            .map(|(_, behavior)| behavior.clone())
            .unwrap_or(Behavior::Silent);
        Box::new(ScriptedAdapter {
            behavior,
            recorder: Arc::clone(&self.recorder),
            delivered: false,
        })
    }
}

struct ScriptedAdapter {
    behavior: Behavior,
    recorder: Arc<Recorder>,
    delivered: bool,
}

#[async_trait]
impl TransportAdapter for ScriptedAdapter {
    async fn open(&mut self) -> Result<(), ConnectionError> {
        self.recorder.opens.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::FailOpen => Err(ConnectionError::Transport(
                "connection refused".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), ConnectionError> {
        self.recorder.sent.lock().unwrap().push(bytes);
        match self.behavior {
            Behavior::FailSend => Err(ConnectionError::Transport("write failed".to_string())),
            _ => Ok(()),
        }
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.delivered {
            std::future::pending::<()>().await;
        }
        self.delivered = true;
        match self.behavior.clone() {
            Behavior::Reply(bytes) => Some(TransportEvent::Message(bytes)),
            Behavior::FailSend => Some(TransportEvent::Closed {
                code: 1006,
                reason: "write failed".to_string(),
            }),
            Behavior::Close(code, reason) => Some(TransportEvent::Closed {
                code,
                reason: reason.to_string(),
            }),
            Behavior::ErrorEvent(message) => Some(TransportEvent::Error(message.to_string())),
            Behavior::Silent => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Behavior::FailOpen => None,
        }
    }

    async fn close(&mut self, code: u16, _reason: &str) {
        self.recorder.closes.lock().unwrap().push(code);
    }
}

/// A payload type that is deliberately never registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnregisteredPing {
    pub seq: u32,
}

impl roster_client::Payload for UnregisteredPing {
    fn type_name() -> &'static str {
        "test.UnregisteredPing"
    }
}
