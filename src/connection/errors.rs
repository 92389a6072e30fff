//! Error taxonomy for the connection layer
//!
//! Errors split along one line that matters operationally: whether retrying
//! the same call against another roster node could possibly succeed.
//! Transport faults and timeouts are node-local and retryable; unregistered
//! types, codec failures and configuration mistakes are local usage errors
//! and never retried.

use crate::codec::CodecError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The outbound or expected-reply type has no registered codec. Fails
    /// before any I/O.
    #[error("message \"{0}\" is not registered")]
    TypeNotRegistered(&'static str),

    /// Local encode failure, or decode failure of a received reply.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Open or send failure, abnormal close, or an adapter-reported error.
    #[error("transport error: {0}")]
    Transport(String),

    /// No reply within the configured window.
    #[error("timeout reached after {0:?}")]
    Timeout(Duration),

    /// Every attempted roster node failed. Carries one message per failed
    /// node so operators can see which nodes were tried and why.
    #[error("send fails with errors: [{}]", .0.join("; "))]
    AllNodesFailed(Vec<String>),

    /// Invalid construction input, e.g. an empty roster for a leader-pinned
    /// connection.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ConnectionError {
    /// Whether advancing to another roster node could succeed where this
    /// attempt failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::TypeNotRegistered(_)
            | Self::Codec(_)
            | Self::AllNodesFailed(_)
            | Self::Configuration(_) => false,
        }
    }

    /// Error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::TypeNotRegistered(_) => "registry",
            Self::Codec(_) => "codec",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::AllNodesFailed(_) => "failover",
            Self::Configuration(_) => "config",
        }
    }
}
