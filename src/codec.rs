//! Schema-driven binary codec with a registered type name per message
//!
//! Every message exchanged with a node carries a fully qualified type name
//! (e.g. `ledger.StatusRequest`). A process-level registry records which
//! type names are known; sending or expecting an unregistered type is a
//! local usage error, not a network fault, and must fail before any I/O.
//!
//! Encoding is bincode over serde. Decode failures split in two: a
//! truncated or overrun frame is a protocol-level parse error (the peer sent
//! a malformed frame), anything else is a local decode error.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// A message payload with a registered wire type name.
///
/// The name is fully qualified with a namespace prefix; only its short form
/// (the last dot-separated segment) appears in connection paths.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fully qualified type name, e.g. `"ledger.SubmitRequest"`.
    fn type_name() -> &'static str;
}

static REGISTRY: Lazy<RwLock<HashSet<&'static str>>> = Lazy::new(|| RwLock::new(HashSet::new()));

/// Register a payload type so it may be sent and received.
///
/// Registration is idempotent and cheap; clients register their whole
/// message set once at construction.
pub fn register<P: Payload>() {
    REGISTRY.write().insert(P::type_name());
}

/// Whether a type name has been registered.
pub fn is_registered(name: &str) -> bool {
    REGISTRY.read().contains(name)
}

/// Strip the namespace prefix from a fully qualified type name:
/// `"ledger.StatusRequest"` becomes `"StatusRequest"`.
pub fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Codec failure, split by where the fault lies.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Local serialization failure; never the peer's fault.
    #[error("failed to encode \"{type_name}\": {source}")]
    Encode {
        type_name: &'static str,
        source: bincode::Error,
    },

    /// Local decode failure on an otherwise well-framed payload.
    #[error("error when trying to decode the message \"{type_name}\": {source}")]
    Decode {
        type_name: &'static str,
        source: bincode::Error,
    },

    /// Protocol-level parse failure: the frame ended early or overran its
    /// declared size. Surfaced distinctly so callers can tell
    /// malformed-from-peer apart from malformed-locally.
    #[error("truncated frame while decoding \"{type_name}\": {source}")]
    Truncated {
        type_name: &'static str,
        source: bincode::Error,
    },
}

/// Encode a payload to wire bytes.
pub fn encode<P: Payload>(value: &P) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|source| CodecError::Encode {
        type_name: P::type_name(),
        source,
    })
}

/// Decode wire bytes as the expected payload type.
pub fn decode<P: Payload>(bytes: &[u8]) -> Result<P, CodecError> {
    bincode::deserialize(bytes).map_err(|source| match &*source {
        bincode::ErrorKind::Io(_) | bincode::ErrorKind::SizeLimit => CodecError::Truncated {
            type_name: P::type_name(),
            source,
        },
        _ => CodecError::Decode {
            type_name: P::type_name(),
            source,
        },
    })
}

impl CodecError {
    /// Whether the failure came from the peer's frame rather than local use.
    pub fn is_protocol_level(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }

    /// The type name the codec was working on when it failed.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Encode { type_name, .. }
            | Self::Decode { type_name, .. }
            | Self::Truncated { type_name, .. } => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Probe {
        seq: u64,
        label: String,
    }

    impl Payload for Probe {
        fn type_name() -> &'static str {
            "test.Probe"
        }
    }

    #[test]
    fn registration_is_checked_by_name() {
        assert!(!is_registered("test.NeverRegistered"));
        register::<Probe>();
        assert!(is_registered("test.Probe"));
    }

    #[test]
    fn short_name_strips_namespace() {
        assert_eq!(short_name("ledger.StatusRequest"), "StatusRequest");
        assert_eq!(short_name("a.b.SubmitRequest"), "SubmitRequest");
        assert_eq!(short_name("Bare"), "Bare");
    }

    #[test]
    fn round_trip_preserves_value() {
        let value = Probe {
            seq: 42,
            label: "hello".to_string(),
        };
        let bytes = encode(&value).unwrap();
        let back: Probe = decode(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn truncated_frame_is_protocol_level() {
        let value = Probe {
            seq: 7,
            label: "truncate me".to_string(),
        };
        let bytes = encode(&value).unwrap();
        let err = decode::<Probe>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(err.is_protocol_level());
        assert_eq!(err.type_name(), "test.Probe");
    }
}
