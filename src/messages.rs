//! Registered protocol messages exchanged with ledger nodes
//!
//! Each payload carries a fully qualified type name under the `ledger.`
//! namespace; the short form is the final segment of the connection path.
//! [`register_all`] is called by client construction, so every message here
//! is known to the codec before the first exchange.

use crate::codec::{self, Payload};
use crate::signer::SignerIdentity;
use crate::transaction::ClientBundle;
use serde::{Deserialize, Serialize};

/// Ask a node for its status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Protocol version the node speaks.
    pub protocol_version: u32,
    /// The node's own address as it advertises it.
    pub node: String,
}

/// Ask for the current counters of a set of signer identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerCounterRequest {
    pub identities: Vec<SignerIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerCounterResponse {
    /// Current counter per requested identity, aligned by position.
    pub counters: Vec<u64>,
}

/// Submit a signed bundle for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub bundle: ClientBundle,
    /// Confirmation rounds to wait before replying; 0 = acknowledge receipt
    /// only.
    pub wait_rounds: u32,
}

/// Acknowledgment of a submission, passed through to callers unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Consensus round the bundle was accepted into, if the node waited.
    pub round: u64,
    /// Ledger-side rejection, verbatim.
    pub error: Option<String>,
}

impl Payload for StatusRequest {
    fn type_name() -> &'static str {
        "ledger.StatusRequest"
    }
}

impl Payload for StatusResponse {
    fn type_name() -> &'static str {
        "ledger.StatusResponse"
    }
}

impl Payload for SignerCounterRequest {
    fn type_name() -> &'static str {
        "ledger.SignerCounterRequest"
    }
}

impl Payload for SignerCounterResponse {
    fn type_name() -> &'static str {
        "ledger.SignerCounterResponse"
    }
}

impl Payload for SubmitRequest {
    fn type_name() -> &'static str {
        "ledger.SubmitRequest"
    }
}

impl Payload for SubmitResponse {
    fn type_name() -> &'static str {
        "ledger.SubmitResponse"
    }
}

/// Register every ledger message with the codec. Idempotent.
pub fn register_all() {
    codec::register::<StatusRequest>();
    codec::register::<StatusResponse>();
    codec::register::<SignerCounterRequest>();
    codec::register::<SignerCounterResponse>();
    codec::register::<SubmitRequest>();
    codec::register::<SubmitResponse>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_messages_are_registered() {
        register_all();
        for name in [
            "ledger.StatusRequest",
            "ledger.StatusResponse",
            "ledger.SignerCounterRequest",
            "ledger.SignerCounterResponse",
            "ledger.SubmitRequest",
            "ledger.SubmitResponse",
        ] {
            assert!(codec::is_registered(name), "{name} missing");
        }
    }

    #[test]
    fn submit_request_round_trips() {
        register_all();
        let req = SubmitRequest {
            bundle: ClientBundle::new(1, vec![]),
            wait_rounds: 5,
        };
        let bytes = codec::encode(&req).unwrap();
        assert_eq!(codec::decode::<SubmitRequest>(&bytes).unwrap(), req);
    }
}
