//! Roster of candidate ledger nodes
//!
//! A roster is an ordered list of node addresses read from configuration.
//! The order is meaningful: it defines the failover attempt order, and the
//! first entry is the designated leader.

use serde::{Deserialize, Serialize};
use std::fmt;

/// WebSocket address of a single ledger node, e.g. `ws://host:port`.
///
/// Opaque to this layer: it is only ever used as the base of a connection
/// path and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

/// Ordered list of equivalent ledger nodes.
///
/// Read-only from the connection layer's perspective. Emptiness is not
/// rejected here but at the places that need a node to exist: leader-pinned
/// connections refuse an empty roster, and configuration loading validates
/// the endpoint list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    addresses: Vec<NodeAddress>,
}

impl Roster {
    pub fn new(addresses: Vec<NodeAddress>) -> Self {
        Self { addresses }
    }

    /// All node addresses in failover order.
    pub fn addresses(&self) -> &[NodeAddress] {
        &self.addresses
    }

    /// The designated leader: the first node of the roster.
    pub fn leader(&self) -> Option<&NodeAddress> {
        self.addresses.first()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
