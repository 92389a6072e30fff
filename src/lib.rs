//! Client library for a replicated ledger service
//!
//! This crate is the client-side transport and transaction-assembly layer
//! for talking to a ledger replicated across a roster of nodes:
//!
//! - **Connections** carry one request/response exchange per call over a
//!   WebSocket, with a bounded wait. [`RosterConnection`] fails over across
//!   every node of the roster; [`LeaderConnection`] pins itself to the
//!   designated leader.
//! - **Transactions** batch an ordered sequence of spawn/invoke/delete
//!   instructions into one atomic bundle, stamp per-signer counters, sign
//!   each instruction and submit the result through a [`LedgerClient`].
//!
//! ```no_run
//! use roster_client::{
//!     Argument, Ed25519Signer, InstanceId, Roster, RosterLedgerClient, Signer,
//!     TransactionBuilder,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let roster = Roster::new(vec!["ws://localhost:7771".into()]);
//! let client = Arc::new(RosterLedgerClient::new(&roster)?);
//! let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
//!
//! let mut tx = TransactionBuilder::new(client);
//! tx.spawn(
//!     InstanceId::new([0u8; 32]),
//!     "coin",
//!     vec![Argument::new("amount", vec![0x27, 0x10])],
//! );
//! let (bundle, ack) = tx.send(&[vec![signer]], 0).await?;
//! # let _ = (bundle, ack);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod ledger;
pub mod messages;
pub mod roster;
pub mod signer;
pub mod transaction;

pub use codec::{CodecError, Payload};
pub use config::{Config, ConfigError};
pub use connection::{
    Connection, ConnectionError, LeaderConnection, RosterConnection, WebSocketConnection,
};
pub use ledger::{LedgerClient, RosterLedgerClient, SubmitAck, CURRENT_PROTOCOL_VERSION};
pub use roster::{NodeAddress, Roster};
pub use signer::{Ed25519Signer, Signer, SignerError, SignerIdentity};
pub use transaction::{
    Argument, ClientBundle, InstanceId, Instruction, Operation, TransactionBuilder,
    TransactionError,
};
