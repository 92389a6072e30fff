//! Transaction assembly: instructions, bundles and the builder
//!
//! The builder accumulates spawn/invoke/delete instructions in order, then
//! one `send` drains them into an immutable [`ClientBundle`], stamps
//! per-signer counters, signs every instruction and submits the result
//! through the injected ledger client.

pub mod builder;
pub mod bundle;
pub mod errors;
pub mod instruction;

pub use builder::TransactionBuilder;
pub use bundle::ClientBundle;
pub use errors::TransactionError;
pub use instruction::{Argument, InstanceId, Instruction, Operation};
