//! Transaction builder: ordered instruction accumulation and atomic send

use super::bundle::ClientBundle;
use super::errors::TransactionError;
use super::instruction::{Argument, InstanceId, Instruction};
use crate::ledger::{LedgerClient, SubmitAck};
use crate::signer::Signer;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Accumulates instructions and submits them as one atomic bundle.
///
/// The pending buffer is exclusively owned by the builder; appending is the
/// only mutation before a send, and a send drains the buffer exactly once.
/// Instructions pushed afterwards belong to a fresh buffer, whether the
/// send succeeded or not.
pub struct TransactionBuilder {
    client: Arc<dyn LedgerClient>,
    pending: Vec<Instruction>,
}

impl TransactionBuilder {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            client,
            pending: Vec::new(),
        }
    }

    /// Append an instruction at the tail.
    pub fn push(&mut self, instruction: Instruction) -> &Instruction {
        self.pending.push(instruction);
        self.pending.last().expect("just pushed")
    }

    /// Prepend an instruction at the head, ahead of everything appended so
    /// far.
    pub fn unshift(&mut self, instruction: Instruction) -> &Instruction {
        self.pending.insert(0, instruction);
        &self.pending[0]
    }

    /// Append a spawn of `contract_id` targeting `target`.
    pub fn spawn(
        &mut self,
        target: InstanceId,
        contract_id: impl Into<String>,
        args: Vec<Argument>,
    ) -> &Instruction {
        self.push(Instruction::spawn(target, contract_id, args))
    }

    /// Append an invoke of `command` on `contract_id` targeting `target`.
    pub fn invoke(
        &mut self,
        target: InstanceId,
        contract_id: impl Into<String>,
        command: impl Into<String>,
        args: Vec<Argument>,
    ) -> &Instruction {
        self.push(Instruction::invoke(target, contract_id, command, args))
    }

    /// Append a delete of `target`.
    pub fn delete(&mut self, target: InstanceId, contract_id: impl Into<String>) -> &Instruction {
        self.push(Instruction::delete(target, contract_id))
    }

    /// The instructions currently pending, in submission order.
    pub fn pending(&self) -> &[Instruction] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the pending buffer into a signed bundle and submit it.
    ///
    /// `signer_groups` is aligned with the pending instructions; each
    /// element holds the signers required to authorize that instruction.
    /// `wait_rounds` is how many confirmation rounds to wait for the bundle
    /// to be acknowledged as committed; 0 means fire-and-forget.
    ///
    /// On failure the buffer is already drained: the pending instructions
    /// are lost and must be reissued before retrying.
    pub async fn send(
        &mut self,
        signer_groups: &[Vec<Arc<dyn Signer>>],
        wait_rounds: u32,
    ) -> Result<(ClientBundle, SubmitAck), TransactionError> {
        let drained = std::mem::take(&mut self.pending);
        let mut bundle = ClientBundle::new(self.client.protocol_version(), drained);

        bundle
            .update_counters_and_sign(self.client.as_ref(), signer_groups)
            .await?;

        let ack = self.client.submit(&bundle, wait_rounds).await?;
        info!(
            instructions = bundle.len(),
            wait_rounds, "bundle submitted"
        );
        Ok((bundle, ack))
    }
}

/// Human-readable dump of the current pending buffer (not the last sent
/// bundle). Purely diagnostic.
impl fmt::Display for TransactionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.pending.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(
                f,
                "{i}:  {} {}: {}\n\t",
                instruction.variant_name(),
                instruction.contract_label(),
                instruction.target
            )?;
            let args: Vec<String> = instruction
                .args()
                .iter()
                .map(|arg| format!("{}: {}", arg.name, hex::encode(&arg.value)))
                .collect();
            f.write_str(&args.join("\n\t"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransactionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
