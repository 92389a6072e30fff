//! The atomic client bundle and its signing step

use super::errors::TransactionError;
use super::instruction::Instruction;
use crate::ledger::LedgerClient;
use crate::signer::{Signer, SignerIdentity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// An ordered, atomic batch of instructions, produced once per send and
/// never reused.
///
/// Until [`update_counters_and_sign`](Self::update_counters_and_sign) runs,
/// the instructions carry empty authorization slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBundle {
    protocol_version: u32,
    instructions: Vec<Instruction>,
}

impl ClientBundle {
    pub fn new(protocol_version: u32, instructions: Vec<Instruction>) -> Self {
        Self {
            protocol_version,
            instructions,
        }
    }

    pub fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Fetch current signer counters from the ledger, stamp every
    /// instruction with its signers' next counter values and sign each
    /// instruction's digest with its whole group.
    ///
    /// `signer_groups` is aligned with the instructions: element `i` holds
    /// the signers required to authorize instruction `i`. A signer used by
    /// several instructions gets strictly increasing counters across them.
    pub async fn update_counters_and_sign(
        &mut self,
        client: &dyn LedgerClient,
        signer_groups: &[Vec<Arc<dyn Signer>>],
    ) -> Result<(), TransactionError> {
        if signer_groups.len() != self.instructions.len() {
            return Err(TransactionError::SignerGroups {
                expected: self.instructions.len(),
                actual: signer_groups.len(),
            });
        }

        // Distinct identities in first-use order, one counter query for all.
        let mut distinct: Vec<SignerIdentity> = Vec::new();
        for group in signer_groups {
            for signer in group {
                let identity = signer.identity();
                if !distinct.contains(&identity) {
                    distinct.push(identity);
                }
            }
        }

        let mut next: HashMap<SignerIdentity, u64> = HashMap::new();
        if !distinct.is_empty() {
            let current = client.signer_counters(&distinct).await?;
            if current.len() != distinct.len() {
                return Err(TransactionError::Counters(format!(
                    "ledger returned {} counters for {} identities",
                    current.len(),
                    distinct.len()
                )));
            }
            for (identity, counter) in distinct.iter().zip(current) {
                next.insert(*identity, counter + 1);
            }
        }

        for (instruction, group) in self.instructions.iter_mut().zip(signer_groups) {
            let identities: Vec<SignerIdentity> = group.iter().map(|s| s.identity()).collect();
            let counters: Vec<u64> = identities
                .iter()
                .map(|identity| {
                    let counter = next[identity];
                    next.insert(*identity, counter + 1);
                    counter
                })
                .collect();
            instruction.signer_identities = identities;
            instruction.signer_counters = counters;

            // Counters are part of the digest, so sign only after stamping.
            let digest = instruction.digest();
            instruction.signatures = group
                .iter()
                .map(|signer| signer.sign(&digest))
                .collect::<Result<_, _>>()?;
        }

        debug!(
            instructions = self.instructions.len(),
            signers = distinct.len(),
            "bundle counter-stamped and signed"
        );
        Ok(())
    }
}
