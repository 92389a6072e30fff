//! Instructions: the state-changing operations batched into a bundle

use crate::signer::SignerIdentity;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// One named argument of an instruction.
///
/// Order-preserving inside the argument list. Names are not required to be
/// unique, though contracts conventionally expect them to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: Vec<u8>,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Identifier of the object an instruction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId([u8; 32]);

impl InstanceId {
    pub fn new(id: [u8; 32]) -> Self {
        Self(id)
    }

    /// Build an id from up to 32 bytes, left-aligned and zero-padded.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }
        let mut id = [0u8; 32];
        id[..bytes.len()].copy_from_slice(bytes);
        Some(Self(id))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// The three instruction variants, each carrying only its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a new object from a contract.
    Spawn {
        contract_id: String,
        args: Vec<Argument>,
    },
    /// Mutate an existing object through a contract command.
    Invoke {
        contract_id: String,
        command: String,
        args: Vec<Argument>,
    },
    /// Remove an object.
    Delete { contract_id: String },
}

/// One state-changing operation against a target object, plus the
/// authorization slots filled in at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub target: InstanceId,
    pub operation: Operation,

    /// Identities required to authorize this instruction, aligned with
    /// `signer_counters` and `signatures`. Empty until signing.
    #[serde(default)]
    pub signer_identities: Vec<SignerIdentity>,
    #[serde(default)]
    pub signer_counters: Vec<u64>,
    #[serde(default)]
    pub signatures: Vec<Vec<u8>>,
}

impl Instruction {
    pub fn spawn(target: InstanceId, contract_id: impl Into<String>, args: Vec<Argument>) -> Self {
        Self::unsigned(
            target,
            Operation::Spawn {
                contract_id: contract_id.into(),
                args,
            },
        )
    }

    pub fn invoke(
        target: InstanceId,
        contract_id: impl Into<String>,
        command: impl Into<String>,
        args: Vec<Argument>,
    ) -> Self {
        Self::unsigned(
            target,
            Operation::Invoke {
                contract_id: contract_id.into(),
                command: command.into(),
                args,
            },
        )
    }

    pub fn delete(target: InstanceId, contract_id: impl Into<String>) -> Self {
        Self::unsigned(
            target,
            Operation::Delete {
                contract_id: contract_id.into(),
            },
        )
    }

    fn unsigned(target: InstanceId, operation: Operation) -> Self {
        Self {
            target,
            operation,
            signer_identities: Vec::new(),
            signer_counters: Vec::new(),
            signatures: Vec::new(),
        }
    }

    /// Variant name for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match &self.operation {
            Operation::Spawn { .. } => "Spawn",
            Operation::Invoke { .. } => "Invoke",
            Operation::Delete { .. } => "Delete",
        }
    }

    /// Contract label for diagnostics: the contract id, or for an invoke the
    /// contract and command joined by " / ".
    pub fn contract_label(&self) -> String {
        match &self.operation {
            Operation::Spawn { contract_id, .. } | Operation::Delete { contract_id } => {
                contract_id.clone()
            }
            Operation::Invoke {
                contract_id,
                command,
                ..
            } => format!("{contract_id} / {command}"),
        }
    }

    /// The instruction's argument list; empty for deletes.
    pub fn args(&self) -> &[Argument] {
        match &self.operation {
            Operation::Spawn { args, .. } | Operation::Invoke { args, .. } => args,
            Operation::Delete { .. } => &[],
        }
    }

    /// Digest signed by every signer of this instruction's group.
    ///
    /// Covers the variant tag, target, contract fields, arguments and the
    /// assigned signer identities and counters, all length-prefixed, so the
    /// signature binds the counters to the operation.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        hasher.update(self.target.as_bytes());
        match &self.operation {
            Operation::Spawn { contract_id, args } => {
                hasher.update([0u8]);
                hash_str(&mut hasher, contract_id);
                hash_args(&mut hasher, args);
            }
            Operation::Invoke {
                contract_id,
                command,
                args,
            } => {
                hasher.update([1u8]);
                hash_str(&mut hasher, contract_id);
                hash_str(&mut hasher, command);
                hash_args(&mut hasher, args);
            }
            Operation::Delete { contract_id } => {
                hasher.update([2u8]);
                hash_str(&mut hasher, contract_id);
            }
        }

        hasher.update((self.signer_identities.len() as u64).to_le_bytes());
        for identity in &self.signer_identities {
            hasher.update(identity.as_bytes());
        }
        for counter in &self.signer_counters {
            hasher.update(counter.to_le_bytes());
        }

        hasher.finalize().into()
    }
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_args(hasher: &mut Sha256, args: &[Argument]) {
    hasher.update((args.len() as u64).to_le_bytes());
    for arg in args {
        hash_str(hasher, &arg.name);
        hasher.update((arg.value.len() as u64).to_le_bytes());
        hasher.update(&arg.value);
    }
}
