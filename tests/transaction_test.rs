//! Transaction builder behavior against a scripted ledger

mod common;

use async_trait::async_trait;
use common::{Behavior, ScriptedFactory};
use ed25519_dalek::{Signature, Verifier};
use roster_client::codec;
use roster_client::ledger::SubmitAck;
use roster_client::messages::{SignerCounterResponse, SubmitResponse};
use roster_client::transaction::Operation;
use roster_client::{
    Argument, ClientBundle, Ed25519Signer, InstanceId, Instruction, LedgerClient, NodeAddress,
    Roster, RosterLedgerClient, Signer, SignerIdentity, TransactionBuilder, TransactionError,
};
use std::sync::{Arc, Mutex};

/// Scripted ledger client: serves counters from a fixed base and records
/// every submitted bundle.
#[derive(Debug, Default)]
struct ScriptedLedger {
    base_counter: u64,
    fail_counters: bool,
    reject_with: Option<String>,
    submitted: Mutex<Vec<(ClientBundle, u32)>>,
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    fn protocol_version(&self) -> u32 {
        7
    }

    async fn signer_counters(
        &self,
        identities: &[SignerIdentity],
    ) -> Result<Vec<u64>, TransactionError> {
        if self.fail_counters {
            return Err(TransactionError::Counters("node busy".to_string()));
        }
        Ok(vec![self.base_counter; identities.len()])
    }

    async fn submit(
        &self,
        bundle: &ClientBundle,
        wait_rounds: u32,
    ) -> Result<SubmitAck, TransactionError> {
        self.submitted
            .lock()
            .unwrap()
            .push((bundle.clone(), wait_rounds));
        if let Some(error) = &self.reject_with {
            return Err(TransactionError::Submission(error.clone()));
        }
        Ok(SubmitAck {
            round: 9,
            error: None,
        })
    }
}

fn target(byte: u8) -> InstanceId {
    InstanceId::from_slice(&[byte]).unwrap()
}

fn groups_of(signer: &Arc<dyn Signer>, n: usize) -> Vec<Vec<Arc<dyn Signer>>> {
    (0..n).map(|_| vec![Arc::clone(signer)]).collect()
}

#[tokio::test]
async fn bundle_preserves_append_order_with_unshift_first() {
    let ledger = Arc::new(ScriptedLedger::default());
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![Argument::new("amount", vec![1])]);
    tx.invoke(target(2), "coin", "transfer", vec![]);
    tx.push(Instruction::delete(target(3), "coin"));
    tx.unshift(Instruction::spawn(target(0), "config", vec![]));

    let (bundle, ack) = tx.send(&groups_of(&signer, 4), 0).await.unwrap();

    assert_eq!(ack.round, 9);
    assert_eq!(bundle.protocol_version(), 7);
    let labels: Vec<String> = bundle
        .instructions()
        .iter()
        .map(|i| format!("{} {}", i.variant_name(), i.contract_label()))
        .collect();
    assert_eq!(
        labels,
        vec![
            "Spawn config",
            "Spawn coin",
            "Invoke coin / transfer",
            "Delete coin"
        ]
    );
}

#[tokio::test]
async fn send_drains_the_buffer_exactly_once() {
    let ledger = Arc::new(ScriptedLedger::default());
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![]);
    let (first, _) = tx.send(&groups_of(&signer, 1), 0).await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(tx.is_empty());

    // A new instruction starts a fresh buffer; the old one is not resent.
    tx.delete(target(2), "coin");
    let (second, _) = tx.send(&groups_of(&signer, 1), 0).await.unwrap();
    assert_eq!(second.len(), 1);
    assert!(matches!(
        second.instructions()[0].operation,
        Operation::Delete { .. }
    ));
}

#[tokio::test]
async fn counters_increase_strictly_for_a_reused_signer() {
    let ledger = Arc::new(ScriptedLedger {
        base_counter: 10,
        ..Default::default()
    });
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    for i in 0..3 {
        tx.invoke(target(i), "coin", "mint", vec![]);
    }

    let (bundle, _) = tx.send(&groups_of(&signer, 3), 0).await.unwrap();

    let counters: Vec<u64> = bundle
        .instructions()
        .iter()
        .map(|i| i.signer_counters[0])
        .collect();
    assert_eq!(counters, vec![11, 12, 13]);
    assert!(bundle
        .instructions()
        .iter()
        .all(|i| i.signer_identities == vec![signer.identity()]));
}

#[tokio::test]
async fn signatures_verify_against_instruction_digests() {
    let ledger = Arc::new(ScriptedLedger::default());
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![Argument::new("amount", vec![0x27, 0x10])]);
    tx.delete(target(1), "coin");

    let (bundle, _) = tx.send(&groups_of(&signer, 2), 0).await.unwrap();

    let key = signer.identity().verifying_key().unwrap();
    for instruction in bundle.instructions() {
        let signature = Signature::from_slice(&instruction.signatures[0]).unwrap();
        key.verify(&instruction.digest(), &signature).unwrap();
    }
}

#[tokio::test]
async fn mismatched_signer_groups_abort_before_submission() {
    let ledger = Arc::new(ScriptedLedger::default());
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![]);
    tx.delete(target(2), "coin");

    let err = tx.send(&groups_of(&signer, 1), 0).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::SignerGroups {
            expected: 2,
            actual: 1
        }
    ));
    assert!(ledger.submitted.lock().unwrap().is_empty());
    // The buffer is gone either way; retrying requires reissuing.
    assert!(tx.is_empty());
}

#[tokio::test]
async fn counter_failure_aborts_before_submission() {
    let ledger = Arc::new(ScriptedLedger {
        fail_counters: true,
        ..Default::default()
    });
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![]);
    let err = tx.send(&groups_of(&signer, 1), 0).await.unwrap_err();

    assert!(matches!(err, TransactionError::Counters(_)));
    assert!(ledger.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ledger_rejection_is_passed_through() {
    let ledger = Arc::new(ScriptedLedger {
        reject_with: Some("instruction 0: invalid counters".to_string()),
        ..Default::default()
    });
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![]);
    let err = tx.send(&groups_of(&signer, 1), 0).await.unwrap_err();

    match err {
        TransactionError::Submission(msg) => assert!(msg.contains("invalid counters")),
        other => panic!("expected submission rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_rounds_are_forwarded_to_the_ledger() {
    let ledger = Arc::new(ScriptedLedger::default());
    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());
    let mut tx = TransactionBuilder::new(Arc::clone(&ledger) as Arc<dyn LedgerClient>);

    tx.spawn(target(1), "coin", vec![]);
    tx.send(&groups_of(&signer, 1), 5).await.unwrap();

    assert_eq!(ledger.submitted.lock().unwrap()[0].1, 5);
}

fn counter_reply(counters: Vec<u64>) -> Vec<u8> {
    codec::encode(&SignerCounterResponse { counters }).unwrap()
}

fn submit_reply() -> Vec<u8> {
    codec::encode(&SubmitResponse {
        round: 3,
        error: None,
    })
    .unwrap()
}

#[tokio::test]
async fn roster_ledger_client_submits_end_to_end() {
    // Leader (node-a) is down: a fire-and-forget submission still goes
    // through via failover, while a waited submission is leader-only and
    // fails.
    let roster = Roster::new(vec![
        NodeAddress::from("ws://node-a:7771"),
        NodeAddress::from("ws://node-b:7771"),
    ]);
    let make_client = || {
        let factory = ScriptedFactory::new(vec![
            ("node-a", Behavior::FailOpen),
            ("SignerCounterRequest", Behavior::Reply(counter_reply(vec![0]))),
            ("SubmitRequest", Behavior::Reply(submit_reply())),
        ]);
        RosterLedgerClient::with_factory(&roster, Arc::new(factory)).unwrap()
    };

    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::generate());

    let client: Arc<dyn LedgerClient> = Arc::new(make_client());
    let mut tx = TransactionBuilder::new(Arc::clone(&client));
    tx.spawn(target(1), "coin", vec![Argument::new("amount", vec![1])]);
    let (bundle, ack) = tx.send(&groups_of(&signer, 1), 0).await.unwrap();
    assert_eq!(ack.round, 3);
    assert_eq!(bundle.instructions()[0].signer_counters, vec![1]);

    let client: Arc<dyn LedgerClient> = Arc::new(make_client());
    let mut tx = TransactionBuilder::new(Arc::clone(&client));
    tx.spawn(target(1), "coin", vec![]);
    let err = tx.send(&groups_of(&signer, 1), 2).await.unwrap_err();
    assert!(matches!(err, TransactionError::Connection(_)));
}
