//! Ledger submission capability and its roster-backed implementation

use crate::connection::{
    Connection, ConnectionError, LeaderConnection, RosterConnection, TransportFactory, WsFactory,
};
use crate::messages::{
    self, SignerCounterRequest, SignerCounterResponse, StatusRequest, StatusResponse,
    SubmitRequest, SubmitResponse,
};
use crate::roster::Roster;
use crate::signer::SignerIdentity;
use crate::transaction::{ClientBundle, TransactionError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Protocol version this client stamps on the bundles it builds.
pub const CURRENT_PROTOCOL_VERSION: u32 = 1;

/// Service name of the ledger endpoint on every node.
pub const LEDGER_SERVICE: &str = "Ledger";

/// Opaque submission acknowledgment, returned by the ledger unmodified.
pub type SubmitAck = SubmitResponse;

/// Submission capability consumed by the transaction builder.
///
/// Ledger-side rejections (invalid counters, failed signature verification,
/// contract semantics) are opaque to the builder and simply propagated.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Protocol version new bundles are tagged with.
    fn protocol_version(&self) -> u32;

    /// Current counter per identity, aligned with the input.
    async fn signer_counters(
        &self,
        identities: &[SignerIdentity],
    ) -> Result<Vec<u64>, TransactionError>;

    /// Submit a signed bundle, waiting up to `wait_rounds` confirmation
    /// rounds for it to commit (0 = fire-and-forget).
    async fn submit(
        &self,
        bundle: &ClientBundle,
        wait_rounds: u32,
    ) -> Result<SubmitAck, TransactionError>;
}

/// Ledger client over a roster of nodes.
///
/// Reads and fire-and-forget submissions fail over across the whole roster;
/// a submission that waits for confirmation goes to the leader only, since
/// only the proposing node can report the commit round.
pub struct RosterLedgerClient {
    connection: RosterConnection,
    leader: LeaderConnection,
}

impl RosterLedgerClient {
    pub fn new(roster: &Roster) -> Result<Self, ConnectionError> {
        Self::with_factory(roster, Arc::new(WsFactory))
    }

    pub fn with_factory(
        roster: &Roster,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self, ConnectionError> {
        messages::register_all();
        Ok(Self {
            connection: RosterConnection::with_factory(roster, LEDGER_SERVICE, Arc::clone(&factory)),
            leader: LeaderConnection::with_factory(roster, LEDGER_SERVICE, factory)?,
        })
    }

    /// Set the per-attempt timeout on both underlying connections.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.connection.set_timeout(timeout);
        self.leader.set_timeout(timeout);
    }

    /// Query any reachable node's status.
    pub async fn status(&self) -> Result<StatusResponse, ConnectionError> {
        self.connection.send(&StatusRequest {}).await
    }
}

#[async_trait]
impl LedgerClient for RosterLedgerClient {
    fn protocol_version(&self) -> u32 {
        CURRENT_PROTOCOL_VERSION
    }

    async fn signer_counters(
        &self,
        identities: &[SignerIdentity],
    ) -> Result<Vec<u64>, TransactionError> {
        let request = SignerCounterRequest {
            identities: identities.to_vec(),
        };
        let response: SignerCounterResponse = self.connection.send(&request).await?;
        Ok(response.counters)
    }

    async fn submit(
        &self,
        bundle: &ClientBundle,
        wait_rounds: u32,
    ) -> Result<SubmitAck, TransactionError> {
        let request = SubmitRequest {
            bundle: bundle.clone(),
            wait_rounds,
        };

        let ack: SubmitResponse = if wait_rounds > 0 {
            debug!(wait_rounds, "submitting to leader and waiting");
            self.leader.send(&request).await?
        } else {
            self.connection.send(&request).await?
        };

        if let Some(error) = &ack.error {
            return Err(TransactionError::Submission(error.clone()));
        }
        Ok(ack)
    }
}

impl std::fmt::Debug for RosterLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterLedgerClient")
            .field("leader", self.leader.url())
            .finish_non_exhaustive()
    }
}
