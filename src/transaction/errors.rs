//! Error types for transaction assembly and submission

use crate::connection::ConnectionError;
use crate::signer::SignerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionError {
    /// Fetching the current signer counters from the ledger failed.
    #[error("counter fetch failed: {0}")]
    Counters(String),

    /// The signer groups do not line up with the bundle's instructions.
    #[error("signer group mismatch: {expected} instructions, {actual} groups")]
    SignerGroups { expected: usize, actual: usize },

    /// A signer could not produce a signature for its instruction.
    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    /// The ledger rejected the submitted bundle. The message is the ledger's
    /// own and is passed through unmodified.
    #[error("submission rejected: {0}")]
    Submission(String),

    /// The underlying connection failed before the ledger saw the bundle.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl TransactionError {
    /// Whether reissuing the same instructions could succeed.
    ///
    /// Note the buffer is already drained when `send` fails: the caller
    /// must rebuild the instructions before retrying either way.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Counters(_) => true,
            Self::Connection(err) => err.is_retryable(),
            Self::SignerGroups { .. } | Self::Signing(_) | Self::Submission(_) => false,
        }
    }

    /// Error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Counters(_) => "counters",
            Self::SignerGroups { .. } => "validation",
            Self::Signing(_) => "signing",
            Self::Submission(_) => "submission",
            Self::Connection(_) => "connection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_and_submission_are_terminal() {
        assert!(!TransactionError::Submission("bad counters".to_string()).is_retryable());
        assert!(!TransactionError::SignerGroups {
            expected: 2,
            actual: 1
        }
        .is_retryable());
        assert!(TransactionError::Counters("node busy".to_string()).is_retryable());
    }

    #[test]
    fn connection_errors_pass_through_retryability() {
        let err = TransactionError::from(ConnectionError::Transport("refused".to_string()));
        assert!(err.is_retryable());
        assert_eq!(err.category(), "connection");
    }
}
