use super::Error;

/// Error when a session tries to start a second transaction while one is
/// still active.
#[derive(Debug)]
pub(super) struct TransactionActive;

impl std::error::Error for TransactionActive {}

impl core::fmt::Display for TransactionActive {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("a transaction is already active for this session")
    }
}

impl Error {
    /// Creates a transaction-already-active error.
    pub fn transaction_active() -> Error {
        Error::from(super::ErrorKind::TransactionActive(TransactionActive))
    }

    /// Returns `true` if this error reports an already active transaction.
    pub fn is_transaction_active(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TransactionActive(_))
    }
}
