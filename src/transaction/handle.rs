use super::{TransactionId, TxToken};
use crate::core::Result;
use crate::storage::MemoryStore;
use std::sync::Arc;
use tracing::warn;

/// Scope guard for a write transaction on a [`MemoryStore`].
///
/// Mutating list operations take the [`TxToken`] returned by
/// [`token`](Self::token). Dropping the guard without committing rolls the
/// transaction back.
#[derive(Debug)]
pub struct WriteTransaction {
    store: Arc<MemoryStore>,
    token: TxToken,
    finished: bool,
}

impl WriteTransaction {
    pub(crate) fn new(store: Arc<MemoryStore>, token: TxToken) -> Self {
        Self {
            store,
            token,
            finished: false,
        }
    }

    pub fn token(&self) -> TxToken {
        self.token
    }

    pub fn id(&self) -> TransactionId {
        self.token.transaction()
    }

    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.store.commit_transaction(self.token)
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.store.rollback_transaction(self.token)
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        // A closed store has already rolled back
        if self.finished || self.store.is_closed() {
            return;
        }
        warn!(transaction = %self.id(), "write transaction dropped without commit, rolling back");
        if let Err(err) = self.store.rollback_transaction(self.token) {
            warn!(transaction = %self.id(), error = %err, "implicit rollback failed");
        }
    }
}
