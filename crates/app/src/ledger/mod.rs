//! The ledger: durable record tables behind a transactional handle.
//!
//! Every service operation runs inside a [`LedgerTx`]. A transaction works
//! on a private copy of the tables while holding the store's write lock;
//! [`LedgerTx::commit`] swaps the copy in, and dropping the transaction
//! without committing discards every staged write. Multi-record mutations
//! are therefore all-or-nothing, and a partially applied swap or combo sale
//! is never observable.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub(crate) mod state;

use state::LedgerState;

/// Errors surfaced by the record tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// A conditional write found the record in a different state than the
    /// condition required; the caller lost a claim race.
    #[error("record state changed since it was read")]
    Conflict,
}

/// Handle to the shared record store.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    inner: Arc<Mutex<LedgerState>>,
}

impl Ledger {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a transaction, serializing against all other writers.
    pub async fn begin(&self) -> LedgerTx {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let work = guard.clone();

        LedgerTx { guard, work }
    }
}

/// An open transaction over the record tables.
#[derive(Debug)]
pub struct LedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    work: LedgerState,
}

impl LedgerTx {
    /// The staged table state, reads included.
    pub(crate) fn records(&self) -> &LedgerState {
        &self.work
    }

    /// Mutable access to the staged tables.
    pub(crate) fn records_mut(&mut self) -> &mut LedgerState {
        &mut self.work
    }

    /// Publishes every staged write atomically.
    pub fn commit(self) {
        let Self { mut guard, work } = self;

        *guard = work;
    }
}
