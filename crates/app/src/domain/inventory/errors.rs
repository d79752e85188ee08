//! Inventory service errors.

use streampool::{calendar::CalendarError, states::TransitionError};
use thiserror::Error;

use crate::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum InventoryServiceError {
    #[error("account or slot not found")]
    NotFound,

    #[error("record changed concurrently")]
    Conflict,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("an account needs at least one slot")]
    NoSlots,

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl From<LedgerError> for InventoryServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::NotFound => Self::NotFound,
            LedgerError::Conflict => Self::Conflict,
        }
    }
}
