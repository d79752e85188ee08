//! Swap service errors.

use streampool::states::TransitionError;
use thiserror::Error;

use crate::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum SwapServiceError {
    #[error("slot or account not found")]
    NotFound,

    #[error("record changed concurrently")]
    Conflict,

    #[error("no free slot of the same service to swap to")]
    NoStock,

    #[error("need {needed} free slots on other accounts, found {available}")]
    InsufficientStock { needed: usize, available: usize },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<LedgerError> for SwapServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::NotFound => Self::NotFound,
            LedgerError::Conflict => Self::Conflict,
        }
    }
}
