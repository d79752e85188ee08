//! Sales service errors.

use std::num::TryFromIntError;

use streampool::calendar::CalendarError;
use thiserror::Error;

use crate::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum AllocationServiceError {
    #[error("slot, account or billing period not found")]
    NotFound,

    #[error("slot is no longer available")]
    SlotUnavailable,

    #[error("invalid price value")]
    InvalidPrice(#[from] TryFromIntError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("a combo sale needs at least one item")]
    EmptyCombo,
}

impl From<LedgerError> for AllocationServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::NotFound => Self::NotFound,
            LedgerError::Conflict => Self::SlotUnavailable,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReleaseServiceError {
    #[error("billing period not found")]
    NotFound,

    #[error("record changed concurrently")]
    Conflict,

    #[error("date arithmetic out of range")]
    OutOfRange(#[source] jiff::Error),
}

impl From<LedgerError> for ReleaseServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::NotFound => Self::NotFound,
            LedgerError::Conflict => Self::Conflict,
        }
    }
}
