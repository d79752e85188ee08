//! Reconciliation service errors.

use streampool::calendar::CalendarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconciliationServiceError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}
