//! Inventory Records

use jiff::{Timestamp, civil::Date};
use streampool::states::SlotState;

use crate::ids::TypedUuid;

/// Account UUID
pub type AccountUuid = TypedUuid<AccountRecord>;

/// A shared credential (one streaming login) that yields a fixed number of
/// slots. Its technical end of life is `activation_date` advanced by
/// `duration_months` calendar months.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub uuid: AccountUuid,
    pub service: String,
    pub email: String,
    pub password: String,
    pub activation_date: Date,
    pub duration_months: i32,
    /// Single-cycle account: the technical end is a hard cutoff.
    pub disposable: bool,
    /// Day-of-month the operator must pay the supplier, when tracked.
    pub provider_due_day: Option<i8>,
    pub supplier: Option<String>,
    pub created_at: Timestamp,
}

/// Slot UUID
pub type SlotUuid = TypedUuid<SlotRecord>;

/// One allocatable unit inside an account.
#[derive(Debug, Clone)]
pub struct SlotRecord {
    pub uuid: SlotUuid,
    pub account_uuid: AccountUuid,
    pub label: String,
    pub pin: Option<String>,
    pub state: SlotState,
    pub created_at: Timestamp,
}

/// An account together with its slots, for inventory listings.
#[derive(Debug, Clone)]
pub struct AccountOverview {
    pub account: AccountRecord,
    pub slots: Vec<SlotRecord>,
}
