//! Record tables.

use rustc_hash::FxHashMap;

use crate::{
    domain::{
        clients::records::ClientRecord,
        inventory::records::{AccountRecord, AccountUuid, SlotRecord, SlotUuid},
        sales::records::{PeriodRecord, PeriodUuid},
    },
    ids::Phone,
};

/// The four entity tables, keyed by their typed ids.
#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerState {
    pub(crate) accounts: FxHashMap<AccountUuid, AccountRecord>,
    pub(crate) slots: FxHashMap<SlotUuid, SlotRecord>,
    pub(crate) clients: FxHashMap<Phone, ClientRecord>,
    pub(crate) periods: FxHashMap<PeriodUuid, PeriodRecord>,
}
