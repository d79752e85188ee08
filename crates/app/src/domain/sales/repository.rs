//! Billing periods repository.

use jiff::civil::DateTime;

use crate::{
    domain::{
        inventory::records::SlotUuid,
        sales::records::{GroupUuid, PeriodRecord, PeriodUuid},
    },
    ledger::{LedgerError, LedgerTx},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct PeriodsRepository;

impl PeriodsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn get(&self, tx: &LedgerTx, period: PeriodUuid) -> Result<PeriodRecord, LedgerError> {
        tx.records()
            .periods
            .get(&period)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    pub(crate) fn insert(&self, tx: &mut LedgerTx, record: PeriodRecord) {
        tx.records_mut().periods.insert(record.uuid, record);
    }

    pub(crate) fn remove(&self, tx: &mut LedgerTx, period: PeriodUuid) -> Result<(), LedgerError> {
        tx.records_mut()
            .periods
            .remove(&period)
            .map(|_| ())
            .ok_or(LedgerError::NotFound)
    }

    /// Every member of a combo group, in id (creation) order.
    pub(crate) fn group_members(&self, tx: &LedgerTx, group: GroupUuid) -> Vec<PeriodRecord> {
        let mut members: Vec<PeriodRecord> = tx
            .records()
            .periods
            .values()
            .filter(|p| p.group_uuid == Some(group))
            .cloned()
            .collect();

        members.sort_by_key(|p| p.uuid);

        members
    }

    /// The most recently created period referencing a slot, if any.
    pub(crate) fn latest_for_slot(&self, tx: &LedgerTx, slot: SlotUuid) -> Option<PeriodRecord> {
        tx.records()
            .periods
            .values()
            .filter(|p| p.slot_uuid == Some(slot))
            .max_by_key(|p| (p.created_at, p.uuid))
            .cloned()
    }

    pub(crate) fn set_end(
        &self,
        tx: &mut LedgerTx,
        period: PeriodUuid,
        ends_at: DateTime,
    ) -> Result<PeriodRecord, LedgerError> {
        let record = tx
            .records_mut()
            .periods
            .get_mut(&period)
            .ok_or(LedgerError::NotFound)?;

        record.ends_at = ends_at;

        Ok(record.clone())
    }

    pub(crate) fn set_slot(
        &self,
        tx: &mut LedgerTx,
        period: PeriodUuid,
        slot: SlotUuid,
    ) -> Result<PeriodRecord, LedgerError> {
        let record = tx
            .records_mut()
            .periods
            .get_mut(&period)
            .ok_or(LedgerError::NotFound)?;

        record.slot_uuid = Some(slot);

        Ok(record.clone())
    }

    /// Every period, in id (creation) order.
    pub(crate) fn all(&self, tx: &LedgerTx) -> Vec<PeriodRecord> {
        let mut periods: Vec<PeriodRecord> = tx.records().periods.values().cloned().collect();

        periods.sort_by_key(|p| p.uuid);

        periods
    }
}
