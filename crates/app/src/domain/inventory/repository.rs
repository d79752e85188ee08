//! Accounts and slots repositories.

use streampool::states::SlotState;

use crate::{
    domain::inventory::records::{AccountRecord, AccountUuid, SlotRecord, SlotUuid},
    ledger::{LedgerError, LedgerTx},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct AccountsRepository;

impl AccountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn get(
        &self,
        tx: &LedgerTx,
        account: AccountUuid,
    ) -> Result<AccountRecord, LedgerError> {
        tx.records()
            .accounts
            .get(&account)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    pub(crate) fn insert(&self, tx: &mut LedgerTx, record: AccountRecord) {
        tx.records_mut().accounts.insert(record.uuid, record);
    }

    /// Overwrites an existing account record.
    pub(crate) fn save(&self, tx: &mut LedgerTx, record: AccountRecord) -> Result<(), LedgerError> {
        let stored = tx
            .records_mut()
            .accounts
            .get_mut(&record.uuid)
            .ok_or(LedgerError::NotFound)?;

        *stored = record;

        Ok(())
    }

    pub(crate) fn remove(&self, tx: &mut LedgerTx, account: AccountUuid) -> Result<(), LedgerError> {
        tx.records_mut()
            .accounts
            .remove(&account)
            .map(|_| ())
            .ok_or(LedgerError::NotFound)
    }

    /// Every account, in id (creation) order.
    pub(crate) fn all(&self, tx: &LedgerTx) -> Vec<AccountRecord> {
        let mut accounts: Vec<AccountRecord> = tx.records().accounts.values().cloned().collect();

        accounts.sort_by_key(|a| a.uuid);

        accounts
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SlotsRepository;

impl SlotsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn get(&self, tx: &LedgerTx, slot: SlotUuid) -> Result<SlotRecord, LedgerError> {
        tx.records()
            .slots
            .get(&slot)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    pub(crate) fn insert(&self, tx: &mut LedgerTx, record: SlotRecord) {
        tx.records_mut().slots.insert(record.uuid, record);
    }

    pub(crate) fn set_state(
        &self,
        tx: &mut LedgerTx,
        slot: SlotUuid,
        state: SlotState,
    ) -> Result<SlotRecord, LedgerError> {
        let record = tx
            .records_mut()
            .slots
            .get_mut(&slot)
            .ok_or(LedgerError::NotFound)?;

        record.state = state;

        Ok(record.clone())
    }

    pub(crate) fn set_pin(
        &self,
        tx: &mut LedgerTx,
        slot: SlotUuid,
        pin: Option<String>,
    ) -> Result<(), LedgerError> {
        let record = tx
            .records_mut()
            .slots
            .get_mut(&slot)
            .ok_or(LedgerError::NotFound)?;

        record.pin = pin;

        Ok(())
    }

    /// Claims a slot for a sale: the write succeeds only if the slot is
    /// still `AVAILABLE` when it happens, otherwise the claimant lost the
    /// race and gets [`LedgerError::Conflict`].
    pub(crate) fn claim(&self, tx: &mut LedgerTx, slot: SlotUuid) -> Result<SlotRecord, LedgerError> {
        let record = tx
            .records_mut()
            .slots
            .get_mut(&slot)
            .ok_or(LedgerError::NotFound)?;

        record.state = record
            .state
            .allocated()
            .map_err(|_| LedgerError::Conflict)?;

        Ok(record.clone())
    }

    /// A slot's stock-mates, in id (creation) order.
    pub(crate) fn for_account(&self, tx: &LedgerTx, account: AccountUuid) -> Vec<SlotRecord> {
        let mut slots: Vec<SlotRecord> = tx
            .records()
            .slots
            .values()
            .filter(|s| s.account_uuid == account)
            .cloned()
            .collect();

        slots.sort_by_key(|s| s.uuid);

        slots
    }

    pub(crate) fn remove_for_account(&self, tx: &mut LedgerTx, account: AccountUuid) {
        tx.records_mut()
            .slots
            .retain(|_, slot| slot.account_uuid != account);
    }

    /// The oldest `AVAILABLE` slot on any account of the given service,
    /// skipping the slot being replaced.
    pub(crate) fn find_available_for_service(
        &self,
        tx: &LedgerTx,
        service: &str,
        excluding: SlotUuid,
    ) -> Option<SlotRecord> {
        let records = tx.records();

        records
            .slots
            .values()
            .filter(|slot| slot.state.is_available() && slot.uuid != excluding)
            .filter(|slot| {
                records
                    .accounts
                    .get(&slot.account_uuid)
                    .is_some_and(|account| account.service == service)
            })
            .min_by_key(|slot| slot.uuid)
            .cloned()
    }

    /// `AVAILABLE` stock for a service, across every account.
    pub(crate) fn count_available_for_service(&self, tx: &LedgerTx, service: &str) -> usize {
        let records = tx.records();

        records
            .slots
            .values()
            .filter(|slot| slot.state.is_available())
            .filter(|slot| {
                records
                    .accounts
                    .get(&slot.account_uuid)
                    .is_some_and(|account| account.service == service)
            })
            .count()
    }

    /// `AVAILABLE` stock for a service, not counting one excluded account.
    pub(crate) fn count_available_for_service_excluding(
        &self,
        tx: &LedgerTx,
        service: &str,
        excluded: AccountUuid,
    ) -> usize {
        let records = tx.records();

        records
            .slots
            .values()
            .filter(|slot| slot.state.is_available() && slot.account_uuid != excluded)
            .filter(|slot| {
                records
                    .accounts
                    .get(&slot.account_uuid)
                    .is_some_and(|account| account.service == service)
            })
            .count()
    }
}
