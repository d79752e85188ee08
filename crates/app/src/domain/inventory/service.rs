//! Inventory service.

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date};
use mockall::automock;
use streampool::{
    calendar::{add_months, supplier_due_soon},
    states::SlotState,
};
use tracing::info;

use crate::{
    domain::inventory::{
        data::{AccountUpdate, NewAccount},
        errors::InventoryServiceError,
        records::{AccountOverview, AccountRecord, AccountUuid, SlotRecord, SlotUuid},
        repository::{AccountsRepository, SlotsRepository},
    },
    ids::TypedUuid,
    ledger::Ledger,
};

#[derive(Clone)]
pub struct LedgerInventoryService {
    ledger: Ledger,
    accounts: AccountsRepository,
    slots: SlotsRepository,
}

impl LedgerInventoryService {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            accounts: AccountsRepository::new(),
            slots: SlotsRepository::new(),
        }
    }
}

#[async_trait]
impl InventoryService for LedgerInventoryService {
    #[tracing::instrument(
        name = "inventory.service.create_account",
        skip(self, account),
        fields(service = %account.service, slot_count = account.slots.len()),
        err
    )]
    async fn create_account(
        &self,
        account: NewAccount,
    ) -> Result<AccountOverview, InventoryServiceError> {
        if account.slots.is_empty() {
            return Err(InventoryServiceError::NoSlots);
        }

        // The technical end must be computable for reconciliation.
        add_months(account.activation_date, account.duration_months)?;

        let mut tx = self.ledger.begin().await;

        let record = AccountRecord {
            uuid: TypedUuid::new(),
            service: account.service,
            email: account.email,
            password: account.password,
            activation_date: account.activation_date,
            duration_months: account.duration_months,
            disposable: account.disposable,
            provider_due_day: account.provider_due_day,
            supplier: account.supplier,
            created_at: Timestamp::now(),
        };

        self.accounts.insert(&mut tx, record.clone());

        let mut slots = Vec::with_capacity(account.slots.len());

        for slot in account.slots {
            let slot_record = SlotRecord {
                uuid: TypedUuid::new(),
                account_uuid: record.uuid,
                label: slot.label,
                pin: slot.pin,
                state: SlotState::Available,
                created_at: Timestamp::now(),
            };

            self.slots.insert(&mut tx, slot_record.clone());
            slots.push(slot_record);
        }

        tx.commit();

        info!(account_uuid = %record.uuid, "created account");

        Ok(AccountOverview {
            account: record,
            slots,
        })
    }

    #[tracing::instrument(
        name = "inventory.service.update_account",
        skip(self, update),
        fields(account_uuid = %account),
        err
    )]
    async fn update_account(
        &self,
        account: AccountUuid,
        update: AccountUpdate,
    ) -> Result<AccountRecord, InventoryServiceError> {
        let mut tx = self.ledger.begin().await;

        let mut record = self.accounts.get(&tx, account)?;

        if let Some(service) = update.service {
            record.service = service;
        }

        if let Some(email) = update.email {
            record.email = email;
        }

        if let Some(password) = update.password {
            record.password = password;
        }

        if let Some(activation_date) = update.activation_date {
            record.activation_date = activation_date;
        }

        if let Some(duration_months) = update.duration_months {
            record.duration_months = duration_months;
        }

        if let Some(disposable) = update.disposable {
            record.disposable = disposable;
        }

        if let Some(provider_due_day) = update.provider_due_day {
            record.provider_due_day = provider_due_day;
        }

        if let Some(supplier) = update.supplier {
            record.supplier = supplier;
        }

        add_months(record.activation_date, record.duration_months)?;

        self.accounts.save(&mut tx, record.clone())?;

        tx.commit();

        Ok(record)
    }

    #[tracing::instrument(
        name = "inventory.service.delete_account",
        skip(self),
        fields(account_uuid = %account),
        err
    )]
    async fn delete_account(&self, account: AccountUuid) -> Result<(), InventoryServiceError> {
        let mut tx = self.ledger.begin().await;

        // Slots only ever go away with their account, in the same batch.
        self.accounts.get(&tx, account)?;
        self.slots.remove_for_account(&mut tx, account);
        self.accounts.remove(&mut tx, account)?;

        tx.commit();

        info!(account_uuid = %account, "deleted account and its slots");

        Ok(())
    }

    #[tracing::instrument(
        name = "inventory.service.revive_slot",
        skip(self, new_pin),
        fields(slot_uuid = %slot, pin_reset = new_pin.is_some()),
        err
    )]
    async fn revive_slot(
        &self,
        slot: SlotUuid,
        new_pin: Option<String>,
    ) -> Result<SlotRecord, InventoryServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.slots.get(&tx, slot)?;
        let revived = record.state.revived()?;

        self.slots.set_state(&mut tx, slot, revived)?;

        if new_pin.is_some() {
            self.slots.set_pin(&mut tx, slot, new_pin)?;
        }

        let record = self.slots.get(&tx, slot)?;

        tx.commit();

        Ok(record)
    }

    #[tracing::instrument(
        name = "inventory.service.mark_slot_down",
        skip(self),
        fields(slot_uuid = %slot),
        err
    )]
    async fn mark_slot_down(&self, slot: SlotUuid) -> Result<SlotRecord, InventoryServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.slots.get(&tx, slot)?;
        let record = self.slots.set_state(&mut tx, slot, record.state.marked_down())?;

        tx.commit();

        Ok(record)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountOverview>, InventoryServiceError> {
        let tx = self.ledger.begin().await;

        let overviews = self
            .accounts
            .all(&tx)
            .into_iter()
            .map(|account| {
                let slots = self.slots.for_account(&tx, account.uuid);

                AccountOverview { account, slots }
            })
            .collect();

        Ok(overviews)
    }

    async fn available_stock(&self, service: &str) -> Result<usize, InventoryServiceError> {
        let tx = self.ledger.begin().await;

        Ok(self.slots.count_available_for_service(&tx, service))
    }

    async fn supplier_due_accounts(
        &self,
        today: Date,
    ) -> Result<Vec<AccountRecord>, InventoryServiceError> {
        let tx = self.ledger.begin().await;

        let due = self
            .accounts
            .all(&tx)
            .into_iter()
            .filter(|account| {
                account
                    .provider_due_day
                    .is_some_and(|day| supplier_due_soon(day, today))
            })
            .collect();

        Ok(due)
    }
}

#[automock]
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Creates an account and its slots in one batch.
    async fn create_account(
        &self,
        account: NewAccount,
    ) -> Result<AccountOverview, InventoryServiceError>;

    /// Applies a partial update to an account.
    async fn update_account(
        &self,
        account: AccountUuid,
        update: AccountUpdate,
    ) -> Result<AccountRecord, InventoryServiceError>;

    /// Deletes an account and every one of its slots in one batch.
    async fn delete_account(&self, account: AccountUuid) -> Result<(), InventoryServiceError>;

    /// Returns a quarantined or down slot to stock, optionally rotating its
    /// PIN on the way.
    async fn revive_slot(
        &self,
        slot: SlotUuid,
        new_pin: Option<String>,
    ) -> Result<SlotRecord, InventoryServiceError>;

    /// Flags a slot as dead.
    async fn mark_slot_down(&self, slot: SlotUuid) -> Result<SlotRecord, InventoryServiceError>;

    /// Every account with its slots.
    async fn list_accounts(&self) -> Result<Vec<AccountOverview>, InventoryServiceError>;

    /// Free stock for a service.
    async fn available_stock(&self, service: &str) -> Result<usize, InventoryServiceError>;

    /// Accounts whose supplier payment day is due for a reminder.
    async fn supplier_due_accounts(
        &self,
        today: Date,
    ) -> Result<Vec<AccountRecord>, InventoryServiceError>;
}
