//! Swap service: rotation and warranty replacement.
//!
//! Both policies share one mechanism, moving the client off a bad slot onto
//! a free slot of the same service atomically, and differ only in what the
//! old slot becomes and in how a dry pool is handled. Rotation refuses to
//! act without a replacement; warranty parks the slot and leaves the client
//! pending.

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use streampool::states::SlotState;
use tracing::info;

use crate::{
    domain::{
        inventory::{
            data::NewCredentials,
            records::{AccountRecord, AccountUuid, SlotRecord, SlotUuid},
            repository::{AccountsRepository, SlotsRepository},
        },
        sales::repository::PeriodsRepository,
        swaps::errors::SwapServiceError,
    },
    ledger::Ledger,
};

/// What a single-slot swap operation ended up doing.
#[derive(Debug, Clone)]
pub enum SwapOutcome {
    /// No active billing period existed; the slot was only flagged.
    Flagged(SlotRecord),

    /// The client's billing period was repointed to the returned
    /// replacement slot.
    Swapped {
        old: SlotRecord,
        replacement: SlotRecord,
    },

    /// No stock existed; the slot was withdrawn with its client left
    /// pending manual resolution. Warranty only.
    Parked(SlotRecord),
}

#[derive(Debug, Clone)]
pub struct LedgerSwapService {
    ledger: Ledger,
    accounts: AccountsRepository,
    slots: SlotsRepository,
    periods: PeriodsRepository,
}

impl LedgerSwapService {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            accounts: AccountsRepository::new(),
            slots: SlotsRepository::new(),
            periods: PeriodsRepository::new(),
        }
    }
}

#[async_trait]
impl SwapService for LedgerSwapService {
    #[tracing::instrument(
        name = "swaps.service.rotate",
        skip(self),
        fields(slot_uuid = %slot),
        err
    )]
    async fn rotate(&self, slot: SlotUuid) -> Result<SwapOutcome, SwapServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.slots.get(&tx, slot)?;
        let account = self.accounts.get(&tx, record.account_uuid)?;

        let Some(active) = self.periods.latest_for_slot(&tx, slot) else {
            // Nothing to migrate; just pull the slot out of circulation.
            let flagged = record.state.quarantined()?;
            let updated = self.slots.set_state(&mut tx, slot, flagged)?;

            tx.commit();

            info!(slot_uuid = %slot, "quarantined slot with no active client");

            return Ok(SwapOutcome::Flagged(updated));
        };

        // No replacement means no rotation at all: quarantining the slot
        // without somewhere to move the client would strand them.
        let Some(replacement) = self
            .slots
            .find_available_for_service(&tx, &account.service, slot)
        else {
            return Err(SwapServiceError::NoStock);
        };

        let quarantined = record.state.quarantined()?;
        let old = self.slots.set_state(&mut tx, slot, quarantined)?;
        let replacement = self.slots.claim(&mut tx, replacement.uuid)?;

        self.periods.set_slot(&mut tx, active.uuid, replacement.uuid)?;

        tx.commit();

        info!(
            old_slot = %old.uuid,
            new_slot = %replacement.uuid,
            period_uuid = %active.uuid,
            "rotated client onto replacement slot"
        );

        Ok(SwapOutcome::Swapped { old, replacement })
    }

    #[tracing::instrument(
        name = "swaps.service.apply_warranty",
        skip(self),
        fields(slot_uuid = %slot),
        err
    )]
    async fn apply_warranty(&self, slot: SlotUuid) -> Result<SwapOutcome, SwapServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.slots.get(&tx, slot)?;
        let account = self.accounts.get(&tx, record.account_uuid)?;

        let Some(active) = self.periods.latest_for_slot(&tx, slot) else {
            let withdrawn = record.state.withdrawn()?;
            let updated = self.slots.set_state(&mut tx, slot, withdrawn)?;

            tx.commit();

            info!(slot_uuid = %slot, "withdrew slot with no active client");

            return Ok(SwapOutcome::Flagged(updated));
        };

        let replacement = self
            .slots
            .find_available_for_service(&tx, &account.service, slot);

        let Some(replacement) = replacement else {
            // Unlike rotation, a dry pool does not block: the slot is
            // withdrawn anyway and the client waits for stock.
            let withdrawn = record.state.withdrawn()?;
            let updated = self.slots.set_state(&mut tx, slot, withdrawn)?;

            tx.commit();

            info!(slot_uuid = %slot, "no stock, client left pending on warranty");

            return Ok(SwapOutcome::Parked(updated));
        };

        let withdrawn = record.state.withdrawn()?;
        let old = self.slots.set_state(&mut tx, slot, withdrawn)?;
        let replacement = self.slots.claim(&mut tx, replacement.uuid)?;

        self.periods.set_slot(&mut tx, active.uuid, replacement.uuid)?;

        tx.commit();

        info!(
            old_slot = %old.uuid,
            new_slot = %replacement.uuid,
            period_uuid = %active.uuid,
            "moved client onto replacement under warranty"
        );

        Ok(SwapOutcome::Swapped { old, replacement })
    }

    #[tracing::instrument(
        name = "swaps.service.apply_account_warranty",
        skip(self),
        fields(account_uuid = %account),
        err
    )]
    async fn apply_account_warranty(&self, account: AccountUuid) -> Result<(), SwapServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.accounts.get(&tx, account)?;
        let slots = self.slots.for_account(&tx, account);

        let occupied = slots.iter().filter(|s| s.state.is_occupied()).count();

        // Hard gate: withdrawing the account may not strand a single
        // occupied client, so their coverage must exist elsewhere first.
        if occupied > 0 {
            let available = self.slots.count_available_for_service_excluding(
                &tx,
                &record.service,
                account,
            );

            if available < occupied {
                return Err(SwapServiceError::InsufficientStock {
                    needed: occupied,
                    available,
                });
            }
        }

        for slot in &slots {
            self.slots
                .set_state(&mut tx, slot.uuid, SlotState::Warranty)?;
        }

        tx.commit();

        info!(
            account_uuid = %account,
            slot_count = slots.len(),
            "withdrew whole account under warranty"
        );

        Ok(())
    }

    #[tracing::instrument(
        name = "swaps.service.replace_account",
        skip(self, credentials),
        fields(account_uuid = %account),
        err
    )]
    async fn replace_account(
        &self,
        account: AccountUuid,
        credentials: NewCredentials,
        activation_date: Date,
    ) -> Result<AccountRecord, SwapServiceError> {
        let mut tx = self.ledger.begin().await;

        let mut record = self.accounts.get(&tx, account)?;

        record.email = credentials.email;
        record.password = credentials.password;
        record.activation_date = activation_date;

        self.accounts.save(&mut tx, record.clone())?;

        // The operator holds a working login again: the whole account
        // returns to stock.
        for slot in self.slots.for_account(&tx, account) {
            self.slots
                .set_state(&mut tx, slot.uuid, SlotState::Available)?;
        }

        tx.commit();

        info!(account_uuid = %account, "replaced account credentials");

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait SwapService: Send + Sync {
    /// Rotation policy: quarantine a suspected-compromised slot, migrating
    /// its client to a free same-service slot. Fails with
    /// [`SwapServiceError::NoStock`], mutating nothing, when a client
    /// exists but no replacement does.
    async fn rotate(&self, slot: SlotUuid) -> Result<SwapOutcome, SwapServiceError>;

    /// Warranty policy: withdraw a slot whose account is being replaced.
    /// With no stock the slot is still withdrawn and the client left
    /// pending.
    async fn apply_warranty(&self, slot: SlotUuid) -> Result<SwapOutcome, SwapServiceError>;

    /// Withdraws every slot of an account, gated on enough free stock on
    /// *other* same-service accounts to cover its occupied clients. All or
    /// nothing.
    async fn apply_account_warranty(&self, account: AccountUuid) -> Result<(), SwapServiceError>;

    /// Installs replacement credentials and activation date, returning every
    /// slot of the account to stock.
    async fn replace_account(
        &self,
        account: AccountUuid,
        credentials: NewCredentials,
        activation_date: Date,
    ) -> Result<AccountRecord, SwapServiceError>;
}
