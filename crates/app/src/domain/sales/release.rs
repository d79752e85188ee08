//! Release service.

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use streampool::calendar::end_of_day;
use tracing::info;

use crate::{
    domain::{
        inventory::{records::SlotUuid, repository::SlotsRepository},
        sales::{
            errors::ReleaseServiceError,
            records::{PeriodRecord, PeriodUuid},
            repository::PeriodsRepository,
        },
    },
    ledger::{Ledger, LedgerTx},
};

#[derive(Debug, Clone)]
pub struct LedgerReleaseService {
    ledger: Ledger,
    slots: SlotsRepository,
    periods: PeriodsRepository,
}

impl LedgerReleaseService {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            slots: SlotsRepository::new(),
            periods: PeriodsRepository::new(),
        }
    }

    /// Returns an occupied slot to stock, rotating its PIN when a new one is
    /// supplied. Slots parked in quarantine, warranty or down keep their
    /// flag when their period goes away.
    fn free_slot(
        &self,
        tx: &mut LedgerTx,
        slot: SlotUuid,
        new_pin: Option<&str>,
    ) -> Result<(), ReleaseServiceError> {
        let record = self.slots.get(tx, slot)?;

        if let Ok(released) = record.state.released() {
            self.slots.set_state(tx, slot, released)?;

            if let Some(pin) = new_pin {
                self.slots.set_pin(tx, slot, Some(pin.to_owned()))?;
            }
        }

        Ok(())
    }

    /// Frees every slot one period holds, whether it references a single
    /// slot or a whole account.
    fn free_period_stock(
        &self,
        tx: &mut LedgerTx,
        period: &PeriodRecord,
        new_pin: Option<&str>,
    ) -> Result<(), ReleaseServiceError> {
        if let Some(slot) = period.slot_uuid {
            self.free_slot(tx, slot, new_pin)?;
        } else if let Some(account) = period.account_uuid {
            for slot in self.slots.for_account(tx, account) {
                self.free_slot(tx, slot.uuid, new_pin)?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ReleaseService for LedgerReleaseService {
    #[tracing::instrument(
        name = "sales.service.release",
        skip(self, new_pin),
        fields(period_uuid = %period, pin_rotation = new_pin.is_some()),
        err
    )]
    async fn release(
        &self,
        period: PeriodUuid,
        new_pin: Option<String>,
    ) -> Result<(), ReleaseServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.periods.get(&tx, period)?;

        // Deleting one member of a bundle deletes the whole bundle.
        let members = match record.group_uuid {
            Some(group) => self.periods.group_members(&tx, group),
            None => vec![record],
        };

        for member in &members {
            self.free_period_stock(&mut tx, member, new_pin.as_deref())?;
            self.periods.remove(&mut tx, member.uuid)?;
        }

        tx.commit();

        info!(count = members.len(), "released billing periods");

        Ok(())
    }

    #[tracing::instrument(
        name = "sales.service.soft_release",
        skip(self),
        fields(period_uuid = %period),
        err
    )]
    async fn soft_release(
        &self,
        period: PeriodUuid,
        today: Date,
    ) -> Result<PeriodRecord, ReleaseServiceError> {
        let mut tx = self.ledger.begin().await;

        let record = self.periods.get(&tx, period)?;

        self.free_period_stock(&mut tx, &record, None)?;

        // The period stays on file, visibly expired as of yesterday.
        let yesterday = today.yesterday().map_err(ReleaseServiceError::OutOfRange)?;
        let updated = self.periods.set_end(&mut tx, period, end_of_day(yesterday))?;

        tx.commit();

        info!(period_uuid = %period, "soft-released billing period");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait ReleaseService: Send + Sync {
    /// Reverses an allocation: frees the slot (or whole account) behind the
    /// period and deletes the period, or the whole group when it was sold as
    /// a bundle. A supplied `new_pin` rotates the freed slots' PIN so the
    /// departing client loses access.
    async fn release(
        &self,
        period: PeriodUuid,
        new_pin: Option<String>,
    ) -> Result<(), ReleaseServiceError>;

    /// Marks a client as not renewing without erasing history: frees the
    /// stock but keeps the period, with its end forced to yesterday.
    async fn soft_release(
        &self,
        period: PeriodUuid,
        today: Date,
    ) -> Result<PeriodRecord, ReleaseServiceError>;
}
