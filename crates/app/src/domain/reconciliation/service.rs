//! Reconciliation service.
//!
//! Joins every billing period to the account that backs it and runs the
//! core drift engine over the result. Strictly read-only: the ledger is
//! opened, read and dropped without a commit.

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use streampool::{
    alerts::{Alert, AlertGroup, SubscriptionPair, compute_alerts, group_alerts},
    calendar::add_months,
};
use tracing::info;

use crate::{
    domain::{
        clients::repository::ClientsRepository,
        reconciliation::errors::ReconciliationServiceError,
        inventory::{
            records::{AccountRecord, SlotRecord},
            repository::{AccountsRepository, SlotsRepository},
        },
        sales::{records::PeriodRecord, repository::PeriodsRepository},
    },
    ledger::{Ledger, LedgerTx},
};

#[derive(Debug, Clone)]
pub struct LedgerReconciliationService {
    ledger: Ledger,
    accounts: AccountsRepository,
    slots: SlotsRepository,
    clients: ClientsRepository,
    periods: PeriodsRepository,
}

impl LedgerReconciliationService {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            accounts: AccountsRepository::new(),
            slots: SlotsRepository::new(),
            clients: ClientsRepository::new(),
            periods: PeriodsRepository::new(),
        }
    }

    /// The account (and slot, for profile sales) behind a period. Unlinked
    /// sales and dangling references resolve to nothing and drop out of the
    /// report.
    fn resolve(
        &self,
        tx: &LedgerTx,
        period: &PeriodRecord,
    ) -> Option<(AccountRecord, Option<SlotRecord>)> {
        if let Some(slot) = period.slot_uuid {
            let slot = self.slots.get(tx, slot).ok()?;
            let account = self.accounts.get(tx, slot.account_uuid).ok()?;

            return Some((account, Some(slot)));
        }

        if let Some(account) = period.account_uuid {
            let account = self.accounts.get(tx, account).ok()?;

            return Some((account, None));
        }

        None
    }
}

#[async_trait]
impl ReconciliationService for LedgerReconciliationService {
    #[tracing::instrument(name = "reconciliation.service.compute_alerts", skip(self), err)]
    async fn compute_alerts(&self, today: Date) -> Result<Vec<Alert>, ReconciliationServiceError> {
        let tx = self.ledger.begin().await;

        let mut pairs = Vec::new();

        for period in self.periods.all(&tx) {
            let Some((account, slot)) = self.resolve(&tx, &period) else {
                continue;
            };

            let client_name = self
                .clients
                .get(&tx, &period.client_phone)
                .map_or_else(|_| period.client_phone.to_string(), |c| c.name);

            let service = match &slot {
                Some(slot) => format!("{} - {}", account.service, slot.label),
                None => format!("{} (cuenta completa)", account.service),
            };

            let technical_end = add_months(account.activation_date, account.duration_months)?;

            pairs.push(SubscriptionPair {
                client_name,
                client_phone: period.client_phone.to_string(),
                service,
                billing_end: period.ends_at.date(),
                technical_end,
                disposable: account.disposable,
            });
        }

        drop(tx);

        let alerts = compute_alerts(&pairs, today);

        info!(
            pair_count = pairs.len(),
            alert_count = alerts.len(),
            "computed reconciliation report"
        );

        Ok(alerts)
    }

    async fn grouped_alerts(
        &self,
        today: Date,
    ) -> Result<Vec<AlertGroup>, ReconciliationServiceError> {
        let alerts = self.compute_alerts(today).await?;

        Ok(group_alerts(&alerts))
    }
}

#[automock]
#[async_trait]
pub trait ReconciliationService: Send + Sync {
    /// The flat, most-urgent-first action list for the given day.
    async fn compute_alerts(&self, today: Date) -> Result<Vec<Alert>, ReconciliationServiceError>;

    /// The same report collapsed into display cards.
    async fn grouped_alerts(
        &self,
        today: Date,
    ) -> Result<Vec<AlertGroup>, ReconciliationServiceError>;
}
