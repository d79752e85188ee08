//! Test context for service-level integration tests.

use std::sync::Arc;

use crate::{
    domain::{
        inventory::{
            InventoryService, InventoryServiceError, LedgerInventoryService,
            records::{AccountOverview, AccountRecord, AccountUuid, SlotRecord},
        },
        reconciliation::LedgerReconciliationService,
        sales::{
            LedgerAllocationService, LedgerReleaseService,
            records::{PeriodRecord, PeriodUuid},
            repository::PeriodsRepository,
        },
        swaps::LedgerSwapService,
    },
    ledger::{Ledger, LedgerError},
    notify::{NoopNotifier, Notifier},
    test::helpers,
};

pub(crate) struct TestContext {
    pub ledger: Ledger,
    pub inventory: LedgerInventoryService,
    pub allocation: LedgerAllocationService,
    pub release: LedgerReleaseService,
    pub swaps: LedgerSwapService,
    pub reconciliation: LedgerReconciliationService,
}

impl TestContext {
    /// A fresh, empty ledger with the notification channel disabled.
    pub(crate) fn new() -> Self {
        Self::with_notifier(Arc::new(NoopNotifier))
    }

    /// A fresh ledger wired to the given notifier, for tests that assert on
    /// outbound messages.
    pub(crate) fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        let ledger = Ledger::new();

        Self {
            inventory: LedgerInventoryService::new(ledger.clone()),
            allocation: LedgerAllocationService::new(ledger.clone(), notifier),
            release: LedgerReleaseService::new(ledger.clone()),
            swaps: LedgerSwapService::new(ledger.clone()),
            reconciliation: LedgerReconciliationService::new(ledger.clone()),
            ledger,
        }
    }

    /// Creates a renewable sample account with the given number of slots.
    pub(crate) async fn seed_account(
        &self,
        service: &str,
        slot_count: usize,
    ) -> Result<(AccountRecord, Vec<SlotRecord>), InventoryServiceError> {
        let overview = self
            .inventory
            .create_account(helpers::new_account(service, slot_count))
            .await?;

        Ok((overview.account, overview.slots))
    }

    /// The current state of one account and its slots.
    pub(crate) async fn account_overview(
        &self,
        account: AccountUuid,
    ) -> Result<AccountOverview, InventoryServiceError> {
        self.inventory
            .list_accounts()
            .await?
            .into_iter()
            .find(|overview| overview.account.uuid == account)
            .ok_or(InventoryServiceError::NotFound)
    }

    /// Reads one billing period straight off the ledger.
    pub(crate) async fn period(&self, period: PeriodUuid) -> Result<PeriodRecord, LedgerError> {
        let tx = self.ledger.begin().await;

        PeriodsRepository::new().get(&tx, period)
    }

    /// Every billing period on the ledger.
    pub(crate) async fn periods(&self) -> Vec<PeriodRecord> {
        let tx = self.ledger.begin().await;

        PeriodsRepository::new().all(&tx)
    }
}
