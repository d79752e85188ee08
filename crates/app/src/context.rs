//! App Context

use std::sync::Arc;

use crate::{
    domain::{
        inventory::{InventoryService, LedgerInventoryService},
        reconciliation::{LedgerReconciliationService, ReconciliationService},
        sales::{
            AllocationService, LedgerAllocationService, LedgerReleaseService, ReleaseService,
        },
        swaps::{LedgerSwapService, SwapService},
    },
    ledger::Ledger,
    notify::Notifier,
};

/// The wired service surface handed to UI/API callers.
#[derive(Clone)]
pub struct AppContext {
    pub inventory: Arc<dyn InventoryService>,
    pub allocation: Arc<dyn AllocationService>,
    pub release: Arc<dyn ReleaseService>,
    pub swaps: Arc<dyn SwapService>,
    pub reconciliation: Arc<dyn ReconciliationService>,
}

impl AppContext {
    /// Builds every service over one shared ledger and notifier.
    #[must_use]
    pub fn new(ledger: Ledger, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inventory: Arc::new(LedgerInventoryService::new(ledger.clone())),
            allocation: Arc::new(LedgerAllocationService::new(ledger.clone(), notifier)),
            release: Arc::new(LedgerReleaseService::new(ledger.clone())),
            swaps: Arc::new(LedgerSwapService::new(ledger.clone())),
            reconciliation: Arc::new(LedgerReconciliationService::new(ledger)),
        }
    }
}
