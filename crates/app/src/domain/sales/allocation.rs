//! Allocation service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{
    Timestamp,
    civil::{Date, DateTime},
};
use mockall::automock;
use streampool::{
    calendar::{end_of_day, period_end},
    states::SlotState,
};
use tracing::{info, warn};

use crate::{
    domain::{
        clients::repository::ClientsRepository,
        inventory::{
            records::{AccountRecord, SlotRecord},
            repository::{AccountsRepository, SlotsRepository},
        },
        sales::{
            data::{NewComboSale, NewSale},
            errors::AllocationServiceError,
            messages::{WelcomeDetails, welcome_message},
            records::{GroupUuid, PaymentMethod, PeriodRecord, PeriodUuid, SaleTarget},
            repository::PeriodsRepository,
        },
    },
    ids::{Phone, TypedUuid},
    ledger::Ledger,
    notify::Notifier,
};

/// Local hour the welcome-message window opens.
const SERVICE_WINDOW_OPENS: i8 = 8;

/// Local hour the welcome-message window closes.
const SERVICE_WINDOW_CLOSES: i8 = 21;

fn service_window_open(now: DateTime) -> bool {
    (SERVICE_WINDOW_OPENS..SERVICE_WINDOW_CLOSES).contains(&now.hour())
}

#[derive(Clone)]
pub struct LedgerAllocationService {
    ledger: Ledger,
    notifier: Arc<dyn Notifier>,
    clients: ClientsRepository,
    accounts: AccountsRepository,
    slots: SlotsRepository,
    periods: PeriodsRepository,
}

impl LedgerAllocationService {
    #[must_use]
    pub fn new(ledger: Ledger, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger,
            notifier,
            clients: ClientsRepository::new(),
            accounts: AccountsRepository::new(),
            slots: SlotsRepository::new(),
            periods: PeriodsRepository::new(),
        }
    }

    /// Best-effort welcome message. Outside the service window the send is
    /// deferred to the manual batch; a channel failure is logged and
    /// swallowed so it can never fail the committed sale.
    async fn send_welcome(
        &self,
        phone: &Phone,
        client_name: &str,
        account: &AccountRecord,
        slot: Option<&SlotRecord>,
        ends_on: Date,
        now: DateTime,
    ) {
        if !service_window_open(now) {
            info!(client_phone = %phone, "outside service window, welcome deferred");

            return;
        }

        let text = welcome_message(&WelcomeDetails {
            client_name,
            service: &account.service,
            email: &account.email,
            password: &account.password,
            profile: slot.map(|s| s.label.as_str()),
            pin: slot.and_then(|s| s.pin.as_deref()),
            ends_on,
        });

        if let Err(error) = self.notifier.send(phone.as_str(), &text).await {
            warn!(client_phone = %phone, %error, "welcome notification failed");
        }
    }
}

#[async_trait]
impl AllocationService for LedgerAllocationService {
    #[tracing::instrument(
        name = "sales.service.allocate",
        skip(self, sale, now),
        fields(client_phone = %sale.client_phone, months = sale.months),
        err
    )]
    async fn allocate(
        &self,
        sale: NewSale,
        now: DateTime,
    ) -> Result<PeriodRecord, AllocationServiceError> {
        let price = u64::try_from(sale.price)?;
        let ends_at = period_end(sale.start_date, sale.months)?;
        // Noon start keeps same-day comparisons stable across offsets.
        let starts_at = sale.start_date.at(12, 0, 0, 0);

        let mut tx = self.ledger.begin().await;

        self.clients
            .upsert(&mut tx, sale.client_phone.clone(), sale.client_name.clone());

        let mut slot_uuid = None;
        let mut account_uuid = None;
        let mut welcome = None;

        match sale.target {
            SaleTarget::Slot(slot) => {
                let claimed = self.slots.claim(&mut tx, slot)?;
                let account = self.accounts.get(&tx, claimed.account_uuid)?;

                slot_uuid = Some(slot);
                welcome = Some((account, Some(claimed)));
            }
            SaleTarget::Account(account) => {
                let record = self.accounts.get(&tx, account)?;

                // A full-account sale takes the whole account out of stock.
                for slot in self.slots.for_account(&tx, account) {
                    self.slots.set_state(&mut tx, slot.uuid, SlotState::Occupied)?;
                }

                account_uuid = Some(account);
                welcome = Some((record, None));
            }
            SaleTarget::Unlinked => {}
        }

        let period = PeriodRecord {
            uuid: TypedUuid::new(),
            client_phone: sale.client_phone.clone(),
            slot_uuid,
            account_uuid,
            group_uuid: None,
            price,
            payment_method: sale.payment_method,
            starts_at,
            ends_at,
            description: sale.description,
            created_at: Timestamp::now(),
        };

        self.periods.insert(&mut tx, period.clone());

        tx.commit();

        info!(period_uuid = %period.uuid, "created billing period");

        if let Some((account, slot)) = welcome {
            self.send_welcome(
                &sale.client_phone,
                &sale.client_name,
                &account,
                slot.as_ref(),
                ends_at.date(),
                now,
            )
            .await;
        }

        Ok(period)
    }

    #[tracing::instrument(
        name = "sales.service.allocate_combo",
        skip(self, combo),
        fields(client_phone = %combo.client_phone, item_count = combo.items.len()),
        err
    )]
    async fn allocate_combo(
        &self,
        combo: NewComboSale,
    ) -> Result<Vec<PeriodRecord>, AllocationServiceError> {
        if combo.items.is_empty() {
            return Err(AllocationServiceError::EmptyCombo);
        }

        let ends_at = period_end(combo.start_date, combo.months)?;
        let starts_at = combo.start_date.at(12, 0, 0, 0);
        let group = GroupUuid::new();

        let mut tx = self.ledger.begin().await;

        self.clients
            .upsert(&mut tx, combo.client_phone.clone(), combo.client_name);

        let mut periods = Vec::with_capacity(combo.items.len());

        // Any claim failure drops the transaction, so either every item in
        // the bundle lands or none do.
        for item in combo.items {
            let price = u64::try_from(item.price)?;

            self.slots.claim(&mut tx, item.slot)?;

            let period = PeriodRecord {
                uuid: TypedUuid::new(),
                client_phone: combo.client_phone.clone(),
                slot_uuid: Some(item.slot),
                account_uuid: None,
                group_uuid: Some(group),
                price,
                payment_method: combo.payment_method,
                starts_at,
                ends_at,
                description: None,
                created_at: Timestamp::now(),
            };

            self.periods.insert(&mut tx, period.clone());
            periods.push(period);
        }

        tx.commit();

        info!(group_uuid = %group, count = periods.len(), "created combo sale");

        Ok(periods)
    }

    #[tracing::instrument(
        name = "sales.service.renew",
        skip(self),
        fields(previous_uuid = %previous, months),
        err
    )]
    async fn renew(
        &self,
        previous: PeriodUuid,
        start_date: Date,
        months: i32,
        payment_method: PaymentMethod,
    ) -> Result<PeriodRecord, AllocationServiceError> {
        let ends_at = period_end(start_date, months)?;

        let mut tx = self.ledger.begin().await;

        let prior = self.periods.get(&tx, previous)?;

        // A renewal keeps the client on the same slot or account and rolls
        // the price forward; only the window and payment method change.
        let period = PeriodRecord {
            uuid: TypedUuid::new(),
            client_phone: prior.client_phone,
            slot_uuid: prior.slot_uuid,
            account_uuid: prior.account_uuid,
            group_uuid: None,
            price: prior.price,
            payment_method,
            starts_at: start_date.at(12, 0, 0, 0),
            ends_at,
            description: prior.description,
            created_at: Timestamp::now(),
        };

        self.periods.insert(&mut tx, period.clone());

        tx.commit();

        info!(period_uuid = %period.uuid, "renewed billing period");

        Ok(period)
    }

    #[tracing::instrument(
        name = "sales.service.correct_due_date",
        skip(self),
        fields(period_uuid = %period, %new_end),
        err
    )]
    async fn correct_due_date(
        &self,
        period: PeriodUuid,
        new_end: Date,
    ) -> Result<PeriodRecord, AllocationServiceError> {
        let mut tx = self.ledger.begin().await;

        let updated = self.periods.set_end(&mut tx, period, end_of_day(new_end))?;

        tx.commit();

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait AllocationService: Send + Sync {
    /// Sells a slot, a whole account, or an unlinked service to a client.
    ///
    /// Upserts the client, computes the paid-through date with calendar-safe
    /// month arithmetic, claims the referenced stock and writes the billing
    /// period, all in one batch. `now` is the local wall-clock time used for
    /// the welcome-message service window.
    async fn allocate(
        &self,
        sale: NewSale,
        now: DateTime,
    ) -> Result<PeriodRecord, AllocationServiceError>;

    /// Sells several slots to one client as an all-or-nothing bundle that
    /// shares one group id and one paid window.
    async fn allocate_combo(
        &self,
        combo: NewComboSale,
    ) -> Result<Vec<PeriodRecord>, AllocationServiceError>;

    /// Creates the next billing period on the same slot or account as a
    /// previous one.
    async fn renew(
        &self,
        previous: PeriodUuid,
        start_date: Date,
        months: i32,
        payment_method: PaymentMethod,
    ) -> Result<PeriodRecord, AllocationServiceError>;

    /// Date-correction: forces a period's paid-through date to the given
    /// day, end of day.
    async fn correct_due_date(
        &self,
        period: PeriodUuid,
        new_end: Date,
    ) -> Result<PeriodRecord, AllocationServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use streampool::states::SlotState;
    use testresult::TestResult;

    use crate::{
        notify::MockNotifier,
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn allocating_a_slot_claims_it_and_clamps_the_end_date() -> TestResult {
        let ctx = TestContext::new();
        let (account, slots) = ctx.seed_account("Netflix", 2).await?;

        // Month-end start: the paid window must clamp, never spill into March.
        let mut sale = helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000);
        sale.start_date = date(2025, 1, 31);

        let period = ctx
            .allocation
            .allocate(sale, date(2025, 1, 31).at(10, 0, 0, 0))
            .await?;

        assert_eq!(period.ends_at, date(2025, 2, 28).at(23, 59, 59, 0));
        assert_eq!(period.slot_uuid, Some(slots[0].uuid));
        assert_eq!(period.price, 15_000);

        let overview = ctx.account_overview(account.uuid).await?;
        let claimed = overview
            .slots
            .iter()
            .find(|s| s.uuid == slots[0].uuid)
            .expect("sold slot should still exist");

        assert_eq!(claimed.state, SlotState::Occupied);
        assert_eq!(
            overview.slots.iter().filter(|s| s.state.is_available()).count(),
            1,
            "the other slot should stay in stock"
        );

        Ok(())
    }

    #[tokio::test]
    async fn allocating_an_occupied_slot_loses_the_claim() -> TestResult {
        let ctx = TestContext::new();
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        ctx.allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000),
                helpers::daytime(),
            )
            .await?;

        let result = ctx
            .allocation
            .allocate(
                helpers::slot_sale("3017654321", "Luis", slots[0].uuid, 15_000),
                helpers::daytime(),
            )
            .await;

        assert!(
            matches!(result, Err(AllocationServiceError::SlotUnavailable)),
            "expected SlotUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn allocating_an_unknown_slot_returns_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", TypedUuid::new(), 15_000),
                helpers::daytime(),
            )
            .await;

        assert!(
            matches!(result, Err(AllocationServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn negative_prices_are_rejected() -> TestResult {
        let ctx = TestContext::new();
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        let result = ctx
            .allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, -500),
                helpers::daytime(),
            )
            .await;

        assert!(
            matches!(result, Err(AllocationServiceError::InvalidPrice(_))),
            "expected InvalidPrice, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn zero_month_durations_are_rejected() -> TestResult {
        let ctx = TestContext::new();
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        let mut sale = helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000);
        sale.months = 0;

        let result = ctx.allocation.allocate(sale, helpers::daytime()).await;

        assert!(
            matches!(result, Err(AllocationServiceError::Calendar(_))),
            "expected a calendar error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn full_account_sales_occupy_every_slot() -> TestResult {
        let ctx = TestContext::new();
        let (account, _) = ctx.seed_account("Netflix", 4).await?;

        let mut sale = helpers::slot_sale("3001234567", "Ana", TypedUuid::new(), 42_000);
        sale.target = SaleTarget::Account(account.uuid);

        let period = ctx.allocation.allocate(sale, helpers::daytime()).await?;

        assert_eq!(period.account_uuid, Some(account.uuid));
        assert_eq!(period.slot_uuid, None);

        let overview = ctx.account_overview(account.uuid).await?;
        assert!(
            overview.slots.iter().all(|s| s.state == SlotState::Occupied),
            "full-account sale left free slots"
        );

        Ok(())
    }

    #[tokio::test]
    async fn combo_sale_shares_group_and_window() -> TestResult {
        let ctx = TestContext::new();
        let (_, slots) = ctx.seed_account("Netflix", 3).await?;

        let periods = ctx
            .allocation
            .allocate_combo(helpers::combo_sale(
                "3001234567",
                "Ana",
                &[slots[0].uuid, slots[1].uuid, slots[2].uuid],
            ))
            .await?;

        assert_eq!(periods.len(), 3);

        let group = periods[0].group_uuid;
        assert!(group.is_some(), "combo periods must carry a group id");
        assert!(
            periods.iter().all(|p| p.group_uuid == group),
            "combo periods must share the group id"
        );
        assert!(
            periods.iter().all(|p| p.ends_at == periods[0].ends_at),
            "combo periods must share the paid window"
        );

        Ok(())
    }

    #[tokio::test]
    async fn combo_sale_is_all_or_nothing() -> TestResult {
        let ctx = TestContext::new();
        let (account, slots) = ctx.seed_account("Netflix", 2).await?;

        // The same slot twice: the second claim must fail and nothing at
        // all may land.
        let result = ctx
            .allocation
            .allocate_combo(helpers::combo_sale(
                "3001234567",
                "Ana",
                &[slots[0].uuid, slots[0].uuid],
            ))
            .await;

        assert!(
            matches!(result, Err(AllocationServiceError::SlotUnavailable)),
            "expected SlotUnavailable, got {result:?}"
        );

        let overview = ctx.account_overview(account.uuid).await?;
        assert!(
            overview.slots.iter().all(|s| s.state == SlotState::Available),
            "failed combo left a slot claimed"
        );
        assert!(
            ctx.periods().await.is_empty(),
            "failed combo left billing periods behind"
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_combos_are_rejected() {
        let ctx = TestContext::new();

        let result = ctx
            .allocation
            .allocate_combo(helpers::combo_sale("3001234567", "Ana", &[]))
            .await;

        assert!(
            matches!(result, Err(AllocationServiceError::EmptyCombo)),
            "expected EmptyCombo, got {result:?}"
        );
    }

    #[tokio::test]
    async fn renewal_stays_on_the_same_slot() -> TestResult {
        let ctx = TestContext::new();
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        let first = ctx
            .allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000),
                helpers::daytime(),
            )
            .await?;

        let renewed = ctx
            .allocation
            .renew(first.uuid, date(2025, 3, 1), 1, PaymentMethod::Nequi)
            .await?;

        assert_eq!(renewed.slot_uuid, first.slot_uuid);
        assert_eq!(renewed.client_phone, first.client_phone);
        assert_eq!(renewed.price, first.price);
        assert_eq!(renewed.ends_at, date(2025, 4, 1).at(23, 59, 59, 0));

        Ok(())
    }

    #[tokio::test]
    async fn due_date_correction_forces_end_of_day() -> TestResult {
        let ctx = TestContext::new();
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        let period = ctx
            .allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000),
                helpers::daytime(),
            )
            .await?;

        let corrected = ctx
            .allocation
            .correct_due_date(period.uuid, date(2025, 3, 10))
            .await?;

        assert_eq!(corrected.ends_at, date(2025, 3, 10).at(23, 59, 59, 0));

        Ok(())
    }

    #[tokio::test]
    async fn welcome_goes_out_inside_the_service_window() -> TestResult {
        let mut notifier = MockNotifier::new();

        notifier
            .expect_send()
            .withf(|phone, message| phone == "3001234567" && message.contains("Netflix"))
            .times(1)
            .returning(|_, _| Ok(()));

        let ctx = TestContext::with_notifier(Arc::new(notifier));
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        ctx.allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000),
                date(2025, 1, 15).at(10, 30, 0, 0),
            )
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn welcome_is_deferred_outside_the_service_window() -> TestResult {
        let mut notifier = MockNotifier::new();

        notifier.expect_send().times(0);

        let ctx = TestContext::with_notifier(Arc::new(notifier));
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        ctx.allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000),
                date(2025, 1, 15).at(22, 15, 0, 0),
            )
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn a_failing_channel_never_fails_the_sale() -> TestResult {
        let mut notifier = MockNotifier::new();

        notifier.expect_send().times(1).returning(|_, _| {
            Err(crate::notify::NotifyError::UnexpectedResponse(
                "bot offline".to_owned(),
            ))
        });

        let ctx = TestContext::with_notifier(Arc::new(notifier));
        let (_, slots) = ctx.seed_account("Netflix", 1).await?;

        let period = ctx
            .allocation
            .allocate(
                helpers::slot_sale("3001234567", "Ana", slots[0].uuid, 15_000),
                helpers::daytime(),
            )
            .await?;

        assert_eq!(period.price, 15_000, "sale should commit despite the channel");

        Ok(())
    }
}
