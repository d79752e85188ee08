//! Dual-axis reconciliation.
//!
//! A shared credential lives on two independent clocks: the *technical* end
//! of the underlying account (driven by the supplier's renewal cadence) and
//! the *billing* end of each client's paid window. They drift in either
//! direction, and this module's only job is to detect and prioritize that
//! drift, never to resolve it.
//!
//! The engine is pure and pull-based: callers join stored records into
//! [`SubscriptionPair`]s and evaluate them against a reference day.

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::calendar::days_between;

/// Pairs where both end dates are further in the past than this are stale
/// history, never actionable.
pub const STALE_AFTER_DAYS: i64 = 30;

/// A shortfall needs the credential to die more than this many days before
/// the client's paid window closes.
pub const SHORTFALL_MIN_GAP_DAYS: i64 = 3;

/// A shortfall alert fires only while the technical end is within this many
/// days of now, on either side.
pub const SHORTFALL_IMMINENCE_DAYS: i64 = 3;

/// For disposable accounts, surplus handling needs the credential to outlive
/// the paid window by more than this many days.
pub const SURPLUS_MIN_SLACK_DAYS: i64 = 3;

/// Collection alerts start this many days before the billing end.
pub const SURPLUS_MAX_DAYS_AHEAD: i64 = 5;

/// Collection alerts keep firing until the billing end is this many days
/// overdue.
pub const SURPLUS_MAX_DAYS_OVERDUE: i64 = 15;

/// One active subscription joined with the account that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPair {
    /// Client display name.
    pub client_name: String,

    /// Client contact identifier.
    pub client_phone: String,

    /// Human-readable description of the affected service.
    pub service: String,

    /// The client's paid-through date.
    pub billing_end: Date,

    /// The backing account's technical end of life.
    pub technical_end: Date,

    /// Whether the backing account is single-cycle (no renewal expected).
    pub disposable: bool,
}

/// The class of drift an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// The credential dies before the client's paid window ends.
    Shortfall,

    /// The paid window ends while the credential lives on; collect.
    Surplus,
}

/// Alert urgency. Ordered most-urgent-first so sorting on it is direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    /// A client is about to lose (or has just lost) access they paid for.
    Critical,

    /// A renewal payment can be collected.
    Opportunity,
}

/// The operator action an alert calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertAction {
    /// Move the client onto a fresh account before the credential dies.
    ChangeAccount,

    /// The paid window already closed; chase the payment.
    CollectOverdue,

    /// The paid window closes within days; arrange the renewal.
    CollectSoon,
}

impl AlertAction {
    /// Display label for operator-facing surfaces.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ChangeAccount => "CHANGE ACCOUNT",
            Self::CollectOverdue => "OVERDUE - COLLECT",
            Self::CollectSoon => "COLLECT SOON",
        }
    }
}

/// One prioritized, time-sensitive action item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Client display name.
    pub client_name: String,

    /// Client contact identifier.
    pub client_phone: String,

    /// Description of the affected service.
    pub service: String,

    /// Drift class.
    pub kind: AlertKind,

    /// Urgency.
    pub priority: AlertPriority,

    /// Suggested operator action.
    pub action: AlertAction,

    /// The client's paid-through date.
    pub billing_end: Date,

    /// The backing account's technical end of life.
    pub technical_end: Date,

    /// Shortfall: days between technical end and billing end. Surplus:
    /// signed days from now to the billing end (negative when overdue).
    pub gap_days: i64,
}

impl Alert {
    /// The date the operator actually has to act on: the credential's death
    /// for a shortfall, the client's billing end for a surplus.
    #[must_use]
    pub const fn actionable_date(&self) -> Date {
        match self.kind {
            AlertKind::Shortfall => self.technical_end,
            AlertKind::Surplus => self.billing_end,
        }
    }
}

/// Evaluates one pair against the given day.
///
/// A disposable account whose dates satisfy both rules yields both alerts;
/// the upstream system never deduplicated that overlap and neither does this
/// engine.
#[must_use]
pub fn evaluate_pair(pair: &SubscriptionPair, today: Date) -> SmallVec<[Alert; 2]> {
    let mut alerts = SmallVec::new();

    let billing_age = days_between(pair.billing_end, today);
    let technical_age = days_between(pair.technical_end, today);

    if billing_age > STALE_AFTER_DAYS && technical_age > STALE_AFTER_DAYS {
        return alerts;
    }

    // Positive when the credential dies before the paid window closes.
    let shortfall_gap = days_between(pair.technical_end, pair.billing_end);

    if pair.disposable
        && shortfall_gap > SHORTFALL_MIN_GAP_DAYS
        && technical_age.abs() <= SHORTFALL_IMMINENCE_DAYS
    {
        alerts.push(Alert {
            client_name: pair.client_name.clone(),
            client_phone: pair.client_phone.clone(),
            service: pair.service.clone(),
            kind: AlertKind::Shortfall,
            priority: AlertPriority::Critical,
            action: AlertAction::ChangeAccount,
            billing_end: pair.billing_end,
            technical_end: pair.technical_end,
            gap_days: shortfall_gap,
        });
    }

    if !pair.disposable || -shortfall_gap > SURPLUS_MIN_SLACK_DAYS {
        let days_left = -billing_age;

        if (-SURPLUS_MAX_DAYS_OVERDUE..=SURPLUS_MAX_DAYS_AHEAD).contains(&days_left) {
            let action = if days_left < 0 {
                AlertAction::CollectOverdue
            } else {
                AlertAction::CollectSoon
            };

            alerts.push(Alert {
                client_name: pair.client_name.clone(),
                client_phone: pair.client_phone.clone(),
                service: pair.service.clone(),
                kind: AlertKind::Surplus,
                priority: AlertPriority::Opportunity,
                action,
                billing_end: pair.billing_end,
                technical_end: pair.technical_end,
                gap_days: days_left,
            });
        }
    }

    alerts
}

/// Evaluates every pair and returns a flat, most-urgent-first alert list.
///
/// Sorted by priority, then the actionable date, then client phone so equal
/// alerts order deterministically.
#[must_use]
pub fn compute_alerts(pairs: &[SubscriptionPair], today: Date) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = pairs
        .iter()
        .flat_map(|pair| evaluate_pair(pair, today))
        .collect();

    alerts.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.actionable_date().cmp(&b.actionable_date()))
            .then_with(|| a.client_phone.cmp(&b.client_phone))
    });

    alerts
}

/// Alerts collapsed into one display card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertGroup {
    /// Client contact identifier shared by the group.
    pub client_phone: String,

    /// Client display name shared by the group.
    pub client_name: String,

    /// Paid-through date shared by the group.
    pub billing_end: Date,

    /// Technical end shared by the group.
    pub technical_end: Date,

    /// Drift class shared by the group.
    pub kind: AlertKind,

    /// The member alerts, in input order.
    pub alerts: Vec<Alert>,
}

/// Groups alerts by (client, billing end, technical end, kind) so several
/// services due the same day for the same client collapse into one card.
///
/// Group order follows the first appearance of each key in `alerts`.
#[must_use]
pub fn group_alerts(alerts: &[Alert]) -> Vec<AlertGroup> {
    let mut index: FxHashMap<(String, Date, Date, AlertKind), usize> = FxHashMap::default();
    let mut groups: Vec<AlertGroup> = Vec::new();

    for alert in alerts {
        let key = (
            alert.client_phone.clone(),
            alert.billing_end,
            alert.technical_end,
            alert.kind,
        );

        match index.get(&key) {
            Some(&at) => {
                if let Some(group) = groups.get_mut(at) {
                    group.alerts.push(alert.clone());
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(AlertGroup {
                    client_phone: alert.client_phone.clone(),
                    client_name: alert.client_name.clone(),
                    billing_end: alert.billing_end,
                    technical_end: alert.technical_end,
                    kind: alert.kind,
                    alerts: vec![alert.clone()],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn pair(disposable: bool, technical_end: Date, billing_end: Date) -> SubscriptionPair {
        SubscriptionPair {
            client_name: "Ana".to_owned(),
            client_phone: "3001234567".to_owned(),
            service: "Netflix - Per 1".to_owned(),
            billing_end,
            technical_end,
            disposable,
        }
    }

    #[test]
    fn shortfall_fires_only_for_disposable_accounts() {
        let today = date(2025, 2, 1);
        let renewable = pair(false, date(2025, 2, 1), date(2025, 2, 15));

        let alerts = evaluate_pair(&renewable, today);

        assert!(
            alerts.iter().all(|a| a.kind != AlertKind::Shortfall),
            "shortfall emitted for a renewable account"
        );
    }

    #[test]
    fn shortfall_requires_imminent_technical_end() {
        let disposable = pair(true, date(2025, 2, 1), date(2025, 2, 15));

        // Ten days out: not yet imminent.
        assert!(
            evaluate_pair(&disposable, date(2025, 1, 22)).is_empty(),
            "shortfall fired ten days early"
        );

        // Within three days, before and after the death date.
        for today in [date(2025, 1, 29), date(2025, 2, 1), date(2025, 2, 4)] {
            let alerts = evaluate_pair(&disposable, today);
            let shortfall = alerts
                .iter()
                .find(|a| a.kind == AlertKind::Shortfall)
                .expect("shortfall expected while imminent");

            assert_eq!(shortfall.priority, AlertPriority::Critical);
            assert_eq!(shortfall.action, AlertAction::ChangeAccount);
            assert_eq!(shortfall.gap_days, 14);
        }
    }

    #[test]
    fn shortfall_needs_more_than_three_days_of_gap() {
        // Credential dies only two days before the paid window closes.
        let tight = pair(true, date(2025, 2, 1), date(2025, 2, 3));

        let alerts = evaluate_pair(&tight, date(2025, 2, 1));

        assert!(
            alerts.iter().all(|a| a.kind != AlertKind::Shortfall),
            "shortfall fired on a two-day gap"
        );
    }

    #[test]
    fn surplus_fires_inside_collection_window() {
        let renewable = pair(false, date(2025, 6, 1), date(2025, 2, 10));

        // Five days ahead: in window.
        let soon = evaluate_pair(&renewable, date(2025, 2, 5));
        assert_eq!(soon.len(), 1, "expected one collection alert");
        assert_eq!(soon[0].action, AlertAction::CollectSoon);
        assert_eq!(soon[0].gap_days, 5);

        // Due today still counts as soon, not overdue.
        let today = evaluate_pair(&renewable, date(2025, 2, 10));
        assert_eq!(today[0].action, AlertAction::CollectSoon);
        assert_eq!(today[0].gap_days, 0);

        // Fifteen days past: last overdue day.
        let overdue = evaluate_pair(&renewable, date(2025, 2, 25));
        assert_eq!(overdue[0].action, AlertAction::CollectOverdue);
        assert_eq!(overdue[0].gap_days, -15);

        // Outside the window on both sides.
        assert!(
            evaluate_pair(&renewable, date(2025, 2, 4)).is_empty(),
            "fired six days ahead"
        );
        assert!(
            evaluate_pair(&renewable, date(2025, 2, 26)).is_empty(),
            "fired sixteen days past"
        );
    }

    #[test]
    fn disposable_account_needs_real_slack_for_surplus() {
        // Disposable, credential outlives the paid window by only two days.
        let tight = pair(true, date(2025, 2, 12), date(2025, 2, 10));

        assert!(
            evaluate_pair(&tight, date(2025, 2, 10)).is_empty(),
            "surplus fired without slack on a disposable account"
        );

        // Four days of slack is enough.
        let slack = pair(true, date(2025, 2, 14), date(2025, 2, 10));
        let alerts = evaluate_pair(&slack, date(2025, 2, 10));

        assert_eq!(alerts.len(), 1, "expected one collection alert");
        assert_eq!(alerts[0].kind, AlertKind::Surplus);
    }

    #[test]
    fn stale_pairs_emit_nothing() {
        let stale = pair(false, date(2024, 11, 1), date(2024, 11, 15));

        assert!(
            evaluate_pair(&stale, date(2025, 2, 1)).is_empty(),
            "alert emitted for stale history"
        );
    }

    #[test]
    fn shortfall_gap_never_doubles_as_surplus_slack() {
        // Disposable, credential dies 4 days before the paid window closes,
        // billing end inside the collection window. The 4-day gap satisfies
        // the shortfall rule but runs the wrong way for surplus slack.
        let tight = pair(true, date(2025, 2, 1), date(2025, 2, 5));

        let alerts = evaluate_pair(&tight, date(2025, 2, 1));

        assert_eq!(alerts.len(), 1, "expected the shortfall alone");
        assert_eq!(alerts[0].kind, AlertKind::Shortfall);
    }

    #[test]
    fn sort_puts_critical_first_then_by_date() {
        let pairs = vec![
            pair(false, date(2025, 6, 1), date(2025, 2, 10)),
            pair(true, date(2025, 2, 1), date(2025, 2, 15)),
        ];

        let alerts = compute_alerts(&pairs, date(2025, 2, 7));

        assert_eq!(alerts.len(), 2, "expected one alert per pair");
        assert_eq!(alerts[0].priority, AlertPriority::Critical);
        assert_eq!(alerts[1].priority, AlertPriority::Opportunity);
    }

    #[test]
    fn grouping_collapses_same_client_same_dates() {
        let mut first = pair(false, date(2025, 6, 1), date(2025, 2, 10));
        first.service = "Netflix - Per 1".to_owned();
        let mut second = first.clone();
        second.service = "Disney - Per 3".to_owned();

        let alerts = compute_alerts(&[first, second], date(2025, 2, 8));
        let groups = group_alerts(&alerts);

        assert_eq!(alerts.len(), 2, "expected two collection alerts");
        assert_eq!(groups.len(), 1, "expected a single display card");
        assert_eq!(groups[0].alerts.len(), 2);
        assert_eq!(groups[0].kind, AlertKind::Surplus);
    }
}
