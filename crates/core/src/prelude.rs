//! Streampool prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    alerts::{
        Alert, AlertAction, AlertGroup, AlertKind, AlertPriority, SubscriptionPair,
        compute_alerts, evaluate_pair, group_alerts,
    },
    calendar::{
        CalendarError, add_months, days_between, end_of_day, period_end, supplier_cycle_offset,
        supplier_due_soon,
    },
    states::{SlotState, TransitionError},
};
