//! Calendar arithmetic for billing and technical lifecycles.
//!
//! Everything here is month-accurate wall-clock math. Month addition clamps
//! to the last day of shorter target months (Jan 31 + 1 month is Feb 28/29,
//! never Mar 2/3), and paid-through dates always land on the final second of
//! their day.

use jiff::{
    Span,
    civil::{Date, DateTime},
};
use thiserror::Error;

/// Longest subscription or account cycle accepted, in months.
pub const MAX_DURATION_MONTHS: i32 = 120;

/// Supplier payment reminders fire when the cycle offset lands in this
/// window: one day late through three days ahead.
pub const SUPPLIER_DUE_WINDOW: std::ops::RangeInclusive<i8> = -1..=3;

/// Errors from calendar computations.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// A duration outside `1..=MAX_DURATION_MONTHS` was supplied.
    #[error("duration must be between 1 and {MAX_DURATION_MONTHS} months, got {0}")]
    InvalidDuration(i32),

    /// The computed date fell outside the supported calendar range.
    #[error("date arithmetic out of range")]
    OutOfRange(#[source] jiff::Error),
}

/// Adds `months` calendar months to `date`, clamping the day-of-month to the
/// last day of the target month when the original day does not exist there.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidDuration`] for a non-positive or oversized
/// month count, and [`CalendarError::OutOfRange`] if the result leaves the
/// supported calendar range.
pub fn add_months(date: Date, months: i32) -> Result<Date, CalendarError> {
    if !(1..=MAX_DURATION_MONTHS).contains(&months) {
        return Err(CalendarError::InvalidDuration(months));
    }

    date.checked_add(Span::new().months(i64::from(months)))
        .map_err(CalendarError::OutOfRange)
}

/// The paid-through instant for a period starting on `start` and running for
/// `months`: clamped month addition, forced to the final second of the day.
///
/// # Errors
///
/// Propagates the errors of [`add_months`].
pub fn period_end(start: Date, months: i32) -> Result<DateTime, CalendarError> {
    Ok(end_of_day(add_months(start, months)?))
}

/// The final second of the given day, 23:59:59.
#[must_use]
pub fn end_of_day(date: Date) -> DateTime {
    date.at(23, 59, 59, 0)
}

/// Whole days from `from` to `to`; negative when `to` precedes `from`.
#[must_use]
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).get_days().into()
}

/// Signed distance from today to a supplier's billing day-of-month, folded
/// onto a 30-day cycle so the answer stays within two weeks either side.
///
/// A due day of 2 on the 28th is four days ahead, not 26 days behind.
#[must_use]
pub fn supplier_cycle_offset(due_day: i8, today: Date) -> i8 {
    let mut offset = due_day - today.day();

    if offset < -15 {
        offset += 30;
    }

    if offset > 15 {
        offset -= 30;
    }

    offset
}

/// Whether a supplier payment reminder should fire today for the given
/// billing day-of-month.
#[must_use]
pub fn supplier_due_soon(due_day: i8, today: Date) -> bool {
    SUPPLIER_DUE_WINDOW.contains(&supplier_cycle_offset(due_day, today))
}
