//! Inventory Data

use jiff::civil::Date;

/// New Account Data
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub service: String,
    pub email: String,
    pub password: String,
    pub activation_date: Date,
    pub duration_months: i32,
    pub disposable: bool,
    pub provider_due_day: Option<i8>,
    pub supplier: Option<String>,
    pub slots: Vec<NewSlot>,
}

/// New Slot Data
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub label: String,
    pub pin: Option<String>,
}

/// Partial account update. `None` leaves a field unchanged; the doubly
/// optional fields distinguish "unchanged" from "cleared".
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub service: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub activation_date: Option<Date>,
    pub duration_months: Option<i32>,
    pub disposable: Option<bool>,
    pub provider_due_day: Option<Option<i8>>,
    pub supplier: Option<Option<String>>,
}

/// Replacement login for an account swapped out under warranty.
#[derive(Debug, Clone)]
pub struct NewCredentials {
    pub email: String,
    pub password: String,
}
