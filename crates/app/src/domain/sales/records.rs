//! Sales Records

use std::fmt;

use jiff::{Timestamp, civil::DateTime};

use crate::{
    domain::inventory::records::{AccountUuid, SlotUuid},
    ids::{Phone, TypedUuid},
};

/// Billing Period UUID
pub type PeriodUuid = TypedUuid<PeriodRecord>;

/// Marker for combo sale group ids.
#[derive(Debug, Clone, Copy)]
pub enum ComboGroup {}

/// Combo group UUID, shared by every billing period sold in one bundle.
pub type GroupUuid = TypedUuid<ComboGroup>;

/// How a client paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Nequi,
    Bancolombia,
    Efectivo,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nequi => "NEQUI",
            Self::Bancolombia => "BANCOLOMBIA",
            Self::Efectivo => "EFECTIVO",
        };

        f.write_str(name)
    }
}

/// What a sale is attached to: one slot, a whole account, or nothing but a
/// free-text description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleTarget {
    Slot(SlotUuid),
    Account(AccountUuid),
    Unlinked,
}

/// One paid interval for one client.
///
/// `slot_uuid` and `account_uuid` are both optional: a profile sale carries
/// the slot, a full-account sale carries the account, an unlinked sale
/// carries neither. Grouped periods share `group_uuid`, start and end.
#[derive(Debug, Clone)]
pub struct PeriodRecord {
    pub uuid: PeriodUuid,
    pub client_phone: Phone,
    pub slot_uuid: Option<SlotUuid>,
    pub account_uuid: Option<AccountUuid>,
    pub group_uuid: Option<GroupUuid>,
    /// Amount paid, in minor currency units.
    pub price: u64,
    pub payment_method: PaymentMethod,
    pub starts_at: DateTime,
    /// Paid-through instant, always the final second of its day.
    pub ends_at: DateTime,
    pub description: Option<String>,
    pub created_at: Timestamp,
}
