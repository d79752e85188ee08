//! Sales Data

use jiff::civil::Date;

use crate::{
    domain::{
        inventory::records::SlotUuid,
        sales::records::{PaymentMethod, SaleTarget},
    },
    ids::Phone,
};

/// New Sale Data
#[derive(Debug, Clone)]
pub struct NewSale {
    pub client_phone: Phone,
    pub client_name: String,
    pub target: SaleTarget,
    /// Amount paid, in minor currency units. Validated non-negative.
    pub price: i64,
    pub payment_method: PaymentMethod,
    pub start_date: Date,
    pub months: i32,
    pub description: Option<String>,
}

/// One line of a combo sale.
#[derive(Debug, Clone)]
pub struct ComboItem {
    pub slot: SlotUuid,
    pub price: i64,
}

/// New Combo Sale Data: several slots sold to one client as a bundle.
#[derive(Debug, Clone)]
pub struct NewComboSale {
    pub client_phone: Phone,
    pub client_name: String,
    pub payment_method: PaymentMethod,
    pub start_date: Date,
    pub months: i32,
    pub items: Vec<ComboItem>,
}
