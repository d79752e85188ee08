//! Test Helpers

use jiff::civil::{DateTime, date};

use crate::{
    domain::{
        inventory::{
            data::{NewAccount, NewSlot},
            records::SlotUuid,
        },
        sales::{
            data::{ComboItem, NewComboSale, NewSale},
            records::{PaymentMethod, SaleTarget},
        },
    },
    ids::Phone,
};

/// A renewable sample account activated 2025-01-01 on a yearly cycle.
pub(crate) fn new_account(service: &str, slot_count: usize) -> NewAccount {
    NewAccount {
        service: service.to_owned(),
        email: format!("{}@pool.example.com", service.to_lowercase()),
        password: "hunter2".to_owned(),
        activation_date: date(2025, 1, 1),
        duration_months: 12,
        disposable: false,
        provider_due_day: None,
        supplier: None,
        slots: (1..=slot_count)
            .map(|i| NewSlot {
                label: format!("Per {i}"),
                pin: Some(format!("{i}{i}{i}{i}")),
            })
            .collect(),
    }
}

/// A one-month slot sale starting 2025-01-15.
pub(crate) fn slot_sale(phone: &str, name: &str, slot: SlotUuid, price: i64) -> NewSale {
    NewSale {
        client_phone: Phone::new(phone),
        client_name: name.to_owned(),
        target: SaleTarget::Slot(slot),
        price,
        payment_method: PaymentMethod::Nequi,
        start_date: date(2025, 1, 15),
        months: 1,
        description: None,
    }
}

/// A one-month combo over the given slots, starting 2025-01-15.
pub(crate) fn combo_sale(phone: &str, name: &str, slots: &[SlotUuid]) -> NewComboSale {
    NewComboSale {
        client_phone: Phone::new(phone),
        client_name: name.to_owned(),
        payment_method: PaymentMethod::Bancolombia,
        start_date: date(2025, 1, 15),
        months: 1,
        items: slots
            .iter()
            .map(|&slot| ComboItem { slot, price: 12_000 })
            .collect(),
    }
}

/// A wall-clock instant inside the welcome-message service window.
pub(crate) fn daytime() -> DateTime {
    date(2025, 1, 15).at(10, 0, 0, 0)
}
