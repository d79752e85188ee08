//! Streampool domain concerns.

pub mod clients;
pub mod inventory;
pub mod reconciliation;
pub mod sales;
pub mod swaps;
