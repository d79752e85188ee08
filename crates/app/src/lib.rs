//! Shared-credential pool services: domain records, the transactional
//! ledger, and the allocation / release / swap / reconciliation engines.

pub mod context;
pub mod domain;
pub mod ids;
pub mod ledger;
pub mod notify;

#[cfg(test)]
mod test;
