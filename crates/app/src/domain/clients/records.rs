//! Client Records

use jiff::Timestamp;

use crate::ids::Phone;

/// A paying end-customer. Created or refreshed on every sale, never
/// hard-deleted here.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub phone: Phone,
    pub name: String,
    pub created_at: Timestamp,
}
