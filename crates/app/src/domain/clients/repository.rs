//! Clients repository.

use jiff::Timestamp;

use crate::{
    domain::clients::records::ClientRecord,
    ids::Phone,
    ledger::{LedgerError, LedgerTx},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct ClientsRepository;

impl ClientsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn get(&self, tx: &LedgerTx, phone: &Phone) -> Result<ClientRecord, LedgerError> {
        tx.records()
            .clients
            .get(phone)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    /// Creates the client, or refreshes the display name of an existing one.
    pub(crate) fn upsert(&self, tx: &mut LedgerTx, phone: Phone, name: String) -> ClientRecord {
        let clients = &mut tx.records_mut().clients;

        match clients.get_mut(&phone) {
            Some(client) => {
                client.name = name;

                client.clone()
            }
            None => {
                let record = ClientRecord {
                    phone: phone.clone(),
                    name,
                    created_at: Timestamp::now(),
                };

                clients.insert(phone, record.clone());

                record
            }
        }
    }
}
