//! The per-user list of transaction records.
//!
//! Each user's records are stored as one JSON array under `Keys::transactions`. Records are
//! appended in the order they are registered.

use crate::model::{NewTransaction, TransactionRecord, User};
use crate::storage::{get_json, set_json, Keys, SharedStorage};
use crate::utils::generate_transaction_id;
use crate::Result;
use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info};

/// Reads and writes the transaction list of a user.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    storage: SharedStorage,
    keys: Keys,
}

impl TransactionStore {
    pub fn new(storage: SharedStorage, keys: Keys) -> Self {
        Self { storage, keys }
    }

    /// Returns every record of `user`. A user who has never registered anything has an empty list.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the stored list is malformed.
    pub async fn load(&self, user: &User) -> Result<Vec<TransactionRecord>> {
        let key = self.keys.transactions(user.id());
        let records: Vec<TransactionRecord> = get_json(self.storage.as_ref(), &key)
            .await?
            .unwrap_or_default();
        debug!("Loaded {} transactions from {key}", records.len());
        Ok(records)
    }

    /// Stamps `new` with an id and the current time and appends it to the list of `user`.
    pub async fn append(&self, user: &User, new: NewTransaction) -> Result<TransactionRecord> {
        let mut records = self.load(user).await?;
        let record = new.into_record(generate_transaction_id(), Utc::now());
        records.push(record.clone());
        self.save(user, &records)
            .await
            .context("Não foi possível salvar")?;
        info!("Registered transaction {}", record.id());
        Ok(record)
    }

    /// Removes the record with `id` from the list of `user` and returns it, or returns `None`
    /// without writing anything when no record has `id`.
    pub async fn remove(&self, user: &User, id: &str) -> Result<Option<TransactionRecord>> {
        let mut records = self.load(user).await?;
        let Some(ix) = records.iter().position(|r| r.id() == id) else {
            debug!("No transaction {id} to remove");
            return Ok(None);
        };
        let removed = records.remove(ix);
        self.save(user, &records).await?;
        info!("Removed transaction {id}");
        Ok(Some(removed))
    }

    async fn save(&self, user: &User, records: &[TransactionRecord]) -> Result<()> {
        let key = self.keys.transactions(user.id());
        set_json(self.storage.as_ref(), &key, records).await
    }
}
