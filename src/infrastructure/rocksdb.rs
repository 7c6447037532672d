use crate::domain::card::Card;
use crate::domain::error_record::ErrorRecord;
use crate::domain::ports::{CardStore, ErrorStore, TransactionStore, UserStore};
use crate::domain::transaction::Transaction;
use crate::domain::user::User;
use crate::error::{CardError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for card records.
pub const CF_CARDS: &str = "cards";
/// Column Family for transaction history.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for user records.
pub const CF_USERS: &str = "users";
/// Column Family for the error log.
pub const CF_ERRORS: &str = "card-errors";

/// A persistent store implementation using RocksDB.
///
/// One Column Family per logical table, JSON-serialized values keyed by the
/// record's uuid. This struct is thread-safe (`Clone` shares the underlying
/// `Arc<DB>`), so the same handle backs every store port.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_CARDS, CF_TRANSACTIONS, CF_USERS, CF_ERRORS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| CardError::Storage(format!("{name} column family not found")))
    }

    fn put_record<T: Serialize>(&self, cf_name: &str, id: Uuid, record: &T) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(&cf, id.as_bytes(), value)?;
        Ok(())
    }

    fn get_record<T: DeserializeOwned>(&self, cf_name: &str, id: Uuid) -> Result<Option<T>> {
        let cf = self.cf_handle(cf_name)?;
        match self.db.get_cf(&cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_records<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf_handle(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl CardStore for RocksDBStore {
    async fn put(&self, card: Card) -> Result<()> {
        // Conditional write: the incoming version must be exactly one ahead
        // of the persisted record (or 1 for a new record).
        let current: Option<Card> = self.get_record(CF_CARDS, card.uuid)?;
        let expected = current.map(|c| c.version + 1).unwrap_or(1);
        if card.version != expected {
            return Err(CardError::VersionConflict(card.uuid));
        }
        self.put_record(CF_CARDS, card.uuid, &card)
    }

    async fn get(&self, card_id: Uuid) -> Result<Option<Card>> {
        self.get_record(CF_CARDS, card_id)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .scan_records::<Card>(CF_CARDS)?
            .into_iter()
            .filter(|c| c.user_id == user_id)
            .collect();
        cards.sort_by_key(|c| c.created_at);
        Ok(cards)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        self.put_record(CF_TRANSACTIONS, tx.uuid, &tx)
    }

    async fn for_card(&self, card_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .scan_records::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|t| t.card_id == card_id)
            .collect())
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        self.get_record(CF_USERS, user_id)
    }

    async fn put(&self, user: User) -> Result<()> {
        self.put_record(CF_USERS, user.uuid, &user)
    }
}

#[async_trait]
impl ErrorStore for RocksDBStore {
    async fn store(&self, record: ErrorRecord) -> Result<()> {
        self.put_record(CF_ERRORS, record.uuid, &record)
    }
}
