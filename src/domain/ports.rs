use super::card::Card;
use super::error_record::ErrorRecord;
use super::transaction::Transaction;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Store port for card records.
///
/// `put` is conditional: the incoming card's `version` must be exactly one
/// ahead of the persisted record (or 1 for a new record). A stale write fails
/// with `CardError::VersionConflict` so the caller can re-read and retry.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn put(&self, card: Card) -> Result<()>;
    async fn get(&self, card_id: Uuid) -> Result<Option<Card>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Card>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn store(&self, tx: Transaction) -> Result<()>;
    async fn for_card(&self, card_id: Uuid) -> Result<Vec<Transaction>>;
}

/// Users are owned by an external identity system; `put` exists only for the
/// seeding adapter.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn put(&self, user: User) -> Result<()>;
}

#[async_trait]
pub trait ErrorStore: Send + Sync {
    async fn store(&self, record: ErrorRecord) -> Result<()>;
}

/// Object-store port for generated reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Public location of an uploaded object, used in notification payloads.
    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{bucket}/{key}")
    }
}

/// Fire-and-forget event sink backed by an asynchronous queue.
///
/// Failures propagate to the caller but never roll back store writes that
/// already happened.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &str, payload: serde_json::Value) -> Result<()>;
}

/// Source of placeholder credit scores in `[0, 100)`.
///
/// Injectable so tests can fix the score instead of reaching for a global RNG.
pub trait ScoreSource: Send + Sync {
    fn draw(&self) -> u8;
}

pub type CardStoreBox = Box<dyn CardStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type UserStoreBox = Box<dyn UserStore>;
pub type ErrorStoreBox = Box<dyn ErrorStore>;
pub type ReportSinkBox = Box<dyn ReportSink>;
pub type NotifierBox = Box<dyn Notifier>;
pub type ScoreSourceBox = Box<dyn ScoreSource>;
