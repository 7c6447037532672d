use crate::domain::card::Card;
use crate::domain::error_record::ErrorRecord;
use crate::domain::ports::{
    CardStore, ErrorStore, Notifier, ReportSink, ScoreSource, TransactionStore, UserStore,
};
use crate::domain::transaction::Transaction;
use crate::domain::user::User;
use crate::error::{CardError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for cards.
///
/// Uses `Arc<RwLock<HashMap<Uuid, Card>>>` to allow shared concurrent access.
/// Enforces the same conditional-put rule as the persistent backend, so the
/// optimistic-concurrency path is exercised even in tests.
#[derive(Default, Clone)]
pub struct InMemoryCardStore {
    cards: Arc<RwLock<HashMap<Uuid, Card>>>,
}

impl InMemoryCardStore {
    /// Creates a new, empty in-memory card store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn put(&self, card: Card) -> Result<()> {
        let mut cards = self.cards.write().await;
        let expected = cards.get(&card.uuid).map(|c| c.version + 1).unwrap_or(1);
        if card.version != expected {
            return Err(CardError::VersionConflict(card.uuid));
        }
        cards.insert(card.uuid, card);
        Ok(())
    }

    async fn get(&self, card_id: Uuid) -> Result<Option<Card>> {
        let cards = self.cards.read().await;
        Ok(cards.get(&card_id).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Card>> {
        let cards = self.cards.read().await;
        let mut found: Vec<Card> = cards
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.created_at);
        Ok(found)
    }
}

/// A thread-safe in-memory store for transactions.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<Uuid, Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.uuid, tx);
        Ok(())
    }

    async fn for_card(&self, card_id: Uuid) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| t.card_id == card_id)
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for user records.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn put(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.uuid, user);
        Ok(())
    }
}

/// An append-only in-memory error log with a test accessor.
#[derive(Default, Clone)]
pub struct InMemoryErrorStore {
    records: Arc<RwLock<Vec<ErrorRecord>>>,
}

impl InMemoryErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ErrorRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ErrorStore for InMemoryErrorStore {
    async fn store(&self, record: ErrorRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }
}

/// Report sink that keeps uploaded blobs in memory, keyed by (bucket, key).
#[derive(Default, Clone)]
pub struct InMemoryReportSink {
    objects: Arc<RwLock<HashMap<(String, String), (Vec<u8>, String)>>>,
}

impl InMemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        let objects = self.objects.read().await;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ReportSink for InMemoryReportSink {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let mut objects = self.objects.write().await;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            (bytes, content_type.to_string()),
        );
        Ok(())
    }
}

/// Notifier that records every event for later assertions.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<(String, serde_json::Value)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event names in send order.
    pub async fn events(&self) -> Vec<String> {
        self.sent.read().await.iter().map(|(e, _)| e.clone()).collect()
    }

    /// Full (event, payload) pairs in send order.
    pub async fn messages(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, event: &str, payload: serde_json::Value) -> Result<()> {
        let mut sent = self.sent.write().await;
        sent.push((event.to_string(), payload));
        Ok(())
    }
}

/// Deterministic score source for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedScore(pub u8);

impl ScoreSource for FixedScore {
    fn draw(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{Amount, Balance};
    use crate::domain::transaction::TransactionKind;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_card_store() {
        let store = InMemoryCardStore::new();
        let card = Card::new_debit(Uuid::new_v4());

        store.put(card.clone()).await.unwrap();
        let retrieved = store.get(card.uuid).await.unwrap().unwrap();
        assert_eq!(retrieved, card);

        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_rejects_stale_version() {
        let store = InMemoryCardStore::new();
        let mut card = Card::new_debit(Uuid::new_v4());
        card.balance = Balance::new(dec!(100));
        store.put(card.clone()).await.unwrap();

        // Two readers mutate the same snapshot; the second write is stale.
        let mut first = store.get(card.uuid).await.unwrap().unwrap();
        let mut second = store.get(card.uuid).await.unwrap().unwrap();

        first.charge(Amount::new(dec!(10)).unwrap()).unwrap();
        store.put(first).await.unwrap();

        second.charge(Amount::new(dec!(20)).unwrap()).unwrap();
        let result = store.put(second).await;
        assert!(matches!(result, Err(CardError::VersionConflict(_))));

        let stored = store.get(card.uuid).await.unwrap().unwrap();
        assert_eq!(stored.balance, Balance::new(dec!(90)));
    }

    #[tokio::test]
    async fn test_put_rejects_unseen_version_gap() {
        let store = InMemoryCardStore::new();
        let mut card = Card::new_debit(Uuid::new_v4());
        card.version = 3;
        let result = store.put(card).await;
        assert!(matches!(result, Err(CardError::VersionConflict(_))));
    }

    #[tokio::test]
    async fn test_find_by_user_filters() {
        let store = InMemoryCardStore::new();
        let user_id = Uuid::new_v4();
        let mine = Card::new_debit(user_id);
        let other = Card::new_debit(Uuid::new_v4());
        store.put(mine.clone()).await.unwrap();
        store.put(other).await.unwrap();

        let found = store.find_by_user(user_id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], mine);
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store() {
        let store = InMemoryTransactionStore::new();
        let card_id = Uuid::new_v4();
        let tx = Transaction::new(
            card_id,
            "shop",
            Amount::new(dec!(100.0)).unwrap(),
            TransactionKind::Purchase,
        );
        let unrelated = Transaction::new(
            Uuid::new_v4(),
            "other",
            Amount::new(dec!(5.0)).unwrap(),
            TransactionKind::Saving,
        );

        store.store(tx.clone()).await.unwrap();
        store.store(unrelated).await.unwrap();

        let for_card = store.for_card(card_id).await.unwrap();
        assert_eq!(for_card, vec![tx]);
    }

    #[tokio::test]
    async fn test_in_memory_report_sink_round_trip() {
        let sink = InMemoryReportSink::new();
        sink.upload("bucket", "key.csv", b"data".to_vec(), "text/csv")
            .await
            .unwrap();

        let (bytes, content_type) = sink.object("bucket", "key.csv").await.unwrap();
        assert_eq!(bytes, b"data");
        assert_eq!(content_type, "text/csv");
        assert!(sink.object("bucket", "missing").await.is_none());
    }
}
