use super::recorder::ErrorRecorder;
use crate::domain::ports::{
    CardStore, CardStoreBox, Notifier, NotifierBox, ReportSink, ReportSinkBox, TransactionStore,
    TransactionStoreBox, UserStore, UserStoreBox,
};
use crate::error::{CardError, Result};
use crate::interfaces::csv::report_writer::write_report;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

/// Location handle for an uploaded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLocation {
    pub bucket: String,
    pub key: String,
}

/// Exports a card's transactions within a date range as a delimited-text blob.
///
/// Reads are side-effect-free relative to concurrent reports: each run scans,
/// filters, uploads under a fresh key, and notifies the card's owner.
pub struct ReportGenerator {
    cards: CardStoreBox,
    transactions: TransactionStoreBox,
    users: UserStoreBox,
    sink: ReportSinkBox,
    notifier: NotifierBox,
    recorder: ErrorRecorder,
    bucket: String,
}

impl ReportGenerator {
    pub fn new(
        cards: CardStoreBox,
        transactions: TransactionStoreBox,
        users: UserStoreBox,
        sink: ReportSinkBox,
        notifier: NotifierBox,
        recorder: ErrorRecorder,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            cards,
            transactions,
            users,
            sink,
            notifier,
            recorder,
            bucket: bucket.into(),
        }
    }

    /// Generates and uploads the activity report for `card_id` over
    /// `[start, end]` inclusive. Both bounds are round-trip ISO-8601 strings.
    pub async fn generate(
        &self,
        card_id: Uuid,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<ReportLocation> {
        match self.generate_inner(card_id, start_iso, end_iso).await {
            Ok(location) => Ok(location),
            Err(err) => {
                let raw = format!("generate_report: start={start_iso}, end={end_iso}");
                self.recorder.log(Some(card_id), &err, Some(raw)).await;
                Err(err)
            }
        }
    }

    async fn generate_inner(
        &self,
        card_id: Uuid,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<ReportLocation> {
        let start = parse_iso(start_iso)?;
        let end = parse_iso(end_iso)?;

        let card = self
            .cards
            .get(card_id)
            .await?
            .ok_or_else(|| CardError::NotFound(format!("card {card_id}")))?;

        let mut rows: Vec<_> = self
            .transactions
            .for_card(card_id)
            .await?
            .into_iter()
            .filter(|t| t.created_at >= start && t.created_at <= end)
            .collect();
        rows.sort_by_key(|t| t.created_at);

        let body = write_report(&rows)?;
        let key = format!("reports/{card_id}/{}.csv", Uuid::new_v4());
        self.sink
            .upload(&self.bucket, &key, body, "text/csv")
            .await?;
        tracing::info!(card = %card_id, key = %key, rows = rows.len(), "report uploaded");

        let user = self
            .users
            .get(card.user_id)
            .await?
            .ok_or_else(|| CardError::NotFound(format!("user {}", card.user_id)))?;

        self.notifier
            .send(
                "REPORT.ACTIVITY",
                json!({
                    "date": Utc::now(),
                    "url": self.sink.public_url(&self.bucket, &key),
                    "userId": user.uuid,
                    "userEmail": user.email,
                }),
            )
            .await?;

        Ok(ReportLocation {
            bucket: self.bucket.clone(),
            key,
        })
    }
}

fn parse_iso(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| CardError::InvalidArgument(format!("invalid ISO-8601 timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{Amount, Card};
    use crate::domain::ports::{CardStore, TransactionStore, UserStore};
    use crate::domain::transaction::{Transaction, TransactionKind};
    use crate::domain::user::User;
    use crate::infrastructure::in_memory::{
        InMemoryCardStore, InMemoryErrorStore, InMemoryReportSink, InMemoryTransactionStore,
        InMemoryUserStore, RecordingNotifier,
    };
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Harness {
        reports: ReportGenerator,
        cards: InMemoryCardStore,
        transactions: InMemoryTransactionStore,
        users: InMemoryUserStore,
        sink: InMemoryReportSink,
        notifier: RecordingNotifier,
        errors: InMemoryErrorStore,
    }

    fn harness() -> Harness {
        let cards = InMemoryCardStore::new();
        let transactions = InMemoryTransactionStore::new();
        let users = InMemoryUserStore::new();
        let errors = InMemoryErrorStore::new();
        let sink = InMemoryReportSink::new();
        let notifier = RecordingNotifier::new();

        let reports = ReportGenerator::new(
            Box::new(cards.clone()),
            Box::new(transactions.clone()),
            Box::new(users.clone()),
            Box::new(sink.clone()),
            Box::new(notifier.clone()),
            ErrorRecorder::new(Box::new(errors.clone())),
            "card-reports",
        );

        Harness {
            reports,
            cards,
            transactions,
            users,
            sink,
            notifier,
            errors,
        }
    }

    async fn seed_card(h: &Harness) -> Card {
        let user = User {
            uuid: Uuid::new_v4(),
            document: "98765432".to_string(),
            email: "owner@example.com".to_string(),
        };
        h.users.put(user.clone()).await.unwrap();
        let card = Card::new_debit(user.uuid);
        h.cards.put(card.clone()).await.unwrap();
        card
    }

    fn window() -> (String, String) {
        let start = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let end = (Utc::now() + Duration::hours(1)).to_rfc3339();
        (start, end)
    }

    #[tokio::test]
    async fn test_empty_range_produces_header_only_report() {
        let h = harness();
        let card = seed_card(&h).await;
        let (start, end) = window();

        let location = h.reports.generate(card.uuid, &start, &end).await.unwrap();

        assert_eq!(location.bucket, "card-reports");
        assert!(location.key.starts_with(&format!("reports/{}/", card.uuid)));
        assert!(location.key.ends_with(".csv"));

        let (bytes, content_type) = h.sink.object(&location.bucket, &location.key).await.unwrap();
        assert_eq!(content_type, "text/csv");
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "\"uuid\",\"cardId\",\"amount\",\"merchant\",\"type\",\"createdAt\""
        );
        assert_eq!(text.lines().count(), 1);

        assert_eq!(h.notifier.events().await, vec!["REPORT.ACTIVITY".to_string()]);
    }

    #[tokio::test]
    async fn test_report_filters_and_sorts_rows() {
        let h = harness();
        let card = seed_card(&h).await;

        let mut older = Transaction::new(
            card.uuid,
            "first",
            Amount::new(dec!(1)).unwrap(),
            TransactionKind::Purchase,
        );
        older.created_at = Utc::now() - Duration::minutes(30);
        let newer = Transaction::new(
            card.uuid,
            "second",
            Amount::new(dec!(2)).unwrap(),
            TransactionKind::Purchase,
        );
        let mut ancient = Transaction::new(
            card.uuid,
            "out-of-range",
            Amount::new(dec!(3)).unwrap(),
            TransactionKind::Saving,
        );
        ancient.created_at = Utc::now() - Duration::days(30);

        // Insert newest-first to prove the report sorts ascending.
        h.transactions.store(newer).await.unwrap();
        h.transactions.store(older).await.unwrap();
        h.transactions.store(ancient).await.unwrap();

        let (start, end) = window();
        let location = h.reports.generate(card.uuid, &start, &end).await.unwrap();

        let (bytes, _) = h.sink.object(&location.bucket, &location.key).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"first\""));
        assert!(lines[2].contains("\"second\""));
        assert!(!text.contains("out-of-range"));
    }

    #[tokio::test]
    async fn test_malformed_timestamp_is_invalid_argument() {
        let h = harness();
        let card = seed_card(&h).await;

        let result = h
            .reports
            .generate(card.uuid, "yesterday", "2026-01-01T00:00:00Z")
            .await;
        assert!(matches!(result, Err(CardError::InvalidArgument(_))));
        // The failure wrapper recorded it against the card.
        let records = h.errors.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].card_id, Some(card.uuid));
        assert_eq!(
            records[0].raw_message.as_deref(),
            Some("generate_report: start=yesterday, end=2026-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_unknown_card_is_not_found() {
        let h = harness();
        let (start, end) = window();
        let result = h.reports.generate(Uuid::new_v4(), &start, &end).await;
        assert!(matches!(result, Err(CardError::NotFound(_))));
    }
}
