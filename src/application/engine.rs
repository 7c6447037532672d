use super::recorder::ErrorRecorder;
use crate::domain::card::{Amount, Card, CardStatus, CardType, ACTIVATION_THRESHOLD};
use crate::domain::ports::{
    CardStore, CardStoreBox, Notifier, NotifierBox, ScoreSource, ScoreSourceBox, TransactionStore,
    TransactionStoreBox, UserStore, UserStoreBox,
};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{CardError, Result};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

/// The main entry point for card lifecycle and balance-mutating operations.
///
/// `CardEngine` owns the storage and notification ports and enforces the
/// per-type balance invariants. Every mutating operation wraps its body: on
/// failure an error record is persisted best-effort before the original error
/// is re-raised to the caller. Store writes and notification sends are not
/// transactional with each other; a failed send leaves the committed write in
/// place.
pub struct CardEngine {
    cards: CardStoreBox,
    transactions: TransactionStoreBox,
    users: UserStoreBox,
    notifier: NotifierBox,
    scores: ScoreSourceBox,
    recorder: ErrorRecorder,
}

impl CardEngine {
    pub fn new(
        cards: CardStoreBox,
        transactions: TransactionStoreBox,
        users: UserStoreBox,
        notifier: NotifierBox,
        scores: ScoreSourceBox,
        recorder: ErrorRecorder,
    ) -> Self {
        Self {
            cards,
            transactions,
            users,
            notifier,
            scores,
            recorder,
        }
    }

    /// Creates a card for `user_id`.
    ///
    /// The requested type parses case-insensitively; absent or blank input
    /// defaults to DEBIT. At most one card per (user, type) pair may exist.
    pub async fn create_card(&self, user_id: Uuid, requested_type: Option<&str>) -> Result<Card> {
        match self.create_card_inner(user_id, requested_type).await {
            Ok(card) => Ok(card),
            Err(err) => {
                // Duplicate-card conflicts are recorded at the point of
                // detection, against the existing card.
                if !matches!(err, CardError::Conflict(_)) {
                    let raw = format!(
                        "create_card: user={user_id}, type={}",
                        requested_type.unwrap_or("")
                    );
                    self.recorder.log(None, &err, Some(raw)).await;
                }
                Err(err)
            }
        }
    }

    async fn create_card_inner(
        &self,
        user_id: Uuid,
        requested_type: Option<&str>,
    ) -> Result<Card> {
        let card_type = CardType::parse_request(requested_type)?;
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| CardError::NotFound(format!("user {user_id}")))?;

        let existing = self.cards.find_by_user(user_id).await?;
        if let Some(dup) = existing.iter().find(|c| c.card_type == card_type) {
            let err = CardError::Conflict("user already has a card of this type".to_string());
            let raw = format!("create_card: user={user_id}, type={card_type}");
            self.recorder.log(Some(dup.uuid), &err, Some(raw)).await;
            return Err(err);
        }

        let card = match card_type {
            CardType::Debit => Card::new_debit(user_id),
            CardType::Credit => Card::new_credit(user_id, self.scores.draw()),
        };
        self.cards.put(card.clone()).await?;
        tracing::info!(card = %card.uuid, user = %user_id, card_type = %card_type, "card created");

        self.notifier
            .send(
                "CARD.CREATE",
                json!({
                    "date": Utc::now(),
                    "type": card.card_type,
                    "balance": card.balance,
                    "userId": user.uuid,
                    "userEmail": user.email,
                }),
            )
            .await?;

        Ok(card)
    }

    /// Activates the caller's card once it has accumulated enough purchases.
    ///
    /// Below the threshold the error reports the exact progress, e.g. `7/10`.
    /// Repeat calls on an activated card reapply the transition and re-notify;
    /// that is accepted behavior, not deduplicated.
    pub async fn activate_card(&self, user_id: Uuid) -> Result<Card> {
        match self.activate_card_inner(user_id).await {
            Ok(card) => Ok(card),
            Err(err) => {
                let raw = format!("activate_card: user={user_id}");
                self.recorder.log(None, &err, Some(raw)).await;
                Err(err)
            }
        }
    }

    async fn activate_card_inner(&self, user_id: Uuid) -> Result<Card> {
        // First match; the store has no unique-key path for (user, type).
        let mut card = self
            .cards
            .find_by_user(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CardError::NotFound(format!("card for user {user_id}")))?;

        let have = self.purchase_count(card.uuid).await?;
        if have < ACTIVATION_THRESHOLD {
            return Err(CardError::ActivationThreshold {
                have,
                need: ACTIVATION_THRESHOLD,
            });
        }

        card.activate();
        self.cards.put(card.clone()).await?;
        self.notify_activated(&card).await?;
        Ok(card)
    }

    /// Records a purchase against the card, drawing down its balance.
    ///
    /// For a pending credit card, spending also re-runs the activation check.
    pub async fn purchase(&self, card_id: Uuid, merchant: &str, amount: Amount) -> Result<Transaction> {
        match self.purchase_inner(card_id, merchant, amount).await {
            Ok(tx) => Ok(tx),
            Err(err) => {
                let raw = format!("purchase: merchant={merchant}, amount={}", amount.value());
                self.recorder.log(Some(card_id), &err, Some(raw)).await;
                Err(err)
            }
        }
    }

    async fn purchase_inner(
        &self,
        card_id: Uuid,
        merchant: &str,
        amount: Amount,
    ) -> Result<Transaction> {
        let mut card = self.fetch_card(card_id).await?;
        card.charge(amount)?;
        self.cards.put(card.clone()).await?;

        let tx = Transaction::new(card.uuid, merchant, amount, TransactionKind::Purchase);
        self.transactions.store(tx.clone()).await?;

        // Spending is itself an activation trigger for pending credit cards;
        // an unmet threshold is not an error here.
        if card.card_type == CardType::Credit && card.status == CardStatus::Pending {
            let have = self.purchase_count(card.uuid).await?;
            if have >= ACTIVATION_THRESHOLD {
                card.activate();
                self.cards.put(card.clone()).await?;
                self.notify_activated(&card).await?;
            }
        }

        self.notify_transaction("TRANSACTION.PURCHASE", &tx).await?;
        Ok(tx)
    }

    /// Deposits funds onto a debit card.
    pub async fn save(&self, card_id: Uuid, merchant: &str, amount: Amount) -> Result<Transaction> {
        match self.save_inner(card_id, merchant, amount).await {
            Ok(tx) => Ok(tx),
            Err(err) => {
                let raw = format!("save: merchant={merchant}, amount={}", amount.value());
                self.recorder.log(Some(card_id), &err, Some(raw)).await;
                Err(err)
            }
        }
    }

    async fn save_inner(
        &self,
        card_id: Uuid,
        merchant: &str,
        amount: Amount,
    ) -> Result<Transaction> {
        let mut card = self.fetch_card(card_id).await?;
        card.save_funds(amount)?;
        self.cards.put(card.clone()).await?;

        let tx = Transaction::new(card.uuid, merchant, amount, TransactionKind::Saving);
        self.transactions.store(tx.clone()).await?;

        self.notify_transaction("TRANSACTION.SAVE", &tx).await?;
        Ok(tx)
    }

    /// Pays down a credit card balance, floored at zero.
    pub async fn pay_credit(
        &self,
        card_id: Uuid,
        merchant: &str,
        amount: Amount,
    ) -> Result<Transaction> {
        match self.pay_credit_inner(card_id, merchant, amount).await {
            Ok(tx) => Ok(tx),
            Err(err) => {
                let raw = format!("pay_credit: merchant={merchant}, amount={}", amount.value());
                self.recorder.log(Some(card_id), &err, Some(raw)).await;
                Err(err)
            }
        }
    }

    async fn pay_credit_inner(
        &self,
        card_id: Uuid,
        merchant: &str,
        amount: Amount,
    ) -> Result<Transaction> {
        let mut card = self.fetch_card(card_id).await?;
        card.pay_balance(amount)?;
        self.cards.put(card.clone()).await?;

        let tx = Transaction::new(card.uuid, merchant, amount, TransactionKind::PaymentBalance);
        self.transactions.store(tx.clone()).await?;

        self.notify_transaction("TRANSACTION.PAID", &tx).await?;
        Ok(tx)
    }

    async fn fetch_card(&self, card_id: Uuid) -> Result<Card> {
        self.cards
            .get(card_id)
            .await?
            .ok_or_else(|| CardError::NotFound(format!("card {card_id}")))
    }

    async fn purchase_count(&self, card_id: Uuid) -> Result<usize> {
        Ok(self
            .transactions
            .for_card(card_id)
            .await?
            .iter()
            .filter(|t| t.kind == TransactionKind::Purchase)
            .count())
    }

    async fn notify_activated(&self, card: &Card) -> Result<()> {
        tracing::info!(card = %card.uuid, "card activated");
        self.notifier
            .send(
                "CARD.ACTIVATE",
                json!({
                    "date": Utc::now(),
                    "type": card.card_type,
                    "status": card.status,
                    "userId": card.user_id,
                }),
            )
            .await
    }

    async fn notify_transaction(&self, event: &str, tx: &Transaction) -> Result<()> {
        self.notifier
            .send(
                event,
                json!({
                    "date": Utc::now(),
                    "type": tx.kind,
                    "amount": tx.amount,
                    "merchant": tx.merchant,
                    "cardId": tx.card_id,
                }),
            )
            .await
    }
}
