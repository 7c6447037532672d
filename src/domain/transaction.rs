use super::card::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Purchase,
    Saving,
    PaymentBalance,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase => f.write_str("PURCHASE"),
            Self::Saving => f.write_str("SAVING"),
            Self::PaymentBalance => f.write_str("PAYMENT_BALANCE"),
        }
    }
}

/// An immutable record of a balance-affecting event against a card.
///
/// Transactions are append-only; nothing in the system updates or deletes one
/// once written.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub uuid: Uuid,
    pub card_id: Uuid,
    pub amount: Amount,
    pub merchant: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        card_id: Uuid,
        merchant: impl Into<String>,
        amount: Amount,
        kind: TransactionKind,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            card_id,
            amount,
            merchant: merchant.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::PaymentBalance).unwrap(),
            "\"PAYMENT_BALANCE\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionKind::Purchase).unwrap(),
            "\"PURCHASE\""
        );
    }

    #[test]
    fn test_transaction_serializes_camel_case() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            "shop",
            Amount::new(dec!(10.0)).unwrap(),
            TransactionKind::Purchase,
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("cardId").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["type"], "PURCHASE");
    }
}
