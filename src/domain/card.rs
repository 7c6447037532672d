use crate::error::CardError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

/// Number of PURCHASE transactions required to activate a pending card.
pub const ACTIVATION_THRESHOLD: usize = 10;

/// Represents a monetary value with decimal precision.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for financial calculations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// Represents a positive monetary amount for transactions.
///
/// Ensures that transaction amounts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, CardError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CardError::InvalidArgument(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CardError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

// Implement basic arithmetic for Balance to make it a usable Value Object
impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Debit,
    Credit,
}

impl CardType {
    /// Parses an inbound request string. Absent or blank input defaults to DEBIT.
    pub fn parse_request(raw: Option<&str>) -> Result<Self, CardError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::Debit),
            Some(s) => match s.to_ascii_uppercase().as_str() {
                "DEBIT" => Ok(Self::Debit),
                "CREDIT" => Ok(Self::Credit),
                other => Err(CardError::InvalidArgument(format!(
                    "unknown card type {other:?}"
                ))),
            },
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => f.write_str("DEBIT"),
            Self::Credit => f.write_str("CREDIT"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Pending,
    Activated,
}

/// A debit or credit instrument bound to one user.
///
/// For DEBIT cards `balance` is the available funds; for CREDIT cards it is the
/// remaining available credit, seeded from the placeholder score at creation
/// and drawn down by purchases. `version` is the optimistic-concurrency token:
/// every mutation bumps it and stores only accept a write whose version is
/// exactly one ahead of the persisted record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub uuid: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub status: CardStatus,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Card {
    /// Debit cards start activated with an empty balance.
    pub fn new_debit(user_id: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            card_type: CardType::Debit,
            status: CardStatus::Activated,
            balance: Balance::ZERO,
            created_at: Utc::now(),
            version: 1,
        }
    }

    /// Credit cards start pending, with the credit line seeded from `score`.
    pub fn new_credit(user_id: Uuid, score: u8) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            card_type: CardType::Credit,
            status: CardStatus::Pending,
            balance: Self::seed_credit_line(score),
            created_at: Utc::now(),
            version: 1,
        }
    }

    /// Maps a placeholder score in `[0, 100)` linearly onto `[100, 10_000_000)`.
    pub fn seed_credit_line(score: u8) -> Balance {
        let score = Decimal::from(score);
        let floor = Decimal::from(100);
        let ceiling = Decimal::from(10_000_000);
        Balance(floor + (score / Decimal::from(100)) * (ceiling - floor))
    }

    /// Charges a purchase against the card.
    ///
    /// Both card types require `balance >= amount`; the failure differs because
    /// a debit balance is owned funds while a credit balance is remaining credit.
    pub fn charge(&mut self, amount: Amount) -> Result<(), CardError> {
        let debit = Balance::from(amount);
        if self.balance < debit {
            return Err(match self.card_type {
                CardType::Debit => CardError::InsufficientFunds,
                CardType::Credit => CardError::CreditLimitExceeded,
            });
        }
        self.balance -= debit;
        self.version += 1;
        Ok(())
    }

    /// Deposits funds onto a debit card.
    pub fn save_funds(&mut self, amount: Amount) -> Result<(), CardError> {
        if self.card_type != CardType::Debit {
            return Err(CardError::InvalidOperation(
                "only debit cards can save balance".to_string(),
            ));
        }
        self.balance += amount.into();
        self.version += 1;
        Ok(())
    }

    /// Pays down a credit card balance, floored at zero.
    pub fn pay_balance(&mut self, amount: Amount) -> Result<(), CardError> {
        if self.card_type != CardType::Credit {
            return Err(CardError::InvalidOperation(
                "only credit cards can pay balance".to_string(),
            ));
        }
        let next = self.balance - amount.into();
        self.balance = if next < Balance::ZERO {
            Balance::ZERO
        } else {
            next
        };
        self.version += 1;
        Ok(())
    }

    /// Marks the card activated. Reapplying the transition is a no-op effect.
    pub fn activate(&mut self) {
        self.status = CardStatus::Activated;
        self.version += 1;
    }
}
