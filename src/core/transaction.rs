use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use colored::Colorize;
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::account::AccountId;
use crate::core::error::{LedgerError, LedgerResult};

pub type Amount = Decimal;

/// Parses user input into a strictly positive amount.
pub fn parse_amount(text: &str) -> LedgerResult<Amount> {
    let amount = Decimal::from_str(text.trim())
        .map_err(|_| LedgerError::InvalidAmount(text.to_owned()))?;
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(text.to_owned()));
    }
    return Ok(amount);
}

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: &str) -> TransactionId {
        TransactionId(id.to_owned())
    }

    pub fn generate() -> TransactionId {
        TransactionId(format!("txn-{}", Uuid::new_v4().simple()))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId {}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let disp = match self {
            Self::Debit => "debit",
            Self::Credit => "credit"
        };
        write!(f, "{}", disp)
    }
}

/// One entry on an account's statement. The amount is always positive,
/// the sign lives in `direction`.
#[serde_with::skip_serializing_none]
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub direction: Direction,
    pub description: String,
    pub category: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    /// Shared by the two legs of a transfer.
    #[serde(default)]
    pub transfer_id: Option<String>
}

impl Transaction {
    pub fn new(account_id: &AccountId, direction: Direction, amount: Amount,
               description: &str, category: &str, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            account_id: account_id.clone(),
            direction,
            description: description.to_owned(),
            category: category.to_owned(),
            amount,
            timestamp,
            transfer_id: None
        }
    }

    pub fn debit(account_id: &AccountId, amount: Amount, description: &str, category: &str,
                 timestamp: DateTime<Utc>) -> Transaction {
        Transaction::new(account_id, Direction::Debit, amount, description, category, timestamp)
    }

    pub fn credit(account_id: &AccountId, amount: Amount, description: &str, category: &str,
                  timestamp: DateTime<Utc>) -> Transaction {
        Transaction::new(account_id, Direction::Credit, amount, description, category, timestamp)
    }

    /// Amount with the direction applied: negative for debits.
    pub fn signed_amount(&self) -> Amount {
        match self.direction {
            Direction::Debit => -self.amount,
            Direction::Credit => self.amount
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = match self.direction {
            Direction::Debit => format!("-{}", self.amount).bright_red(),
            Direction::Credit => format!("+{}", self.amount).green()
        };
        write!(f, "{} {}: {} [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.account_id.to_string().bold(),
            self.description,
            self.category,
            amount)
    }
}
