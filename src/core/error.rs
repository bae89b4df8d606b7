use thiserror::Error;

use crate::core::{AccountId, Amount};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Occurs when an amount does not parse to a positive decimal,
    /// or a deposit/target is negative.
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
    /// Occurs when a transfer names the same account on both sides.
    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),
    /// Occurs when an operation references an account id
    /// which does not exist on the ledger.
    #[error("no such account: {0}")]
    UnknownAccount(AccountId),
    /// Occurs when the source balance is below the requested amount.
    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds {
        available: Amount,
        requested: Amount
    },
    /// Occurs when a balance or total would leave the representable range.
    #[error("amount out of range")]
    AmountOverflow,
    #[error("name must not be empty")]
    InvalidName,
    #[error("no such savings goal: {0}")]
    UnknownGoal(String)
}

pub type LedgerResult<T> = Result<T, LedgerError>;
