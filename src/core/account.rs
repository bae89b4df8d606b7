use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::transaction::Amount;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> AccountId {
        AccountId(id.to_owned())
    }

    pub fn generate() -> AccountId {
        let raw = Uuid::new_v4().simple().to_string();
        AccountId(format!("acc-{}", &raw[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId {}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId::new(id)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let disp = match self {
            Self::Checking => "checking",
            Self::Savings => "savings"
        };
        write!(f, "{}", disp)
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            other => Err(format!("unknown account kind: {}", other))
        }
    }
}

/// Display-only, like [`AccountDetails`]: transfers do not check it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Frozen,
    Closed
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let disp = match self {
            Self::Active => "active",
            Self::Frozen => "frozen",
            Self::Closed => "closed"
        };
        write!(f, "{}", disp)
    }
}

/// Display-only information shown on the account page.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct AccountDetails {
    pub holder: String,
    pub branch: String,
    pub routing_number: String,
    pub features: Vec<String>
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Masked account number, e.g. `****4521`.
    pub number: String,
    pub kind: AccountKind,
    pub balance: Amount,
    /// Balance minus holds. Equal to `balance` when nothing is held.
    pub available_balance: Amount,
    pub currency: String,
    pub status: AccountStatus,
    pub is_default: bool,
    pub opened_on: NaiveDate,
    #[serde(default)]
    pub details: AccountDetails
}

impl Account {
    /// Masks all but the last four digits of a full account number.
    pub fn mask_number(full: &str) -> String {
        let digits: Vec<char> = full.chars().filter(|c| c.is_ascii_digit()).collect();
        let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        format!("****{}", tail)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.kind, self.number)
    }
}

/// Request to open a new account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub initial_deposit: Amount,
    #[serde(default = "NewAccount::default_currency")]
    pub currency: String,
    #[serde(default)]
    pub make_default: bool
}

impl NewAccount {
    pub fn new(name: &str, kind: AccountKind) -> NewAccount {
        NewAccount {
            name: name.to_owned(),
            kind,
            initial_deposit: Amount::ZERO,
            currency: NewAccount::default_currency(),
            make_default: false
        }
    }

    fn default_currency() -> String {
        "USD".to_owned()
    }
}

/// Partial update of an account's user-editable settings.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountSettings {
    pub name: Option<String>,
    pub status: Option<AccountStatus>,
    pub is_default: Option<bool>
}
