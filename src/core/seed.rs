//! Fixed dataset used the first time a storage area is opened.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::core::account::{Account, AccountDetails, AccountId, AccountKind, AccountStatus};
use crate::core::ledger::LedgerState;
use crate::core::profile::{DisplayMode, Profile};
use crate::core::savings::{SavingsBook, SavingsGoal};
use crate::core::transaction::{Transaction, TransactionId};

pub const CHECKING_ID: &str = "acc-checking-001";
pub const SAVINGS_ID: &str = "acc-savings-001";

const HOLDER: &str = "Alex Morgan";
const BRANCH: &str = "Downtown Main";
const ROUTING_NUMBER: &str = "021000021";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn seeded(id: &str, account: &str, credit: bool, amount: Decimal, description: &str,
          category: &str, (y, m, d, h): (i32, u32, u32, u32)) -> Transaction {
    let timestamp = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap_or_default();
    let account = AccountId::new(account);
    let mut transaction = if credit {
        Transaction::credit(&account, amount, description, category, timestamp)
    } else {
        Transaction::debit(&account, amount, description, category, timestamp)
    };
    transaction.id = TransactionId::new(id);
    transaction
}

pub fn initial_ledger() -> LedgerState {
    let checking = Account {
        id: AccountId::new(CHECKING_ID),
        name: "Primary Checking".to_owned(),
        number: Account::mask_number("4820193374521"),
        kind: AccountKind::Checking,
        balance: Decimal::new(254387, 2),
        available_balance: Decimal::new(254387, 2),
        currency: "USD".to_owned(),
        status: AccountStatus::Active,
        is_default: true,
        opened_on: date(2019, 3, 15),
        details: AccountDetails {
            holder: HOLDER.to_owned(),
            branch: BRANCH.to_owned(),
            routing_number: ROUTING_NUMBER.to_owned(),
            features: vec!["Debit card".to_owned(), "Online bill pay".to_owned(), "Mobile deposit".to_owned()]
        }
    };
    let savings = Account {
        id: AccountId::new(SAVINGS_ID),
        name: "High-Yield Savings".to_owned(),
        number: Account::mask_number("4820193378893"),
        kind: AccountKind::Savings,
        balance: Decimal::new(1575052, 2),
        available_balance: Decimal::new(1575052, 2),
        currency: "USD".to_owned(),
        status: AccountStatus::Active,
        is_default: false,
        opened_on: date(2020, 7, 1),
        details: AccountDetails {
            holder: HOLDER.to_owned(),
            branch: BRANCH.to_owned(),
            routing_number: ROUTING_NUMBER.to_owned(),
            features: vec!["4.25% APY".to_owned(), "No monthly fee".to_owned()]
        }
    };

    let transactions = vec![
        seeded("txn-seed-001", CHECKING_ID, true, Decimal::new(325000, 2),
            "Payroll deposit", "Income", (2024, 3, 1, 9)),
        seeded("txn-seed-002", CHECKING_ID, false, Decimal::new(145000, 2),
            "Rent payment", "Housing", (2024, 3, 2, 10)),
        seeded("txn-seed-003", CHECKING_ID, false, Decimal::new(8743, 2),
            "Whole Foods Market", "Groceries", (2024, 3, 4, 18)),
        seeded("txn-seed-004", CHECKING_ID, false, Decimal::new(1599, 2),
            "Netflix", "Entertainment", (2024, 3, 5, 7)),
        seeded("txn-seed-005", SAVINGS_ID, true, Decimal::new(5512, 2),
            "Interest payment", "Interest", (2024, 3, 31, 23)),
    ];

    LedgerState::new(vec![checking, savings], transactions)
}

pub fn initial_profile() -> Profile {
    Profile {
        name: HOLDER.to_owned(),
        email: "alex.morgan@example.com".to_owned(),
        phone: Some("+1 (555) 010-4477".to_owned()),
        address: Some("118 Harbor Street, Springfield".to_owned()),
        member_since: date(2019, 3, 15)
    }
}

pub fn initial_savings() -> SavingsBook {
    SavingsBook {
        goals: vec![
            SavingsGoal {
                id: "goal-emergency".to_owned(),
                name: "Emergency Fund".to_owned(),
                target: Decimal::new(1000000, 2),
                saved: Decimal::new(650000, 2),
                deadline: Some(date(2025, 12, 31))
            },
            SavingsGoal {
                id: "goal-vacation".to_owned(),
                name: "Summer Vacation".to_owned(),
                target: Decimal::new(300000, 2),
                saved: Decimal::new(120000, 2),
                deadline: Some(date(2025, 6, 1))
            },
        ]
    }
}

pub fn initial_display_mode() -> DisplayMode {
    DisplayMode::Light
}
