mod core;
pub mod backend;
pub mod app;

pub use crate::core::{Account, AccountId, AccountKind, AccountSettings, AccountStatus,
    Amount, LedgerError, LedgerResult, LedgerState, NewAccount, Transaction, TransferReceipt,
    parse_amount};
pub use crate::core::{account, transaction, ledger, savings, profile, seed};
pub use crate::app::AppState;
