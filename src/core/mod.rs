pub mod account;
pub mod transaction;
pub mod ledger;
pub mod savings;
pub mod profile;
pub mod seed;
pub mod error;

pub use account::{Account, AccountId, AccountKind, AccountSettings, AccountStatus, NewAccount};
pub use transaction::{Amount, Transaction, parse_amount};
pub use ledger::{LedgerState, TransferReceipt};
pub use error::{LedgerError, LedgerResult};
