use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::account::{Account, AccountId, AccountSettings, AccountStatus, AccountDetails, NewAccount};
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::transaction::{Amount, Transaction, TransactionId};

/// Accounts and their transactions, both kept in insertion order.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: String,
    pub debit_id: TransactionId,
    pub credit_id: TransactionId,
    pub amount: Amount,
    pub source_balance: Amount,
    pub destination_balance: Amount,
    pub timestamp: DateTime<Utc>
}

/// A problem found by [`LedgerState::audit`].
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum AuditIssue {
    OrphanTransaction { transaction: TransactionId, account: AccountId },
    NonPositiveAmount(TransactionId),
    DuplicateTransactionId(TransactionId),
    MultipleDefaults(Vec<AccountId>),
    AvailableExceedsBalance(AccountId),
    UnbalancedTransfer(String)
}

fn checked(amount: Option<Amount>) -> LedgerResult<Amount> {
    amount.ok_or(LedgerError::AmountOverflow)
}

impl LedgerState {
    pub fn new(accounts: Vec<Account>, transactions: Vec<Transaction>) -> LedgerState {
        LedgerState { accounts, transactions }
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| &account.id == id)
    }

    fn account_index(&self, id: &AccountId) -> LedgerResult<usize> {
        self.accounts.iter()
            .position(|account| &account.id == id)
            .ok_or_else(|| LedgerError::UnknownAccount(id.clone()))
    }

    pub fn default_account(&self) -> Option<&Account> {
        self.accounts.iter().find(|account| account.is_default)
    }

    pub fn transactions_for<'a>(&'a self, id: &'a AccountId) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions.iter().filter(move |t| &t.account_id == id)
    }

    pub fn total_balance(&self) -> LedgerResult<Amount> {
        self.accounts.iter()
            .try_fold(Amount::ZERO, |total, account| total.checked_add(account.balance))
            .ok_or(LedgerError::AmountOverflow)
    }

    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> LedgerResult<TransferReceipt> {
        self.transfer_at(from, to, amount, Utc::now())
    }

    /// Moves `amount` between two accounts and records a linked debit/credit pair.
    /// Every check runs before anything is changed, so a failed transfer leaves
    /// the state untouched.
    pub fn transfer_at(&mut self, from: &AccountId, to: &AccountId, amount: Amount,
                       timestamp: DateTime<Utc>) -> LedgerResult<TransferReceipt> {
        if amount <= Amount::ZERO {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        if from == to {
            return Err(LedgerError::SameAccount(from.clone()));
        }
        let source = self.account_index(from)?;
        let destination = self.account_index(to)?;

        let available = self.accounts[source].balance;
        if available < amount {
            log::info!("transfer of {} from {} rejected: balance {}", amount, from, available);
            return Err(LedgerError::InsufficientFunds { available, requested: amount });
        }

        let source_balance = checked(self.accounts[source].balance.checked_sub(amount))?;
        let source_available = checked(self.accounts[source].available_balance.checked_sub(amount))?;
        let destination_balance = checked(self.accounts[destination].balance.checked_add(amount))?;
        let destination_available = checked(self.accounts[destination].available_balance.checked_add(amount))?;

        let transfer_id = Uuid::new_v4().simple().to_string();
        let source_name = self.accounts[source].name.clone();
        let destination_name = self.accounts[destination].name.clone();

        let mut debit = Transaction::debit(from, amount,
            &format!("Transfer to {}", destination_name), "Transfer", timestamp);
        debit.transfer_id = Some(transfer_id.clone());
        let mut credit = Transaction::credit(to, amount,
            &format!("Transfer from {}", source_name), "Transfer", timestamp);
        credit.transfer_id = Some(transfer_id.clone());

        let source_account = &mut self.accounts[source];
        source_account.balance = source_balance;
        source_account.available_balance = source_available;

        let destination_account = &mut self.accounts[destination];
        destination_account.balance = destination_balance;
        destination_account.available_balance = destination_available;

        let receipt = TransferReceipt {
            transfer_id,
            debit_id: debit.id.clone(),
            credit_id: credit.id.clone(),
            amount,
            source_balance,
            destination_balance,
            timestamp
        };
        self.transactions.push(debit);
        self.transactions.push(credit);

        log::debug!("transferred {} from {} to {}", amount, from, to);
        return Ok(receipt);
    }

    pub fn create_account(&mut self, request: NewAccount) -> LedgerResult<AccountId> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }
        if request.initial_deposit < Amount::ZERO {
            return Err(LedgerError::InvalidAmount(request.initial_deposit.to_string()));
        }
        // keep the ledger total representable
        checked(self.total_balance()?.checked_add(request.initial_deposit))?;

        let now = Utc::now();
        let id = AccountId::generate();
        let digits = (Uuid::new_v4().as_u128() % 10_000_000_000).to_string();
        let make_default = request.make_default || self.default_account().is_none();

        let account = Account {
            id: id.clone(),
            name: name.to_owned(),
            number: Account::mask_number(&format!("{:0>10}", digits)),
            kind: request.kind,
            balance: request.initial_deposit,
            available_balance: request.initial_deposit,
            currency: request.currency,
            status: AccountStatus::Active,
            is_default: false,
            opened_on: now.date_naive(),
            details: AccountDetails::default()
        };
        self.accounts.push(account);
        if make_default {
            self.set_default(&id);
        }

        if request.initial_deposit > Amount::ZERO {
            self.transactions.push(Transaction::credit(&id, request.initial_deposit,
                "Initial deposit", "Deposit", now));
        }

        log::debug!("opened account {} ({})", id, name);
        return Ok(id);
    }

    pub fn update_account(&mut self, id: &AccountId, settings: AccountSettings) -> LedgerResult<()> {
        let index = self.account_index(id)?;
        let name = match &settings.name {
            Some(name) if name.trim().is_empty() => return Err(LedgerError::InvalidName),
            Some(name) => Some(name.trim().to_owned()),
            None => None
        };

        let account = &mut self.accounts[index];
        if let Some(name) = name {
            account.name = name;
        }
        if let Some(status) = settings.status {
            account.status = status;
        }
        match settings.is_default {
            Some(true) => self.set_default(id),
            Some(false) => self.accounts[index].is_default = false,
            None => ()
        }
        return Ok(());
    }

    fn set_default(&mut self, id: &AccountId) {
        for account in &mut self.accounts {
            account.is_default = &account.id == id;
        }
    }

    /// Reports inconsistencies without repairing them.
    pub fn audit(&self) -> Vec<AuditIssue> {
        let mut issues = Vec::new();
        let known: HashSet<&AccountId> = self.accounts.iter().map(|a| &a.id).collect();
        let mut seen_ids = HashSet::new();
        let mut transfers: HashMap<&str, Vec<&Transaction>> = HashMap::new();

        for transaction in &self.transactions {
            if !known.contains(&transaction.account_id) {
                issues.push(AuditIssue::OrphanTransaction {
                    transaction: transaction.id.clone(),
                    account: transaction.account_id.clone()
                });
            }
            if transaction.amount <= Amount::ZERO {
                issues.push(AuditIssue::NonPositiveAmount(transaction.id.clone()));
            }
            if !seen_ids.insert(&transaction.id) {
                issues.push(AuditIssue::DuplicateTransactionId(transaction.id.clone()));
            }
            if let Some(transfer_id) = &transaction.transfer_id {
                transfers.entry(transfer_id.as_str()).or_default().push(transaction);
            }
        }

        let defaults: Vec<AccountId> = self.accounts.iter()
            .filter(|a| a.is_default)
            .map(|a| a.id.clone())
            .collect();
        if defaults.len() > 1 {
            issues.push(AuditIssue::MultipleDefaults(defaults));
        }

        for account in &self.accounts {
            if account.available_balance > account.balance {
                issues.push(AuditIssue::AvailableExceedsBalance(account.id.clone()));
            }
        }

        let mut unbalanced: Vec<&str> = transfers.into_iter()
            .filter(|(_, legs)| !Self::is_balanced_pair(legs))
            .map(|(transfer_id, _)| transfer_id)
            .collect();
        unbalanced.sort();
        issues.extend(unbalanced.into_iter().map(|id| AuditIssue::UnbalancedTransfer(id.to_owned())));

        if !issues.is_empty() {
            log::warn!("ledger audit found {} issue(s)", issues.len());
        }
        return issues;
    }

    fn is_balanced_pair(legs: &[&Transaction]) -> bool {
        match legs {
            [a, b] => a.direction != b.direction && a.amount == b.amount,
            _ => false
        }
    }

    /// Net effect of the recorded transactions on one account.
    pub fn net_flow(&self, id: &AccountId) -> LedgerResult<Amount> {
        self.transactions_for(id)
            .try_fold(Amount::ZERO, |total, t| total.checked_add(t.signed_amount()))
            .ok_or(LedgerError::AmountOverflow)
    }
}


#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::core::{AccountId, AccountKind, AccountSettings, AccountStatus, LedgerError,
        LedgerState, NewAccount, seed};
    use crate::core::ledger::AuditIssue;
    use crate::core::transaction::Direction;

    #[fixture]
    fn ledger() -> LedgerState {
        seed::initial_ledger()
    }

    fn checking() -> AccountId {
        AccountId::new(seed::CHECKING_ID)
    }

    fn savings() -> AccountId {
        AccountId::new(seed::SAVINGS_ID)
    }

    #[rstest]
    fn transfer_moves_funds_and_records_both_legs(mut ledger: LedgerState) {
        let before = ledger.transactions.len();

        let receipt = ledger.transfer(&checking(), &savings(), dec!(500.00)).unwrap();

        assert_eq!(ledger.account(&checking()).unwrap().balance, dec!(2043.87));
        assert_eq!(ledger.account(&savings()).unwrap().balance, dec!(16250.52));
        assert_eq!(ledger.account(&checking()).unwrap().available_balance, dec!(2043.87));
        assert_eq!(ledger.account(&savings()).unwrap().available_balance, dec!(16250.52));
        assert_eq!(receipt.source_balance, dec!(2043.87));
        assert_eq!(receipt.destination_balance, dec!(16250.52));

        assert_eq!(ledger.transactions.len(), before + 2);
        let debit = &ledger.transactions[before];
        let credit = &ledger.transactions[before + 1];

        assert_eq!(debit.direction, Direction::Debit);
        assert_eq!(debit.account_id, checking());
        assert_eq!(debit.description, "Transfer to High-Yield Savings");
        assert_eq!(debit.category, "Transfer");
        assert_eq!(debit.amount, dec!(500.00));

        assert_eq!(credit.direction, Direction::Credit);
        assert_eq!(credit.account_id, savings());
        assert_eq!(credit.description, "Transfer from Primary Checking");
        assert_eq!(credit.amount, dec!(500.00));

        assert_eq!(debit.timestamp, credit.timestamp);
        assert_eq!(debit.transfer_id, credit.transfer_id);
        assert_eq!(debit.id, receipt.debit_id);
        assert_eq!(credit.id, receipt.credit_id);
    }

    #[rstest]
    fn overdraft_leaves_state_unchanged(mut ledger: LedgerState) {
        ledger.transfer(&checking(), &savings(), dec!(500.00)).unwrap();
        let snapshot = ledger.clone();

        let res = ledger.transfer(&checking(), &savings(), dec!(3000.00));

        assert_eq!(res, Err(LedgerError::InsufficientFunds {
            available: dec!(2043.87),
            requested: dec!(3000.00)
        }));
        assert_eq!(ledger, snapshot);
        assert_eq!(ledger.account(&checking()).unwrap().balance, dec!(2043.87));
        assert_eq!(ledger.account(&savings()).unwrap().balance, dec!(16250.52));
    }

    #[rstest]
    fn exact_balance_can_be_transferred(mut ledger: LedgerState) {
        ledger.transfer(&checking(), &savings(), dec!(2543.87)).unwrap();
        assert_eq!(ledger.account(&checking()).unwrap().balance, dec!(0));
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-10))]
    fn non_positive_amount_is_rejected(mut ledger: LedgerState, #[case] amount: Decimal) {
        let snapshot = ledger.clone();
        let res = ledger.transfer(&checking(), &savings(), amount);
        assert!(matches!(res, Err(LedgerError::InvalidAmount(..))));
        assert_eq!(ledger, snapshot);
    }

    #[rstest]
    fn self_transfer_is_rejected(mut ledger: LedgerState) {
        let snapshot = ledger.clone();
        let res = ledger.transfer(&checking(), &checking(), dec!(1));
        assert_eq!(res, Err(LedgerError::SameAccount(checking())));
        assert_eq!(ledger, snapshot);
    }

    #[rstest]
    fn unknown_account_is_rejected(mut ledger: LedgerState) {
        let missing = AccountId::new("acc-missing");
        let snapshot = ledger.clone();

        let res = ledger.transfer(&checking(), &missing, dec!(1));
        assert_eq!(res, Err(LedgerError::UnknownAccount(missing.clone())));

        let res = ledger.transfer(&missing, &checking(), dec!(1));
        assert_eq!(res, Err(LedgerError::UnknownAccount(missing)));
        assert_eq!(ledger, snapshot);
    }

    #[rstest]
    fn transfer_uses_given_timestamp(mut ledger: LedgerState) {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let receipt = ledger.transfer_at(&savings(), &checking(), dec!(10), at).unwrap();
        assert_eq!(receipt.timestamp, at);
        assert!(ledger.transactions.iter().rev().take(2).all(|t| t.timestamp == at));
    }

    #[rstest]
    fn create_account_with_deposit(mut ledger: LedgerState) {
        let mut request = NewAccount::new("Vacation Fund", AccountKind::Savings);
        request.initial_deposit = dec!(250);
        let before = ledger.transactions.len();

        let id = ledger.create_account(request).unwrap();

        let account = ledger.account(&id).unwrap();
        assert_eq!(account.name, "Vacation Fund");
        assert_eq!(account.balance, dec!(250));
        assert_eq!(account.available_balance, dec!(250));
        assert_eq!(account.status, AccountStatus::Active);
        assert!(account.number.starts_with("****"));
        assert!(!account.is_default);
        assert_eq!(ledger.accounts.last().unwrap().id, id);

        assert_eq!(ledger.transactions.len(), before + 1);
        let deposit = ledger.transactions.last().unwrap();
        assert_eq!(deposit.direction, Direction::Credit);
        assert_eq!(deposit.category, "Deposit");
        assert_eq!(ledger.net_flow(&id), Ok(dec!(250)));
    }

    #[rstest]
    fn create_account_validates_input(mut ledger: LedgerState) {
        let res = ledger.create_account(NewAccount::new("   ", AccountKind::Checking));
        assert_eq!(res, Err(LedgerError::InvalidName));

        let mut request = NewAccount::new("Bills", AccountKind::Checking);
        request.initial_deposit = dec!(-1);
        assert!(matches!(ledger.create_account(request), Err(LedgerError::InvalidAmount(..))));
        assert_eq!(ledger.accounts.len(), 2);
    }

    #[test]
    fn first_account_becomes_default() {
        let mut ledger = LedgerState::default();
        let id = ledger.create_account(NewAccount::new("Everyday", AccountKind::Checking)).unwrap();
        assert_eq!(ledger.default_account().unwrap().id, id);
        assert!(ledger.transactions.is_empty());
    }

    #[rstest]
    fn at_most_one_default(mut ledger: LedgerState) {
        let mut request = NewAccount::new("Bills", AccountKind::Checking);
        request.make_default = true;
        let bills = ledger.create_account(request).unwrap();
        assert_eq!(ledger.accounts.iter().filter(|a| a.is_default).count(), 1);
        assert_eq!(ledger.default_account().unwrap().id, bills);

        ledger.update_account(&savings(), AccountSettings { is_default: Some(true), ..Default::default() }).unwrap();
        assert_eq!(ledger.accounts.iter().filter(|a| a.is_default).count(), 1);
        assert_eq!(ledger.default_account().unwrap().id, savings());

        ledger.update_account(&savings(), AccountSettings { is_default: Some(false), ..Default::default() }).unwrap();
        assert!(ledger.default_account().is_none());
    }

    #[rstest]
    fn update_account_settings(mut ledger: LedgerState) {
        let settings = AccountSettings {
            name: Some(" Everyday Checking ".to_owned()),
            status: Some(AccountStatus::Frozen),
            is_default: None
        };
        ledger.update_account(&checking(), settings).unwrap();

        let account = ledger.account(&checking()).unwrap();
        assert_eq!(account.name, "Everyday Checking");
        assert_eq!(account.status, AccountStatus::Frozen);
        assert!(account.is_default);

        let blank = AccountSettings { name: Some("".to_owned()), ..Default::default() };
        assert_eq!(ledger.update_account(&checking(), blank), Err(LedgerError::InvalidName));

        let missing = AccountId::new("acc-missing");
        assert_eq!(ledger.update_account(&missing, AccountSettings::default()),
            Err(LedgerError::UnknownAccount(missing)));
    }

    #[rstest]
    fn seeded_ledger_is_consistent(mut ledger: LedgerState) {
        assert!(ledger.audit().is_empty());
        ledger.transfer(&checking(), &savings(), dec!(100)).unwrap();
        assert!(ledger.audit().is_empty());
    }

    #[rstest]
    fn audit_reports_problems(mut ledger: LedgerState) {
        ledger.transfer(&checking(), &savings(), dec!(100)).unwrap();
        let credit = ledger.transactions.pop().unwrap();
        let transfer_id = credit.transfer_id.clone().unwrap();

        let mut orphan = ledger.transactions[0].clone();
        orphan.account_id = AccountId::new("acc-gone");
        ledger.transactions.push(orphan.clone());

        for account in &mut ledger.accounts {
            account.is_default = true;
        }

        let issues = ledger.audit();
        assert!(issues.contains(&AuditIssue::UnbalancedTransfer(transfer_id)));
        assert!(issues.contains(&AuditIssue::DuplicateTransactionId(orphan.id.clone())));
        assert!(issues.contains(&AuditIssue::OrphanTransaction {
            transaction: orphan.id,
            account: AccountId::new("acc-gone")
        }));
        assert!(issues.contains(&AuditIssue::MultipleDefaults(vec![checking(), savings()])));
    }

    #[rstest]
    fn transactions_for_keeps_insertion_order(mut ledger: LedgerState) {
        ledger.transfer(&checking(), &savings(), dec!(1)).unwrap();
        ledger.transfer(&checking(), &savings(), dec!(2)).unwrap();
        let id = checking();
        let amounts: Vec<_> = ledger.transactions_for(&id)
            .filter(|t| t.category == "Transfer")
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![dec!(1), dec!(2)]);
    }

    #[rstest]
    fn total_balance_sums_accounts(ledger: LedgerState) {
        assert_eq!(ledger.total_balance(), Ok(dec!(18294.39)));
    }

    fn near_max_savings(ledger: &mut LedgerState) {
        let savings = &mut ledger.accounts[1];
        savings.balance = Decimal::MAX - dec!(100);
        savings.available_balance = Decimal::MAX - dec!(100);
    }

    #[rstest]
    fn transfer_overflow_leaves_state_unchanged(mut ledger: LedgerState) {
        near_max_savings(&mut ledger);
        let snapshot = ledger.clone();

        let res = ledger.transfer(&checking(), &savings(), dec!(500));

        assert_eq!(res, Err(LedgerError::AmountOverflow));
        assert_eq!(ledger, snapshot);
        assert_eq!(ledger.account(&checking()).unwrap().balance, dec!(2543.87));
    }

    #[rstest]
    fn transfer_up_to_max_succeeds(mut ledger: LedgerState) {
        near_max_savings(&mut ledger);
        ledger.transfer(&checking(), &savings(), dec!(100)).unwrap();
        assert_eq!(ledger.account(&savings()).unwrap().balance, Decimal::MAX);
        assert_eq!(ledger.account(&checking()).unwrap().balance, dec!(2443.87));
    }

    #[rstest]
    fn total_balance_reports_overflow(mut ledger: LedgerState) {
        near_max_savings(&mut ledger);
        assert_eq!(ledger.total_balance(), Err(LedgerError::AmountOverflow));
    }

    #[rstest]
    fn deposit_that_overflows_total_is_rejected(mut ledger: LedgerState) {
        let mut request = NewAccount::new("Jackpot", AccountKind::Savings);
        request.initial_deposit = Decimal::MAX;

        assert_eq!(ledger.create_account(request), Err(LedgerError::AmountOverflow));
        assert_eq!(ledger.accounts.len(), 2);
        assert_eq!(ledger.total_balance(), Ok(dec!(18294.39)));
    }

    #[test]
    fn max_deposit_fits_empty_ledger() {
        let mut ledger = LedgerState::default();
        let mut request = NewAccount::new("Jackpot", AccountKind::Savings);
        request.initial_deposit = Decimal::MAX;

        let id = ledger.create_account(request).unwrap();

        assert_eq!(ledger.total_balance(), Ok(Decimal::MAX));
        assert_eq!(ledger.net_flow(&id), Ok(Decimal::MAX));
    }
}
