use atm_ledger::{AppState, AccountId, AccountKind, AccountSettings, Amount, LedgerState, NewAccount,
    backend::{JsonStore, SharedStorage},
    ledger::AuditIssue,
    profile::DisplayMode,
    parse_amount};

use std::path::PathBuf;
use anyhow::{anyhow, Context};
use colored::Colorize;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Path to the storage file to operate on
    #[clap(value_parser)]
    path: PathBuf,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Display accounts and balances
    Accounts,
    /// List transactions, optionally for one account
    Transactions {
        #[clap(short, long, value_parser)]
        account: Option<String>
    },
    /// Move funds between two accounts
    Transfer(Transfer),
    /// Open a new account
    CreateAccount(CreateAccount),
    /// Make an account the default one
    SetDefault {
        #[clap(value_parser)]
        account: String
    },
    /// Rename an account
    Rename {
        #[clap(value_parser)]
        account: String,
        #[clap(value_parser)]
        name: String
    },
    /// List savings goals
    Goals,
    /// Add money to a savings goal
    Contribute {
        #[clap(value_parser)]
        goal: String,
        #[clap(value_parser)]
        amount: String
    },
    /// Show the profile
    Profile,
    /// Show or change the display mode
    Mode {
        #[clap(value_parser)]
        mode: Option<DisplayMode>
    },
    /// Check the ledger for inconsistencies
    Audit,
    /// Forget all stored data and return to the initial dataset
    Reset
}

fn colored_amount(amount: Amount) -> colored::ColoredString {
    let color = if amount < Amount::ZERO {
        colored::ColoredString::bright_red
    } else if amount > Amount::ZERO {
        colored::ColoredString::green
    } else {
        colored::ColoredString::normal
    };
    color(format!("{}", amount).white())
}

fn print_accounts(ledger: &LedgerState) {
    for account in &ledger.accounts {
        let marker = if account.is_default { "*" } else { " " };
        println!("{} {} [{}] {}: {} {} (available {})",
            marker, account.id, account.status, account,
            colored_amount(account.balance), account.currency, account.available_balance);
    }
    match ledger.total_balance() {
        Ok(total) => println!("{}: {}", "Total".bold(), colored_amount(total)),
        Err(err) => println!("{}: {}", "Total".bold(), err.to_string().bright_red())
    }
}

#[derive(Args, Debug)]
struct Transfer {
    /// Id of the account to debit
    #[clap(short='f', long, value_parser)]
    from: String,

    /// Id of the account to credit
    #[clap(short='t', long, value_parser)]
    to: String,

    #[clap(short='a', long, value_parser)]
    amount: String
}

impl Transfer {
    fn run(&self, app: &mut AppState) -> anyhow::Result<()> {
        let amount = parse_amount(&self.amount)?;
        let receipt = app.transfer(&AccountId::new(&self.from), &AccountId::new(&self.to), amount)
            .with_context(|| "transfer rejected")?;
        println!("Transferred {}: {} now {}, {} now {}",
            amount, self.from, colored_amount(receipt.source_balance),
            self.to, colored_amount(receipt.destination_balance));
        Ok(())
    }
}

#[derive(Args, Debug)]
struct CreateAccount {
    #[clap(value_parser)]
    name: String,

    #[clap(short, long, value_parser, default_value = "checking")]
    kind: AccountKind,

    #[clap(short, long, value_parser)]
    deposit: Option<String>,

    #[clap(long, action)]
    default: bool
}

impl CreateAccount {
    fn run(&self, app: &mut AppState) -> anyhow::Result<()> {
        let mut request = NewAccount::new(&self.name, self.kind);
        if let Some(deposit) = &self.deposit {
            request.initial_deposit = parse_amount(deposit)?;
        }
        request.make_default = self.default;
        let id = app.create_account(request)?;
        println!("Opened account {}", id);
        Ok(())
    }
}

fn describe(issue: &AuditIssue) -> String {
    match issue {
        AuditIssue::OrphanTransaction { transaction, account } =>
            format!("transaction {} references unknown account {}", transaction, account),
        AuditIssue::NonPositiveAmount(id) => format!("transaction {} has a non-positive amount", id),
        AuditIssue::DuplicateTransactionId(id) => format!("transaction id {} is used more than once", id),
        AuditIssue::MultipleDefaults(ids) => format!("{} accounts are marked default", ids.len()),
        AuditIssue::AvailableExceedsBalance(id) => format!("account {} has more available than its balance", id),
        AuditIssue::UnbalancedTransfer(id) => format!("transfer {} is not a matching debit/credit pair", id)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let shared = SharedStorage::new(JsonStore::new(&args.path));
    let mut app = AppState::open(&shared.context());

    match args.action {
        Subcommands::Accounts => {
            print_accounts(app.ledger.get());
        },
        Subcommands::Transactions { account } => {
            let ledger = app.ledger.get();
            let filter = account.map(|id| AccountId::new(&id));
            for t in ledger.transactions.iter().filter(|t| filter.as_ref().map_or(true, |id| &t.account_id == id)) {
                println!("{}", t);
            }
        },
        Subcommands::Transfer(transfer) => {
            transfer.run(&mut app)?;
        },
        Subcommands::CreateAccount(create) => {
            create.run(&mut app)?;
        },
        Subcommands::SetDefault { account } => {
            let settings = AccountSettings { is_default: Some(true), ..Default::default() };
            app.update_account(&AccountId::new(&account), settings)?;
        },
        Subcommands::Rename { account, name } => {
            let settings = AccountSettings { name: Some(name), ..Default::default() };
            app.update_account(&AccountId::new(&account), settings)?;
        },
        Subcommands::Goals => {
            for goal in &app.savings.get().goals {
                let percent = (goal.progress() * Amount::ONE_HUNDRED).round_dp(1);
                println!("{} {}: {} of {} ({}%)", goal.id, goal.name.bold(), goal.saved, goal.target, percent);
            }
        },
        Subcommands::Contribute { goal, amount } => {
            let saved = app.contribute(&goal, parse_amount(&amount)?)?;
            println!("{} now holds {}", goal, colored_amount(saved));
        },
        Subcommands::Profile => {
            let profile = app.profile.get();
            println!("{} <{}>", profile.name.bold(), profile.email);
            if let Some(phone) = &profile.phone {
                println!("Phone: {}", phone);
            }
            if let Some(address) = &profile.address {
                println!("Address: {}", address);
            }
            println!("Member since {}", profile.member_since);
        },
        Subcommands::Mode { mode } => {
            if let Some(mode) = mode {
                app.set_display_mode(mode);
            }
            println!("{}", app.display_mode.get());
        },
        Subcommands::Audit => {
            let issues = app.ledger.get().audit();
            for issue in &issues {
                println!("{}", describe(issue).bright_red());
            }
            if !issues.is_empty() {
                return Err(anyhow!("{} issue(s) found", issues.len()));
            }
            println!("{}", "Ledger is consistent".green());
        },
        Subcommands::Reset => {
            if !app.reset() {
                return Err(anyhow!("could not reset storage at {}", args.path.display()));
            }
            println!("Storage at {} reset", args.path.display());
        }
    }

    let unsaved = app.unsaved_keys();
    if !unsaved.is_empty() {
        eprintln!("{} {} not saved to {}", "warning:".yellow().bold(),
            unsaved.join(", "), args.path.display());
        return Err(anyhow!("changes were not persisted"));
    }
    Ok(())
}
