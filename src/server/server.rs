mod server_config;
mod error;

use server_config::AppConfig;
use error::ServerError;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router
};
use clap::Parser;
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use atm_ledger::{
    Account, AccountId, AccountSettings, AppState, NewAccount, Transaction, TransferReceipt,
    backend::{JsonStore, SharedStorage},
    ledger::AuditIssue,
    profile::{DisplayMode, Profile},
    savings::SavingsBook,
    parse_amount};

const SERVER_CONFIG: &str = "resources/server.toml";

type SharedApp = Arc<Mutex<AppState>>;

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Path to the server configuration file
    #[clap(short, long, value_parser, default_value = SERVER_CONFIG)]
    config: PathBuf
}

/// Amounts arrive as text and are validated before any ledger call.
#[derive(Debug, Deserialize)]
struct TransferBody {
    from: AccountId,
    to: AccountId,
    amount: String
}

#[derive(Debug, Deserialize)]
struct ContributionBody {
    amount: String
}

/// Mutations stay applied in memory when storage rejects them; the client
/// still has to learn that nothing was saved.
fn ensure_saved(app: &AppState) -> Result<(), ServerError> {
    let unsaved = app.unsaved_keys();
    if unsaved.is_empty() {
        return Ok(());
    }
    Err(anyhow!("failed to persist {}", unsaved.join(", ")).into())
}

async fn index() -> &'static str {
    "ATM ledger"
}

async fn list_accounts(State(app): State<SharedApp>) -> Json<Vec<Account>> {
    let mut app = app.lock().await;
    app.sync();
    Json(app.ledger.get().accounts.clone())
}

async fn get_account(State(app): State<SharedApp>, Path(id): Path<String>) -> Result<Json<Account>, ServerError> {
    let mut app = app.lock().await;
    app.sync();
    app.ledger.get().account(&AccountId::new(&id))
        .cloned()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("account {}", id)))
}

async fn account_transactions(State(app): State<SharedApp>, Path(id): Path<String>) -> Result<Json<Vec<Transaction>>, ServerError> {
    let mut app = app.lock().await;
    app.sync();
    let id = AccountId::new(&id);
    let ledger = app.ledger.get();
    if ledger.account(&id).is_none() {
        return Err(ServerError::NotFound(format!("account {}", id)));
    }
    Ok(Json(ledger.transactions_for(&id).cloned().collect()))
}

async fn list_transactions(State(app): State<SharedApp>) -> Json<Vec<Transaction>> {
    let mut app = app.lock().await;
    app.sync();
    Json(app.ledger.get().transactions.clone())
}

async fn create_account(State(app): State<SharedApp>, Json(request): Json<NewAccount>) -> Result<(StatusCode, Json<Account>), ServerError> {
    let mut app = app.lock().await;
    app.sync();
    let id = app.create_account(request)?;
    ensure_saved(&app)?;
    let account = app.ledger.get().account(&id).cloned()
        .ok_or_else(|| ServerError::NotFound(format!("account {}", id)))?;
    log::info!("opened account {}", id);
    Ok((StatusCode::CREATED, Json(account)))
}

async fn update_account(State(app): State<SharedApp>, Path(id): Path<String>, Json(settings): Json<AccountSettings>) -> Result<Json<Account>, ServerError> {
    let mut app = app.lock().await;
    app.sync();
    let id = AccountId::new(&id);
    app.update_account(&id, settings)?;
    ensure_saved(&app)?;
    let account = app.ledger.get().account(&id).cloned()
        .ok_or_else(|| ServerError::NotFound(format!("account {}", id)))?;
    Ok(Json(account))
}

async fn transfer(State(app): State<SharedApp>, Json(body): Json<TransferBody>) -> Result<(StatusCode, Json<TransferReceipt>), ServerError> {
    let amount = parse_amount(&body.amount)?;
    let mut app = app.lock().await;
    app.sync();
    let receipt = app.transfer(&body.from, &body.to, amount)?;
    ensure_saved(&app)?;
    log::info!("transfer {} of {} from {} to {}", receipt.transfer_id, amount, body.from, body.to);
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn audit(State(app): State<SharedApp>) -> Json<Vec<AuditIssue>> {
    let mut app = app.lock().await;
    app.sync();
    Json(app.ledger.get().audit())
}

async fn profile(State(app): State<SharedApp>) -> Json<Profile> {
    let mut app = app.lock().await;
    app.sync();
    Json(app.profile.get().clone())
}

async fn savings(State(app): State<SharedApp>) -> Json<SavingsBook> {
    let mut app = app.lock().await;
    app.sync();
    Json(app.savings.get().clone())
}

async fn contribute(State(app): State<SharedApp>, Path(goal): Path<String>, Json(body): Json<ContributionBody>) -> Result<Json<SavingsBook>, ServerError> {
    let amount = parse_amount(&body.amount)?;
    let mut app = app.lock().await;
    app.sync();
    app.contribute(&goal, amount)?;
    ensure_saved(&app)?;
    Ok(Json(app.savings.get().clone()))
}

async fn get_display_mode(State(app): State<SharedApp>) -> Json<DisplayMode> {
    let mut app = app.lock().await;
    app.sync();
    Json(*app.display_mode.get())
}

async fn put_display_mode(State(app): State<SharedApp>, Json(mode): Json<DisplayMode>) -> Result<Json<DisplayMode>, ServerError> {
    let mut app = app.lock().await;
    app.set_display_mode(mode);
    ensure_saved(&app)?;
    Ok(Json(mode))
}

fn router(app: SharedApp, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id", get(get_account).patch(update_account))
        .route("/accounts/:id/transactions", get(account_transactions))
        .route("/transactions", get(list_transactions))
        .route("/transfers", post(transfer))
        .route("/audit", get(audit))
        .route("/profile", get(profile))
        .route("/savings", get(savings))
        .route("/savings/:goal/contributions", post(contribute))
        .route("/display-mode", get(get_display_mode).put(put_display_mode))
        .with_state(app);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = AppConfig::read(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let shared = SharedStorage::new(JsonStore::new(&config.storage.path));
    let app = Arc::new(Mutex::new(AppState::open(&shared.context())));

    let listener = tokio::net::TcpListener::bind(config.server.bind).await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    log::info!("serving {} on {}", config.storage.path.display(), config.server.bind);

    axum::serve(listener, router(app, config.server.static_dir)).await
        .with_context(|| "server error")?;
    Ok(())
}
