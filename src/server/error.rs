use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json
};
use serde_json::json;

use atm_ledger::LedgerError;

#[derive(Debug)]
pub(crate) enum ServerError {
    NotFound(String),
    Rejected(LedgerError),
    InternalError(anyhow::Error)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) =>
                (StatusCode::NOT_FOUND, format!("Resource not found: {}", msg)),
            Self::Rejected(err) =>
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            Self::InternalError(err) => {
                log::error!("internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", err))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownAccount(id) => Self::NotFound(format!("account {}", id)),
            LedgerError::UnknownGoal(id) => Self::NotFound(format!("savings goal {}", id)),
            other => Self::Rejected(other)
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err)
    }
}
