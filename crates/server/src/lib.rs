use api_types::Failure;
use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use engine::{ErrorKind, LedgerError};

pub use server::{ServerState, router, run_with_listener};

mod server;
mod transactions;
mod wallets;

pub enum ServerError {
    Engine(LedgerError),
    Generic(String),
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Validation(_) | LedgerError::InsufficientBalance(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::Upstream(_) => StatusCode::BAD_GATEWAY,
        LedgerError::Database(_) | LedgerError::Serialization(_) | LedgerError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn kind_label(err: &LedgerError) -> &'static str {
    if let LedgerError::Conflict(_) = err {
        return "conflict";
    }
    match err.kind() {
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::InsufficientBalance => "insufficient_balance",
        ErrorKind::Upstream => "upstream",
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Database(_) | LedgerError::Serialization(_) | LedgerError::Io(_) => {
            tracing::error!("internal error: {err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, message) = match self {
            ServerError::Engine(err) => (
                status_for_ledger_error(&err),
                kind_label(&err),
                message_for_ledger_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "validation", err),
        };

        let body = Failure {
            success: false,
            kind: kind.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Generic(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422() {
        let res = ServerError::from(LedgerError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn insufficient_balance_maps_to_422() {
        let res =
            ServerError::from(LedgerError::InsufficientBalance("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn not_found_maps_to_404() {
        let res = ServerError::from(LedgerError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = LedgerError::Conflict("w1".to_string());
        assert_eq!(kind_label(&err), "conflict");
        assert_eq!(
            ServerError::from(err).into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn upload_failure_maps_to_502() {
        let res = ServerError::from(LedgerError::Upstream("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
