//! Transactions API endpoints

use api_types::{
    Success,
    transaction::{
        TransactionKind as ApiKind, TransactionListQuery, TransactionUpsert, TransactionView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use engine::{Money, Receipt, TransactionRequest};

use crate::{ServerError, server::ServerState};

const DEFAULT_LIST_LIMIT: usize = 30;

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn map_api_kind(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
    }
}

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount.cents(),
        wallet_id: tx.wallet_id,
        image: tx.image,
        uid: tx.uid,
        category: tx.category,
        description: tx.description,
        date: tx.date,
    }
}

/// Creates or edits a transaction, reconciling the affected wallets.
pub async fn upsert(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<TransactionUpsert>, ServerError>,
) -> Result<Json<Success<TransactionView>>, ServerError> {
    let receipt = payload
        .receipt
        .map(|file| Receipt::from_base64(&file.file_name, &file.data_base64))
        .transpose()?;

    let request = TransactionRequest {
        id: payload.id,
        kind: payload.kind.map(map_api_kind),
        wallet_id: payload.wallet_id,
        amount: payload.amount_minor.map(Money::new),
        receipt,
        uid: payload.uid,
        category: payload.category,
        description: payload.description,
        date: payload.date.map(|date| date.with_timezone(&Utc)),
    };

    let tx = state.engine.reconcile(request).await?;
    Ok(Json(Success::new(view(tx))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Success<TransactionView>>, ServerError> {
    let tx = state.engine.transaction(&id).await?;
    Ok(Json(Success::new(view(tx))))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(uid): Path<String>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Success<Vec<TransactionView>>>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 {
        return Err(ServerError::Generic("limit must be > 0".to_string()));
    }

    let txs = state.engine.transactions_for_user(&uid, limit).await?;
    Ok(Json(Success::new(txs.into_iter().map(view).collect())))
}

pub async fn list_for_wallet(
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<Success<Vec<TransactionView>>>, ServerError> {
    let txs = state.engine.transactions_for_wallet(&wallet_id).await?;
    Ok(Json(Success::new(txs.into_iter().map(view).collect())))
}
