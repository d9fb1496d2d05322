//! Wallets API endpoints.

use api_types::{
    Success,
    wallet::{WalletList, WalletUpsert, WalletView},
};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use engine::{Money, Receipt, WalletPatch};

use crate::{ServerError, server::ServerState};

fn view(wallet: engine::Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name,
        uid: wallet.uid,
        image: wallet.image,
        amount_minor: wallet.amount.cents(),
        total_income_minor: wallet.total_income.cents(),
        total_expenses_minor: wallet.total_expenses.cents(),
        created: wallet.created,
    }
}

pub async fn upsert(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<WalletUpsert>, ServerError>,
) -> Result<Json<Success<WalletView>>, ServerError> {
    let icon = payload
        .icon
        .map(|file| Receipt::from_base64(&file.file_name, &file.data_base64))
        .transpose()?;

    let patch = WalletPatch {
        id: payload.id,
        name: payload.name,
        uid: payload.uid,
        image: payload.image,
        opening_amount: payload.opening_amount_minor.map(Money::new),
    };

    let wallet = state.engine.upsert_wallet(patch, icon).await?;
    Ok(Json(Success::new(view(wallet))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Success<WalletView>>, ServerError> {
    let wallet = state.engine.wallet(&id).await?;
    Ok(Json(Success::new(view(wallet))))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(uid): Path<String>,
) -> Result<Json<Success<WalletList>>, ServerError> {
    let wallets = state.engine.wallets_for_user(&uid).await?;
    let total = state.engine.total_balance(&uid).await?;

    Ok(Json(Success::new(WalletList {
        wallets: wallets.into_iter().map(view).collect(),
        total_balance_minor: total.cents(),
    })))
}
