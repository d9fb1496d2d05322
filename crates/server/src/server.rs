use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{transactions, wallets};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/transactions", post(transactions::upsert))
        .route("/transactions/{id}", get(transactions::get))
        .route("/wallets", post(wallets::upsert))
        .route("/wallets/{id}", get(wallets::get))
        .route(
            "/wallets/{id}/transactions",
            get(transactions::list_for_wallet),
        )
        .route("/users/{uid}/wallets", get(wallets::list_for_user))
        .route(
            "/users/{uid}/transactions",
            get(transactions::list_for_user),
        )
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
