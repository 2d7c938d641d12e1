//! HTTP trigger for running the digest on request.
//!
//! Any request to `/` runs one invocation. The request is not inspected and the
//! response carries no body: 204 when every row was read, 500 otherwise.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::any;
use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::invoke;
use crate::config::Config;

#[derive(Debug)]
struct TriggerState {
    config: Config,
}

/// Builds the trigger router for `config`.
pub fn router(config: Config) -> Router {
    Router::new()
        .route("/", any(handle_trigger))
        .with_state(Arc::new(TriggerState { config }))
}

/// Serves the trigger on `listener` until the process exits.
pub async fn serve(listener: TcpListener, config: Config) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening for triggers on {}", addr);
    }
    axum::serve(listener, router(config)).await
}

async fn handle_trigger(State(state): State<Arc<TriggerState>>) -> StatusCode {
    match invoke(state.config.clone(), Utc::now()).await {
        Ok(outcome) if outcome.is_success() => StatusCode::NO_CONTENT,
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
