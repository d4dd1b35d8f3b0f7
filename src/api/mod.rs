//! HTTP surface: router assembly and shared request state.

pub mod appointments;
pub mod availability;
pub mod slots;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::{Pool, SchemaVersion};

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub schema: SchemaVersion,
    pub clinic_name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(availability::routes())
        .merge(appointments::routes())
        .merge(slots::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "clinic": state.clinic_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
