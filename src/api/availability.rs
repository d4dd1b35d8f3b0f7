//! The availability endpoint: a pure read combining slot definitions and
//! placed appointments into a bookability answer.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, instrument};

use super::AppState;
use crate::availability::{resolve_day, resolve_slot, weekday_index};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::model::{Appointment, AvailabilitySlot};

pub const UPSTREAM_MSG: &str = "Failed to check availability";

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/availability", get(check))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Parse the required `date` query parameter, rejecting absence and
/// malformed values alike as caller errors.
pub fn parse_date(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    let raw = raw.ok_or_else(|| AppError::invalid("Query parameter 'date' is required"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::invalid("'date' must be an ISO date (YYYY-MM-DD)"))
}

/// One snapshot of everything the resolver needs for a date. The two reads
/// are independent; there is no transaction across them.
pub async fn day_snapshot(
    state: &AppState,
    date: NaiveDate,
) -> Result<(Vec<AvailabilitySlot>, Vec<Appointment>), AppError> {
    let slots = db::slots_for_date(&state.pool, state.schema, date, weekday_index(date))
        .await
        .map_err(|err| {
            error!(?err, %date, "slot fetch failed");
            AppError::upstream(UPSTREAM_MSG)
        })?;
    let appointments = db::occupying_appointments(&state.pool, date)
        .await
        .map_err(|err| {
            error!(?err, %date, "appointment fetch failed");
            AppError::upstream(UPSTREAM_MSG)
        })?;
    Ok((slots, appointments))
}

/// GET /api/availability?date=YYYY-MM-DD[&time=HH:MM:SS-HH:MM:SS]
#[instrument(skip_all)]
pub async fn check(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Response> {
    let date = parse_date(query.date.as_deref())?;
    let (slots, appointments) = day_snapshot(&state, date).await?;

    match query.time.as_deref() {
        Some(time) => Ok(Json(resolve_slot(&slots, &appointments, date, time)).into_response()),
        None => Ok(Json(resolve_day(&slots, &appointments, date)).into_response()),
    }
}
