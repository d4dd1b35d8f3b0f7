//! Staff administration of availability-slot definitions.
//!
//! Create and update both re-validate the full record so a slot can never
//! end up on both the dated and the recurring path at once.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info, instrument};

use super::AppState;
use crate::db::{self, NewSlot, SlotPatch};
use crate::error::{AppError, AppResult};
use crate::model::AvailabilitySlot;

const UPSTREAM_MSG: &str = "Failed to access slot definitions";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/slots", get(list).post(create))
        .route("/api/slots/{id}", axum::routing::patch(update).delete(remove))
}

/// GET /api/slots - list all slot definitions
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<AvailabilitySlot>>> {
    let slots = db::list_slots(&state.pool).await.map_err(|err| {
        error!(?err, "slot listing failed");
        AppError::upstream(UPSTREAM_MSG)
    })?;
    Ok(Json(slots))
}

/// POST /api/slots - create a slot definition
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewSlot>,
) -> AppResult<(StatusCode, Json<AvailabilitySlot>)> {
    payload
        .validate()
        .map_err(|err| AppError::invalid(err.to_string()))?;

    let slot = db::create_slot(&state.pool, &payload).await.map_err(|err| {
        error!(?err, "slot insert failed");
        AppError::upstream(UPSTREAM_MSG)
    })?;
    info!(id = slot.id, slot = %slot.slot_id(), recurring = slot.is_recurring, "slot created");
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Merge a patch over the stored definition. Flipping `is_recurring` starts
/// the other path's keys from the patch alone instead of carrying stale
/// values over.
fn merge(existing: &AvailabilitySlot, patch: &SlotPatch) -> NewSlot {
    let is_recurring = patch.is_recurring.unwrap_or(existing.is_recurring);
    let (day_of_week, date) = if is_recurring != existing.is_recurring {
        (patch.day_of_week, patch.date)
    } else {
        (
            patch.day_of_week.or(existing.day_of_week),
            patch.date.or(existing.date),
        )
    };
    NewSlot {
        start_time: patch
            .start_time
            .clone()
            .unwrap_or_else(|| existing.start_time.clone()),
        end_time: patch
            .end_time
            .clone()
            .unwrap_or_else(|| existing.end_time.clone()),
        is_recurring,
        day_of_week,
        date,
        effective_from: patch.effective_from.or(existing.effective_from),
        effective_until: patch.effective_until.or(existing.effective_until),
        is_available: patch.is_available.unwrap_or(existing.is_available),
        max_appointments: patch.max_appointments.unwrap_or(existing.max_appointments),
    }
}

/// PATCH /api/slots/:id - partial update, re-validated as a whole
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<SlotPatch>,
) -> AppResult<Json<AvailabilitySlot>> {
    let existing = db::get_slot(&state.pool, id)
        .await
        .map_err(|err| {
            error!(?err, id, "slot fetch failed");
            AppError::upstream(UPSTREAM_MSG)
        })?
        .ok_or_else(|| AppError::not_found(format!("slot {id} not found")))?;

    let merged = merge(&existing, &patch);
    merged
        .validate()
        .map_err(|err| AppError::invalid(err.to_string()))?;

    let updated = db::replace_slot(&state.pool, id, &merged)
        .await
        .map_err(|err| {
            error!(?err, id, "slot update failed");
            AppError::upstream(UPSTREAM_MSG)
        })?
        .ok_or_else(|| AppError::not_found(format!("slot {id} not found")))?;
    info!(id, slot = %updated.slot_id(), "slot updated");
    Ok(Json(updated))
}

/// DELETE /api/slots/:id
#[instrument(skip_all)]
pub async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let deleted = db::delete_slot(&state.pool, id).await.map_err(|err| {
        error!(?err, id, "slot delete failed");
        AppError::upstream(UPSTREAM_MSG)
    })?;
    if !deleted {
        return Err(AppError::not_found(format!("slot {id} not found")));
    }
    info!(id, "slot deleted");
    Ok(StatusCode::NO_CONTENT)
}
