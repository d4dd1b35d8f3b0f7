//! Booking write path and staff appointment handlers.
//!
//! Booking re-checks availability and then inserts; the two steps are not
//! atomic, so two concurrent submissions for the same window can both pass
//! the check. This matches the long-standing behavior of the booking form.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::availability::{day_snapshot, parse_date, UPSTREAM_MSG};
use super::AppState;
use crate::availability::{resolve_slot, REASON_NO_SLOT};
use crate::db::{self, NewAppointment};
use crate::error::{AppError, AppResult};
use crate::model::{self, Appointment, AppointmentStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", post(book).get(list))
        .route("/api/appointments/{id}/status", patch(update_status))
        .route("/api/appointments/{id}", get(get_one))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub preferred_date: String,
    pub preferred_time: String,
    pub notes: Option<String>,
}

impl BookingRequest {
    fn validated(self) -> Result<NewAppointment, AppError> {
        if self.patient_name.trim().is_empty() {
            return Err(AppError::invalid("'patientName' is required"));
        }
        if self.patient_phone.trim().is_empty() {
            return Err(AppError::invalid("'patientPhone' is required"));
        }
        let preferred_date = parse_date(Some(&self.preferred_date))?;
        let window_ok = match self.preferred_time.split_once('-') {
            Some((start, end)) => model::is_valid_time(start) && model::is_valid_time(end),
            None => model::is_valid_time(&self.preferred_time),
        };
        if !window_ok {
            return Err(AppError::invalid(
                "'preferredTime' must be HH:MM:SS or HH:MM:SS-HH:MM:SS",
            ));
        }
        Ok(NewAppointment {
            patient_name: self.patient_name.trim().to_string(),
            patient_phone: self.patient_phone.trim().to_string(),
            patient_email: self.patient_email,
            preferred_date,
            preferred_time: self.preferred_time,
            notes: self.notes,
        })
    }
}

/// POST /api/appointments - patient booking submission
#[instrument(skip_all)]
pub async fn book(
    State(state): State<AppState>,
    Json(payload): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let new = payload.validated()?;

    let (slots, appointments) = day_snapshot(&state, new.preferred_date).await?;
    let check = resolve_slot(&slots, &appointments, new.preferred_date, &new.preferred_time);
    if !check.available {
        let reason = check.reason.unwrap_or_else(|| REASON_NO_SLOT.to_string());
        return if reason == REASON_NO_SLOT {
            Err(AppError::invalid(reason))
        } else {
            Err(AppError::conflict(reason))
        };
    }

    let appointment = db::insert_appointment(&state.pool, &new).await.map_err(|err| {
        error!(?err, "appointment insert failed");
        AppError::upstream("Failed to create appointment")
    })?;
    info!(
        id = appointment.id,
        reference = %appointment.reference,
        date = %appointment.preferred_date,
        time = %appointment.preferred_time,
        "appointment booked"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
    pub status: Option<String>,
}

/// GET /api/appointments?date=&status= - staff listing
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let date: Option<NaiveDate> = match query.date.as_deref() {
        Some(raw) => Some(parse_date(Some(raw))?),
        None => None,
    };
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            AppointmentStatus::parse(raw)
                .ok_or_else(|| AppError::invalid(format!("unknown status '{raw}'")))?,
        ),
        None => None,
    };

    let appointments = db::list_appointments(&state.pool, date, status)
        .await
        .map_err(|err| {
            error!(?err, "appointment listing failed");
            AppError::upstream(UPSTREAM_MSG)
        })?;
    Ok(Json(appointments))
}

/// GET /api/appointments/:id
#[instrument(skip_all)]
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Appointment>> {
    let appointment = db::get_appointment(&state.pool, id)
        .await
        .map_err(|err| {
            error!(?err, id, "appointment fetch failed");
            AppError::upstream(UPSTREAM_MSG)
        })?
        .ok_or_else(|| AppError::not_found(format!("appointment {id} not found")))?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// PATCH /api/appointments/:id/status - staff status transition
#[instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<Appointment>> {
    let status = AppointmentStatus::parse(&payload.status)
        .ok_or_else(|| AppError::invalid(format!("unknown status '{}'", payload.status)))?;

    let updated = db::update_appointment_status(&state.pool, id, status)
        .await
        .map_err(|err| {
            error!(?err, id, "status update failed");
            AppError::upstream("Failed to update appointment")
        })?
        .ok_or_else(|| AppError::not_found(format!("appointment {id} not found")))?;
    info!(id, status = status.as_str(), "appointment status updated");
    Ok(Json(updated))
}
