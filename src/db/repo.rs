use super::model::{NewAppointment, NewSlot};
use crate::model::{Appointment, AppointmentStatus, AvailabilitySlot};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    // Pass through non-sqlite schemes
    if !url.starts_with("sqlite:") {
        return url.to_string();
    }

    // In-memory URLs like sqlite::memory: or sqlite::memory:?cache=shared
    if url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    // Strip prefix and optional //
    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    // Separate query string if any
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        // nothing to normalize
        return url.to_string();
    }

    // Expand leading ~/ to HOME
    let expanded_path = if let Some(rest) = path_part.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            format!("{}/{}", home.trim_end_matches('/'), rest)
        } else {
            path_part.to_string()
        }
    } else {
        path_part.to_string()
    };

    // Ensure parent directory exists if any
    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    // Rebuild URL, prefer sqlite:// form
    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Shape of the `availability_slots` table, probed once at startup.
/// `Legacy` deployments predate the recurring-slot migration and only carry
/// dated slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Legacy,
    Recurring,
}

#[instrument(skip_all)]
pub async fn detect_schema(pool: &Pool) -> Result<SchemaVersion> {
    let n: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('availability_slots') WHERE name = 'is_recurring'",
    )
    .fetch_one(pool)
    .await?;
    Ok(if n > 0 {
        SchemaVersion::Recurring
    } else {
        SchemaVersion::Legacy
    })
}

fn slot_from_row(row: &SqliteRow) -> AvailabilitySlot {
    AvailabilitySlot {
        id: row.get("id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        is_recurring: row.get("is_recurring"),
        day_of_week: row.get("day_of_week"),
        date: row.get("date"),
        effective_from: row.get("effective_from"),
        effective_until: row.get("effective_until"),
        is_available: row.get("is_available"),
        max_appointments: row.get("max_appointments"),
        created_at: row.get("created_at"),
    }
}

fn legacy_slot_from_row(row: &SqliteRow) -> AvailabilitySlot {
    AvailabilitySlot {
        id: row.get("id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        is_recurring: false,
        day_of_week: None,
        date: row.get("date"),
        effective_from: None,
        effective_until: None,
        is_available: row.get("is_available"),
        max_appointments: row.get("max_appointments"),
        created_at: row.get("created_at"),
    }
}

fn appointment_from_row(row: &SqliteRow) -> Result<Appointment> {
    let status_raw: String = row.get("status");
    let status = AppointmentStatus::parse(&status_raw)
        .ok_or_else(|| anyhow!("unknown appointment status in row: {status_raw}"))?;
    Ok(Appointment {
        id: row.get("id"),
        reference: row.get("reference"),
        patient_name: row.get("patient_name"),
        patient_phone: row.get("patient_phone"),
        patient_email: row.get("patient_email"),
        preferred_date: row.get("preferred_date"),
        preferred_time: row.get("preferred_time"),
        status,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const SLOT_COLUMNS: &str = "id, start_time, end_time, is_recurring, day_of_week, date, \
     effective_from, effective_until, is_available, max_appointments, created_at";

const LEGACY_SLOT_COLUMNS: &str =
    "id, start_time, end_time, date, is_available, max_appointments, created_at";

const APPOINTMENT_COLUMNS: &str = "id, reference, patient_name, patient_phone, patient_email, \
     preferred_date, preferred_time, status, notes, created_at, updated_at";

#[instrument(skip_all)]
pub async fn create_slot(pool: &Pool, slot: &NewSlot) -> Result<AvailabilitySlot> {
    let row = sqlx::query(&format!(
        "INSERT INTO availability_slots \
         (start_time, end_time, is_recurring, day_of_week, date, effective_from, effective_until, is_available, max_appointments) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {SLOT_COLUMNS}"
    ))
    .bind(&slot.start_time)
    .bind(&slot.end_time)
    .bind(slot.is_recurring)
    .bind(slot.day_of_week)
    .bind(slot.date)
    .bind(slot.effective_from)
    .bind(slot.effective_until)
    .bind(slot.is_available)
    .bind(slot.max_appointments)
    .fetch_one(pool)
    .await?;
    Ok(slot_from_row(&row))
}

#[instrument(skip_all)]
pub async fn get_slot(pool: &Pool, id: i64) -> Result<Option<AvailabilitySlot>> {
    let row = sqlx::query(&format!(
        "SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(slot_from_row))
}

#[instrument(skip_all)]
pub async fn list_slots(pool: &Pool) -> Result<Vec<AvailabilitySlot>> {
    let rows = sqlx::query(&format!(
        "SELECT {SLOT_COLUMNS} FROM availability_slots ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(slot_from_row).collect())
}

/// Overwrite a slot definition with an already-validated merged record.
/// Returns the stored row, or None when the id does not exist.
#[instrument(skip_all)]
pub async fn replace_slot(pool: &Pool, id: i64, slot: &NewSlot) -> Result<Option<AvailabilitySlot>> {
    let row = sqlx::query(&format!(
        "UPDATE availability_slots SET \
         start_time = ?, end_time = ?, is_recurring = ?, day_of_week = ?, date = ?, \
         effective_from = ?, effective_until = ?, is_available = ?, max_appointments = ? \
         WHERE id = ? RETURNING {SLOT_COLUMNS}"
    ))
    .bind(&slot.start_time)
    .bind(&slot.end_time)
    .bind(slot.is_recurring)
    .bind(slot.day_of_week)
    .bind(slot.date)
    .bind(slot.effective_from)
    .bind(slot.effective_until)
    .bind(slot.is_available)
    .bind(slot.max_appointments)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(slot_from_row))
}

#[instrument(skip_all)]
pub async fn delete_slot(pool: &Pool, id: i64) -> Result<bool> {
    let res = sqlx::query("DELETE FROM availability_slots WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Fetch the enabled slot definitions that can produce an occurrence on
/// `date`: dated slots matching exactly, plus (on the recurring schema)
/// weekly slots matching the weekday within their effective window.
#[instrument(skip_all)]
pub async fn slots_for_date(
    pool: &Pool,
    schema: SchemaVersion,
    date: NaiveDate,
    weekday: i64,
) -> Result<Vec<AvailabilitySlot>> {
    match schema {
        SchemaVersion::Recurring => {
            let rows = sqlx::query(&format!(
                "SELECT {SLOT_COLUMNS} FROM availability_slots \
                 WHERE is_available = 1 \
                   AND ((is_recurring = 0 AND date = ?) \
                     OR (is_recurring = 1 AND day_of_week = ? \
                         AND (effective_from IS NULL OR effective_from <= ?) \
                         AND (effective_until IS NULL OR effective_until >= ?))) \
                 ORDER BY start_time"
            ))
            .bind(date)
            .bind(weekday)
            .bind(date)
            .bind(date)
            .fetch_all(pool)
            .await?;
            Ok(rows.iter().map(slot_from_row).collect())
        }
        SchemaVersion::Legacy => {
            let rows = sqlx::query(&format!(
                "SELECT {LEGACY_SLOT_COLUMNS} FROM availability_slots \
                 WHERE is_available = 1 AND date = ? ORDER BY start_time"
            ))
            .bind(date)
            .fetch_all(pool)
            .await?;
            Ok(rows.iter().map(legacy_slot_from_row).collect())
        }
    }
}

/// All appointments on `date` whose status still occupies a slot.
#[instrument(skip_all)]
pub async fn occupying_appointments(pool: &Pool, date: NaiveDate) -> Result<Vec<Appointment>> {
    let rows = sqlx::query(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
         WHERE preferred_date = ? AND status IN ('pending', 'confirmed', 'in_progress')"
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;
    rows.iter().map(appointment_from_row).collect()
}

#[instrument(skip_all)]
pub async fn insert_appointment(pool: &Pool, new: &NewAppointment) -> Result<Appointment> {
    let reference = Uuid::new_v4().to_string();
    let row = sqlx::query(&format!(
        "INSERT INTO appointments \
         (reference, patient_name, patient_phone, patient_email, preferred_date, preferred_time, status, notes) \
         VALUES (?, ?, ?, ?, ?, ?, 'pending', ?) RETURNING {APPOINTMENT_COLUMNS}"
    ))
    .bind(&reference)
    .bind(&new.patient_name)
    .bind(&new.patient_phone)
    .bind(&new.patient_email)
    .bind(new.preferred_date)
    .bind(&new.preferred_time)
    .bind(&new.notes)
    .fetch_one(pool)
    .await?;
    appointment_from_row(&row)
}

#[instrument(skip_all)]
pub async fn get_appointment(pool: &Pool, id: i64) -> Result<Option<Appointment>> {
    let row = sqlx::query(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(appointment_from_row).transpose()
}

#[instrument(skip_all)]
pub async fn list_appointments(
    pool: &Pool,
    date: Option<NaiveDate>,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>> {
    let status_str = status.map(|s| s.as_str());
    let rows = sqlx::query(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
         WHERE (? IS NULL OR preferred_date = ?) AND (? IS NULL OR status = ?) \
         ORDER BY preferred_date, preferred_time"
    ))
    .bind(date)
    .bind(date)
    .bind(status_str)
    .bind(status_str)
    .fetch_all(pool)
    .await?;
    rows.iter().map(appointment_from_row).collect()
}

/// Apply a staff status transition. Returns the updated row, or None when
/// the id does not exist.
#[instrument(skip_all)]
pub async fn update_appointment_status(
    pool: &Pool,
    id: i64,
    status: AppointmentStatus,
) -> Result<Option<Appointment>> {
    let row = sqlx::query(&format!(
        "UPDATE appointments SET status = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ? RETURNING {APPOINTMENT_COLUMNS}"
    ))
    .bind(status.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(appointment_from_row).transpose()
}
