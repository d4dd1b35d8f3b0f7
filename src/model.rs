use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `HH:MM:SS` time-of-day in local clinic time.
static TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]$").unwrap());

pub fn is_valid_time(s: &str) -> bool {
    TIME_OF_DAY.is_match(s)
}

/// Identifier of one bookable window, built as `"{start}-{end}"`.
pub fn slot_id(start_time: &str, end_time: &str) -> String {
    format!("{}-{}", start_time, end_time)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "in_progress" => Some(AppointmentStatus::InProgress),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether an appointment in this status occupies its time slot.
    /// Completed and cancelled appointments free the window.
    pub fn occupies_slot(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending
                | AppointmentStatus::Confirmed
                | AppointmentStatus::InProgress
        )
    }
}

/// A configured bookable window: either one-off (`date`) or weekly
/// recurring (`day_of_week`, 0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: bool,
    pub day_of_week: Option<i64>,
    pub date: Option<NaiveDate>,
    pub effective_from: Option<NaiveDate>,
    pub effective_until: Option<NaiveDate>,
    pub is_available: bool,
    pub max_appointments: i64,
    pub created_at: NaiveDateTime,
}

impl AvailabilitySlot {
    pub fn slot_id(&self) -> String {
        slot_id(&self.start_time, &self.end_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    /// Public booking reference handed to the patient.
    pub reference: String,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub preferred_date: NaiveDate,
    /// Either a single `HH:MM:SS` time or a `"{start}-{end}"` window.
    pub preferred_time: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotRuleError {
    #[error("startTime and endTime must be HH:MM:SS")]
    BadTimeFormat,
    #[error("endTime must be after startTime")]
    EndNotAfterStart,
    #[error("a recurring slot requires dayOfWeek in 0..=6 and no date")]
    RecurringShape,
    #[error("a dated slot requires a date and no dayOfWeek")]
    DatedShape,
}

/// Enforce the slot exclusivity invariant: exactly one of the dated path
/// (`date`) and the recurring path (`day_of_week`) may be populated.
pub fn validate_slot(
    is_recurring: bool,
    day_of_week: Option<i64>,
    date: Option<NaiveDate>,
    start_time: &str,
    end_time: &str,
) -> Result<(), SlotRuleError> {
    if !is_valid_time(start_time) || !is_valid_time(end_time) {
        return Err(SlotRuleError::BadTimeFormat);
    }
    if end_time <= start_time {
        return Err(SlotRuleError::EndNotAfterStart);
    }
    if is_recurring {
        match day_of_week {
            Some(d) if (0..=6).contains(&d) && date.is_none() => Ok(()),
            _ => Err(SlotRuleError::RecurringShape),
        }
    } else {
        match date {
            Some(_) if day_of_week.is_none() => Ok(()),
            _ => Err(SlotRuleError::DatedShape),
        }
    }
}
