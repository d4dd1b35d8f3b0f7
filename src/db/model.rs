//! Input models accepted by the repositories.
//!
//! Keep these structs focused on the data the queries need. Wire-level
//! validation lives in the handlers; the slot shape rules live in
//! `crate::model::validate_slot`.

use crate::model::{validate_slot, SlotRuleError};
use chrono::NaiveDate;
use serde::Deserialize;

/// Payload for creating a slot definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_recurring: bool,
    pub day_of_week: Option<i64>,
    pub date: Option<NaiveDate>,
    pub effective_from: Option<NaiveDate>,
    pub effective_until: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_capacity")]
    pub max_appointments: i64,
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> i64 {
    1
}

impl NewSlot {
    pub fn validate(&self) -> Result<(), SlotRuleError> {
        validate_slot(
            self.is_recurring,
            self.day_of_week,
            self.date,
            &self.start_time,
            &self.end_time,
        )
    }
}

/// Partial update for a slot definition. Absent fields keep their stored
/// value; flipping `is_recurring` discards the other path's keys so the
/// merged record can be re-validated against the exclusivity rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPatch {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_recurring: Option<bool>,
    pub day_of_week: Option<i64>,
    pub date: Option<NaiveDate>,
    pub effective_from: Option<NaiveDate>,
    pub effective_until: Option<NaiveDate>,
    pub is_available: Option<bool>,
    pub max_appointments: Option<i64>,
}

/// Payload for inserting a booking.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub notes: Option<String>,
}
