//! Availability resolution: combines configured slot definitions with the
//! appointments already placed on a date and reports which windows remain
//! bookable. Pure computation over a snapshot; nothing here touches the
//! database or mutates any record.

use crate::model::{slot_id, Appointment, AvailabilitySlot};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const REASON_BOOKED: &str = "Time slot is already booked";
pub const REASON_NO_SLOT: &str = "No matching time slot is configured for this date";
pub const MSG_NO_SLOTS: &str = "No time slots are configured for this date";
pub const MSG_FULLY_BOOKED: &str = "All time slots for this date are fully booked";

/// Answer for a query naming one specific time window.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub available: bool,
    pub reason: Option<String>,
    pub max_appointments: i64,
    pub current_appointments: i64,
}

/// One open window in a whole-day answer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenSlot {
    pub time: String,
    pub start_time: String,
    pub end_time: String,
    pub available: bool,
    pub max_appointments: i64,
    pub current_appointments: i64,
}

/// Answer for a whole-day query: only the still-open windows are listed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub available: bool,
    pub date: NaiveDate,
    pub time_slots: Vec<OpenSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Weekday index matching the stored convention (0 = Sunday .. 6 = Saturday).
pub fn weekday_index(date: NaiveDate) -> i64 {
    i64::from(date.weekday().num_days_from_sunday())
}

/// Filter slot definitions down to the occurrences valid on `date`:
/// dated slots matching exactly, recurring slots matching the weekday within
/// their effective window. Disabled slots never participate.
pub fn candidate_slots(slots: &[AvailabilitySlot], date: NaiveDate) -> Vec<&AvailabilitySlot> {
    let weekday = weekday_index(date);
    slots
        .iter()
        .filter(|s| s.is_available)
        .filter(|s| {
            if s.is_recurring {
                s.day_of_week == Some(weekday)
                    && s.effective_from.map_or(true, |from| from <= date)
                    && s.effective_until.map_or(true, |until| date <= until)
            } else {
                s.date == Some(date)
            }
        })
        .collect()
}

/// Count of non-terminal appointments occupying the given window.
pub fn occupancy(appointments: &[Appointment], slot_id: &str) -> i64 {
    appointments
        .iter()
        .filter(|a| a.status.occupies_slot() && a.preferred_time == slot_id)
        .count() as i64
}

/// Resolve availability of one specific window on `date`.
///
/// Each configured slot occurrence is single-occupancy: it is bookable iff no
/// occupying appointment names its exact window, regardless of the stored
/// `max_appointments` value.
pub fn resolve_slot(
    slots: &[AvailabilitySlot],
    appointments: &[Appointment],
    date: NaiveDate,
    requested: &str,
) -> SlotAvailability {
    let candidates = candidate_slots(slots, date);
    let Some(slot) = candidates.iter().find(|s| s.slot_id() == requested) else {
        return SlotAvailability {
            available: false,
            reason: Some(REASON_NO_SLOT.to_string()),
            max_appointments: 0,
            current_appointments: 0,
        };
    };

    let current = occupancy(appointments, requested);
    if current == 0 {
        SlotAvailability {
            available: true,
            reason: None,
            max_appointments: slot.max_appointments,
            current_appointments: 0,
        }
    } else {
        SlotAvailability {
            available: false,
            reason: Some(REASON_BOOKED.to_string()),
            max_appointments: slot.max_appointments,
            current_appointments: current,
        }
    }
}

/// Resolve the full set of open windows on `date`.
pub fn resolve_day(
    slots: &[AvailabilitySlot],
    appointments: &[Appointment],
    date: NaiveDate,
) -> DayAvailability {
    let candidates = candidate_slots(slots, date);
    if candidates.is_empty() {
        return DayAvailability {
            available: false,
            date,
            time_slots: Vec::new(),
            message: Some(MSG_NO_SLOTS.to_string()),
        };
    }

    let open: Vec<OpenSlot> = candidates
        .iter()
        .filter(|s| occupancy(appointments, &s.slot_id()) == 0)
        .map(|s| OpenSlot {
            time: slot_id(&s.start_time, &s.end_time),
            start_time: s.start_time.clone(),
            end_time: s.end_time.clone(),
            available: true,
            max_appointments: 1,
            current_appointments: 0,
        })
        .collect();

    let available = !open.is_empty();
    DayAvailability {
        available,
        date,
        time_slots: open,
        message: if available {
            None
        } else {
            Some(MSG_FULLY_BOOKED.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn now() -> NaiveDateTime {
        "2024-11-01T08:00:00".parse().unwrap()
    }

    fn dated_slot(id: i64, on: &str, start: &str, end: &str) -> AvailabilitySlot {
        AvailabilitySlot {
            id,
            start_time: start.into(),
            end_time: end.into(),
            is_recurring: false,
            day_of_week: None,
            date: Some(date(on)),
            effective_from: None,
            effective_until: None,
            is_available: true,
            max_appointments: 1,
            created_at: now(),
        }
    }

    fn recurring_slot(id: i64, weekday: i64, start: &str, end: &str) -> AvailabilitySlot {
        AvailabilitySlot {
            id,
            start_time: start.into(),
            end_time: end.into(),
            is_recurring: true,
            day_of_week: Some(weekday),
            date: None,
            effective_from: None,
            effective_until: None,
            is_available: true,
            max_appointments: 1,
            created_at: now(),
        }
    }

    fn appointment(on: &str, at: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: 1,
            reference: "ref".into(),
            patient_name: "Ada".into(),
            patient_phone: "555-0100".into(),
            patient_email: None,
            preferred_date: date(on),
            preferred_time: at.into(),
            status,
            notes: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn weekday_convention_is_sunday_zero() {
        assert_eq!(weekday_index(date("2024-12-01")), 0); // Sunday
        assert_eq!(weekday_index(date("2024-12-04")), 3); // Wednesday
        assert_eq!(weekday_index(date("2024-12-07")), 6); // Saturday
    }

    #[test]
    fn no_configured_slots_means_unavailable() {
        let res = resolve_day(&[], &[], date("2024-12-04"));
        assert!(!res.available);
        assert!(res.time_slots.is_empty());
        assert_eq!(res.message.as_deref(), Some(MSG_NO_SLOTS));
    }

    #[test]
    fn dated_slot_without_conflict_is_available() {
        let slots = vec![dated_slot(1, "2024-12-04", "09:00:00", "12:00:00")];
        let res = resolve_slot(&slots, &[], date("2024-12-04"), "09:00:00-12:00:00");
        assert!(res.available);
        assert_eq!(res.reason, None);
        assert_eq!(res.current_appointments, 0);
    }

    #[test]
    fn recurring_slot_projects_onto_matching_weekdays_only() {
        let slots = vec![recurring_slot(1, 3, "09:00:00", "12:00:00")];
        // Wednesdays
        for d in ["2024-12-04", "2024-12-11", "2024-12-18"] {
            assert_eq!(candidate_slots(&slots, date(d)).len(), 1, "{d}");
        }
        // Every other weekday that week
        for d in [
            "2024-12-02",
            "2024-12-03",
            "2024-12-05",
            "2024-12-06",
            "2024-12-07",
            "2024-12-08",
        ] {
            assert!(candidate_slots(&slots, date(d)).is_empty(), "{d}");
        }
    }

    #[test]
    fn recurring_slot_respects_effective_window() {
        let mut slot = recurring_slot(1, 3, "09:00:00", "12:00:00");
        slot.effective_from = Some(date("2024-12-01"));
        slot.effective_until = Some(date("2024-12-10"));
        let slots = vec![slot];

        assert_eq!(candidate_slots(&slots, date("2024-12-04")).len(), 1);
        assert!(candidate_slots(&slots, date("2024-11-27")).is_empty());
        assert!(candidate_slots(&slots, date("2024-12-11")).is_empty());

        // Open-ended when effective_until is null
        let mut open = recurring_slot(2, 3, "09:00:00", "12:00:00");
        open.effective_from = Some(date("2024-12-01"));
        assert_eq!(candidate_slots(&[open], date("2025-06-04")).len(), 1);
    }

    #[test]
    fn disabled_slots_never_participate() {
        let mut slot = dated_slot(1, "2024-12-04", "09:00:00", "12:00:00");
        slot.is_available = false;
        let res = resolve_day(&[slot], &[], date("2024-12-04"));
        assert!(!res.available);
        assert_eq!(res.message.as_deref(), Some(MSG_NO_SLOTS));
    }

    #[test]
    fn wednesday_recurring_slot_open_day_response() {
        let slots = vec![recurring_slot(1, 3, "09:00:00", "12:00:00")];
        let res = resolve_day(&slots, &[], date("2024-12-04"));
        assert!(res.available);
        assert_eq!(res.message, None);
        assert_eq!(
            res.time_slots,
            vec![OpenSlot {
                time: "09:00:00-12:00:00".into(),
                start_time: "09:00:00".into(),
                end_time: "12:00:00".into(),
                available: true,
                max_appointments: 1,
                current_appointments: 0,
            }]
        );
    }

    #[test]
    fn confirmed_appointment_excludes_slot_and_closes_day() {
        let slots = vec![recurring_slot(1, 3, "09:00:00", "12:00:00")];
        let appts = vec![appointment(
            "2024-12-04",
            "09:00:00-12:00:00",
            AppointmentStatus::Confirmed,
        )];
        let res = resolve_day(&slots, &appts, date("2024-12-04"));
        assert!(!res.available);
        assert!(res.time_slots.is_empty());
        assert_eq!(res.message.as_deref(), Some(MSG_FULLY_BOOKED));
    }

    #[test]
    fn booked_slot_query_reports_reason_and_count() {
        let slots = vec![recurring_slot(1, 3, "09:00:00", "12:00:00")];
        let appts = vec![appointment(
            "2024-12-04",
            "09:00:00-12:00:00",
            AppointmentStatus::Confirmed,
        )];
        let res = resolve_slot(&slots, &appts, date("2024-12-04"), "09:00:00-12:00:00");
        assert_eq!(
            res,
            SlotAvailability {
                available: false,
                reason: Some(REASON_BOOKED.to_string()),
                max_appointments: 1,
                current_appointments: 1,
            }
        );
    }

    #[test]
    fn terminal_statuses_do_not_occupy() {
        let slots = vec![recurring_slot(1, 3, "09:00:00", "12:00:00")];
        let appts = vec![
            appointment(
                "2024-12-04",
                "09:00:00-12:00:00",
                AppointmentStatus::Cancelled,
            ),
            appointment(
                "2024-12-04",
                "09:00:00-12:00:00",
                AppointmentStatus::Completed,
            ),
        ];
        let res = resolve_slot(&slots, &appts, date("2024-12-04"), "09:00:00-12:00:00");
        assert!(res.available);
        assert_eq!(res.current_appointments, 0);
    }

    #[test]
    fn pending_and_in_progress_occupy() {
        let slots = vec![
            dated_slot(1, "2024-12-04", "09:00:00", "12:00:00"),
            dated_slot(2, "2024-12-04", "14:00:00", "17:00:00"),
        ];
        let appts = vec![
            appointment(
                "2024-12-04",
                "09:00:00-12:00:00",
                AppointmentStatus::Pending,
            ),
            appointment(
                "2024-12-04",
                "14:00:00-17:00:00",
                AppointmentStatus::InProgress,
            ),
        ];
        let res = resolve_day(&slots, &appts, date("2024-12-04"));
        assert!(!res.available);
        assert_eq!(res.message.as_deref(), Some(MSG_FULLY_BOOKED));
    }

    #[test]
    fn unmatched_time_reports_no_slot_configured() {
        let slots = vec![dated_slot(1, "2024-12-04", "09:00:00", "12:00:00")];
        let res = resolve_slot(&slots, &[], date("2024-12-04"), "13:00:00-14:00:00");
        assert_eq!(
            res,
            SlotAvailability {
                available: false,
                reason: Some(REASON_NO_SLOT.to_string()),
                max_appointments: 0,
                current_appointments: 0,
            }
        );
    }

    #[test]
    fn occupancy_requires_exact_window_match() {
        let appts = vec![appointment(
            "2024-12-04",
            "09:00:00",
            AppointmentStatus::Confirmed,
        )];
        // A bare start time does not match the start-end window id.
        assert_eq!(occupancy(&appts, "09:00:00-12:00:00"), 0);
        assert_eq!(occupancy(&appts, "09:00:00"), 1);
    }

    #[test]
    fn one_booked_one_open_keeps_day_available() {
        let slots = vec![
            dated_slot(1, "2024-12-04", "09:00:00", "12:00:00"),
            dated_slot(2, "2024-12-04", "14:00:00", "17:00:00"),
        ];
        let appts = vec![appointment(
            "2024-12-04",
            "09:00:00-12:00:00",
            AppointmentStatus::Confirmed,
        )];
        let res = resolve_day(&slots, &appts, date("2024-12-04"));
        assert!(res.available);
        assert_eq!(res.time_slots.len(), 1);
        assert_eq!(res.time_slots[0].time, "14:00:00-17:00:00");
    }
}
