//! crates/medminder_core/src/schedule.rs
//!
//! Structured time-window evaluation of a user's medication schedule.
//!
//! Whether a medicine is due is decided here, by direct comparison against
//! the stored schedule. The language-model guidance layered on top in the
//! service is explanation only; it never overrides this result.

use chrono::{NaiveTime, Timelike};

use crate::domain::{DosePeriod, DueDose, DueReminder, DueReport, Medicine, Reminder};

/// How far (in minutes) a reminder may be from "now" and still count as due.
pub const DUE_WINDOW_MINUTES: u32 = 5;

/// Maps a wall-clock time to its dose period.
///
/// Morning is 05:00-11:59, afternoon 12:00-16:59, night 17:00-04:59.
pub fn period_of(time: NaiveTime) -> DosePeriod {
    match time.hour() {
        5..=11 => DosePeriod::Morning,
        12..=16 => DosePeriod::Afternoon,
        _ => DosePeriod::Night,
    }
}

/// Minute distance between two times of day, wrapping across midnight.
fn circular_minute_distance(a: NaiveTime, b: NaiveTime) -> u32 {
    let a_min = a.hour() * 60 + a.minute();
    let b_min = b.hour() * 60 + b.minute();
    let forward = (1440 + b_min - a_min) % 1440;
    forward.min(1440 - forward)
}

fn medicine_matches_period(medicine: &Medicine, period: DosePeriod) -> bool {
    match period {
        DosePeriod::Morning => medicine.morning,
        DosePeriod::Afternoon => medicine.afternoon,
        DosePeriod::Night => medicine.night,
    }
}

/// Evaluates which reminders and medicines are due at `now`.
///
/// A reminder is due when its time is within [`DUE_WINDOW_MINUTES`] of `now`.
/// A medicine is listed when its time-of-day flag matches the current period.
pub fn evaluate_due(medicines: &[Medicine], reminders: &[Reminder], now: NaiveTime) -> DueReport {
    let period = period_of(now);

    let due_reminders = reminders
        .iter()
        .filter(|r| circular_minute_distance(r.time, now) <= DUE_WINDOW_MINUTES)
        .map(|r| DueReminder {
            reminder_id: r.id,
            medicine_name: r.medicine_name.clone(),
            time: r.time,
            dosage: r.dosage.clone(),
        })
        .collect();

    let period_medicines = medicines
        .iter()
        .filter(|m| medicine_matches_period(m, period))
        .map(|m| DueDose {
            medicine_id: m.id,
            medicine_name: m.name.clone(),
            dosage: m.dosage.clone(),
        })
        .collect();

    DueReport {
        period: Some(period),
        due_reminders,
        period_medicines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn medicine(name: &str, morning: bool, afternoon: bool, night: bool) -> Medicine {
        Medicine {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            morning,
            afternoon,
            night,
            dosage: "1 tablet".to_string(),
        }
    }

    fn reminder(name: &str, at: NaiveTime) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            medicine_id: Uuid::new_v4(),
            medicine_name: name.to_string(),
            time: at,
            dosage: "1 tablet".to_string(),
        }
    }

    #[test]
    fn period_boundaries() {
        assert_eq!(period_of(time(4, 59)), DosePeriod::Night);
        assert_eq!(period_of(time(5, 0)), DosePeriod::Morning);
        assert_eq!(period_of(time(11, 59)), DosePeriod::Morning);
        assert_eq!(period_of(time(12, 0)), DosePeriod::Afternoon);
        assert_eq!(period_of(time(16, 59)), DosePeriod::Afternoon);
        assert_eq!(period_of(time(17, 0)), DosePeriod::Night);
    }

    #[test]
    fn reminder_inside_window_is_due() {
        let reminders = vec![reminder("Aspirin", time(8, 0))];
        let report = evaluate_due(&[], &reminders, time(8, 4));
        assert_eq!(report.due_reminders.len(), 1);
        assert_eq!(report.due_reminders[0].medicine_name, "Aspirin");
    }

    #[test]
    fn reminder_outside_window_is_not_due() {
        let reminders = vec![reminder("Aspirin", time(8, 0))];
        let report = evaluate_due(&[], &reminders, time(8, 6));
        assert!(report.due_reminders.is_empty());
    }

    #[test]
    fn window_wraps_across_midnight() {
        let reminders = vec![reminder("Melatonin", time(23, 58))];
        let report = evaluate_due(&[], &reminders, time(0, 2));
        assert_eq!(report.due_reminders.len(), 1);
    }

    #[test]
    fn period_medicines_match_current_flag() {
        let medicines = vec![
            medicine("Aspirin", true, false, false),
            medicine("Ibuprofen", false, false, true),
        ];
        let report = evaluate_due(&medicines, &[], time(9, 0));
        assert_eq!(report.period, Some(DosePeriod::Morning));
        assert_eq!(report.period_medicines.len(), 1);
        assert_eq!(report.period_medicines[0].medicine_name, "Aspirin");
    }

    #[test]
    fn empty_schedule_reports_nothing_due() {
        let report = evaluate_due(&[], &[], time(13, 30));
        assert!(report.is_empty());
        assert_eq!(report.summary(), "No medicines scheduled for now.");
    }

    #[test]
    fn summary_mentions_due_reminder() {
        let reminders = vec![reminder("Aspirin", time(20, 30))];
        let report = evaluate_due(&[], &reminders, time(20, 30));
        let summary = report.summary();
        assert!(summary.contains("Aspirin"));
        assert!(summary.contains("20:30"));
    }
}
