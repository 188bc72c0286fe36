use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::aggregate::round2;
use crate::error::TrackerError;
use crate::models::{MeasurementRecord, StepsStats, WeighIn};
use crate::window;

/// Totals over one member's step records, plus the days with entries in the
/// calendar month `months_back` months ago.
pub fn steps_stats(
    records: &[MeasurementRecord],
    now: DateTime<Utc>,
    months_back: u32,
) -> Result<StepsStats, TrackerError> {
    let total: f64 = records.iter().map(|record| record.metrics.value).sum();
    let weekly: f64 = window::current_week(now)?
        .select(records)
        .map(|record| record.metrics.value)
        .sum();
    let entry_dates: BTreeSet<NaiveDate> = window::month_offset(now, months_back)?
        .select(records)
        .map(|record| record.timestamp.date_naive())
        .collect();
    let daily_average = if records.is_empty() {
        0
    } else {
        (total / records.len() as f64).round() as i64
    };

    Ok(StepsStats {
        total_steps: total.round() as i64,
        weekly_steps: weekly.round() as i64,
        daily_average,
        entry_dates: entry_dates.into_iter().collect(),
    })
}

/// One member's weigh-ins, oldest first, each with the change in fat mass
/// since the previous one.
pub fn fat_mass_history(records: &[MeasurementRecord]) -> Vec<WeighIn> {
    let mut sorted: Vec<&MeasurementRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.timestamp);

    let mut previous: Option<f64> = None;
    sorted
        .into_iter()
        .map(|record| {
            let date = record.timestamp.date_naive();
            let fat_mass = round2(record.metrics.value);
            let weigh_in = WeighIn {
                week_start: window::start_of_week(date).unwrap_or(date),
                weight_kg: record.metrics.weight_kg,
                fat_pct: record.metrics.fat_pct,
                fat_mass,
                change_from_previous: previous.map(|before| round2(fat_mass - before)),
            };
            previous = Some(fat_mass);
            weigh_in
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use crate::submit;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn steps_stats_cover_total_week_and_average() {
        let now = Utc.with_ymd_and_hms(2026, 10, 21, 18, 0, 0).unwrap();
        let records = vec![
            submit::steps_record("x", day(2026, 10, 12), 4000, RecordKind::Daily).unwrap(),
            submit::steps_record("x", day(2026, 10, 18), 6000, RecordKind::Daily).unwrap(),
            submit::steps_record("x", day(2026, 10, 20), 5001, RecordKind::Daily).unwrap(),
        ];

        let stats = steps_stats(&records, now, 0).unwrap();
        assert_eq!(
            stats,
            StepsStats {
                total_steps: 15001,
                weekly_steps: 11001,
                daily_average: 5000,
                entry_dates: vec![day(2026, 10, 12), day(2026, 10, 18), day(2026, 10, 20)],
            }
        );
    }

    #[test]
    fn entry_dates_are_unique_and_limited_to_the_month() {
        let now = Utc.with_ymd_and_hms(2026, 10, 21, 18, 0, 0).unwrap();
        let records = vec![
            submit::steps_record("x", day(2026, 10, 9), 3000, RecordKind::Daily).unwrap(),
            submit::steps_record("x", day(2026, 9, 30), 7000, RecordKind::Daily).unwrap(),
            submit::steps_record("x", day(2026, 10, 2), 2500, RecordKind::Daily).unwrap(),
            submit::steps_record("x", day(2026, 10, 9), 40000, RecordKind::Weekly).unwrap(),
            submit::steps_record("x", day(2026, 9, 3), 1000, RecordKind::Daily).unwrap(),
        ];

        let this_month = steps_stats(&records, now, 0).unwrap();
        assert_eq!(this_month.entry_dates, vec![day(2026, 10, 2), day(2026, 10, 9)]);
        assert_eq!(this_month.total_steps, 53500);

        let last_month = steps_stats(&records, now, 1).unwrap();
        assert_eq!(last_month.entry_dates, vec![day(2026, 9, 3), day(2026, 9, 30)]);

        assert!(steps_stats(&records, now, 3).unwrap().entry_dates.is_empty());
    }

    #[test]
    fn no_steps_means_zero_average() {
        let now = Utc.with_ymd_and_hms(2026, 10, 21, 18, 0, 0).unwrap();
        let stats = steps_stats(&[], now, 0).unwrap();
        assert_eq!(stats.daily_average, 0);
        assert!(stats.entry_dates.is_empty());
    }

    #[test]
    fn history_is_sorted_with_changes() {
        let records = vec![
            submit::weight_record("m", day(2026, 10, 14), 79.0, 24.0).unwrap(),
            submit::weight_record("m", day(2026, 10, 7), 80.0, 25.0).unwrap(),
        ];

        let history = fat_mass_history(&records);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].week_start, day(2026, 10, 4));
        assert_eq!(history[0].fat_mass, 20.0);
        assert_eq!(history[0].change_from_previous, None);
        assert_eq!(history[1].fat_mass, 18.96);
        assert_eq!(history[1].change_from_previous, Some(-1.04));
    }
}
