use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::Roster;
use crate::error::TrackerError;
use crate::models::{MeasurementRecord, Metrics, RecordKind, Series};
use crate::store::RecordStore;
use crate::window;

/// Builds a body-composition record. The timestamp is moved to the start of
/// the week so that one member has one weigh-in slot per week.
pub fn weight_record(
    subject: &str,
    date: NaiveDate,
    weight_kg: f64,
    fat_pct: f64,
) -> Result<MeasurementRecord, TrackerError> {
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err(TrackerError::InvalidMeasurement(format!(
            "weight must be positive, got {weight_kg}"
        )));
    }
    if !(fat_pct.is_finite() && fat_pct > 0.0 && fat_pct <= 100.0) {
        return Err(TrackerError::InvalidMeasurement(format!(
            "fat percentage must be in (0, 100], got {fat_pct}"
        )));
    }

    Ok(MeasurementRecord {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        timestamp: window::midnight(window::start_of_week(date)?),
        series: Series::FatMass,
        metrics: Metrics {
            value: weight_kg * (fat_pct / 100.0),
            weight_kg: Some(weight_kg),
            fat_pct: Some(fat_pct),
        },
        kind: RecordKind::Weekly,
        source_key: None,
    })
}

pub fn steps_record(
    subject: &str,
    date: NaiveDate,
    steps: i64,
    kind: RecordKind,
) -> Result<MeasurementRecord, TrackerError> {
    if steps < 0 {
        return Err(TrackerError::InvalidMeasurement(format!(
            "steps cannot be negative, got {steps}"
        )));
    }

    Ok(MeasurementRecord {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        timestamp: window::midnight(date),
        series: Series::Steps,
        metrics: Metrics {
            value: steps as f64,
            weight_kg: None,
            fat_pct: None,
        },
        kind,
        source_key: None,
    })
}

pub async fn submit_weight(
    store: &dyn RecordStore,
    roster: &Roster,
    subject: &str,
    date: NaiveDate,
    weight_kg: f64,
    fat_pct: f64,
) -> anyhow::Result<MeasurementRecord> {
    roster.check(subject)?;
    let record = weight_record(subject, date, weight_kg, fat_pct)?;
    store.append(&record).await?;
    info!(subject, fat_mass = record.metrics.value, "weigh-in saved");
    Ok(record)
}

pub async fn submit_steps(
    store: &dyn RecordStore,
    roster: &Roster,
    subject: &str,
    date: Option<NaiveDate>,
    steps: i64,
    kind: RecordKind,
) -> anyhow::Result<MeasurementRecord> {
    roster.check(subject)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let record = steps_record(subject, date, steps, kind)?;
    store.append(&record).await?;
    info!(subject, steps, kind = kind.as_str(), "steps saved");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RecordFilter};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weight_records_store_fat_mass_at_week_start() {
        let record = weight_record("mark", day(2026, 10, 22), 80.0, 25.0).unwrap();
        assert_eq!(record.metrics.value, 20.0);
        assert_eq!(record.timestamp.date_naive(), day(2026, 10, 18));
        assert_eq!(record.kind, RecordKind::Weekly);
    }

    #[test]
    fn invalid_measurements_are_rejected() {
        assert!(weight_record("mark", day(2026, 10, 22), 0.0, 25.0).is_err());
        assert!(weight_record("mark", day(2026, 10, 22), 80.0, 120.0).is_err());
        assert!(weight_record("mark", day(2026, 10, 22), f64::NAN, 20.0).is_err());
        assert!(steps_record("mark", day(2026, 10, 22), -5, RecordKind::Daily).is_err());
        assert!(steps_record("mark", day(2026, 10, 22), 0, RecordKind::Daily).is_ok());
    }

    #[test]
    fn weigh_in_before_first_representable_week_is_rejected() {
        assert!(matches!(
            weight_record("mark", NaiveDate::MIN, 80.0, 25.0),
            Err(TrackerError::DateOutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn unknown_subjects_cannot_submit() {
        let store = MemoryStore::new();
        let roster = Roster::new(["mark".to_string()]);

        let err = submit_steps(&store, &roster, "mallory", None, 100, RecordKind::Daily)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<TrackerError>(),
            Some(&TrackerError::UnknownSubject("mallory".to_string()))
        );

        submit_weight(&store, &roster, "mark", day(2026, 10, 20), 80.0, 20.0)
            .await
            .unwrap();
        let saved = store
            .fetch(&RecordFilter::series(Series::FatMass).subject("mark"))
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);
    }
}
