//! Decoding of loosely-typed record payloads.
//!
//! Upstream dumps come either in the canonical [`MeasurementRecord`] shape or
//! in the flat shape the web clients submit (`username`, `date`, `steps` or
//! `weight`/`fat_pctg`/`fat_mass`, optional `type`). Anything else is skipped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::{MeasurementRecord, Metrics, RecordKind, Series};
use crate::window;

#[derive(Debug, Deserialize)]
struct FlatRecord {
    #[serde(alias = "user", alias = "subject")]
    username: String,
    date: String,
    #[serde(default)]
    steps: Option<f64>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    fat_pctg: Option<f64>,
    #[serde(default)]
    fat_mass: Option<f64>,
    #[serde(default, rename = "type")]
    kind: Option<RecordKind>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(window::midnight)
}

impl FlatRecord {
    fn into_record(self) -> Option<MeasurementRecord> {
        let timestamp = parse_timestamp(&self.date)?;

        let (series, metrics, kind) = if let Some(steps) = self.steps {
            let metrics = Metrics {
                value: steps,
                weight_kg: None,
                fat_pct: None,
            };
            (
                Series::Steps,
                metrics,
                self.kind.unwrap_or(RecordKind::Daily),
            )
        } else {
            let fat_mass = match (self.fat_mass, self.weight, self.fat_pctg) {
                (Some(fat_mass), _, _) => fat_mass,
                (None, Some(weight), Some(fat_pctg)) => weight * (fat_pctg / 100.0),
                _ => return None,
            };
            let metrics = Metrics {
                value: fat_mass,
                weight_kg: self.weight,
                fat_pct: self.fat_pctg,
            };
            (Series::FatMass, metrics, RecordKind::Weekly)
        };

        Some(MeasurementRecord {
            id: Uuid::new_v4(),
            subject: self.username,
            timestamp,
            series,
            metrics,
            kind,
            source_key: None,
        })
    }
}

fn decode_item(item: &Value) -> Option<MeasurementRecord> {
    if let Ok(record) = serde_json::from_value::<MeasurementRecord>(item.clone()) {
        return Some(record);
    }
    serde_json::from_value::<FlatRecord>(item.clone())
        .ok()
        .and_then(FlatRecord::into_record)
}

/// Returns every decodable record of a JSON array. A payload that is not an
/// array yields no records.
pub fn records_from_value(payload: &Value) -> Vec<MeasurementRecord> {
    let Value::Array(items) = payload else {
        debug!("record payload is not an array, treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let record = decode_item(item);
            if record.is_none() {
                debug!(index, "skipping undecodable record");
            }
            record
        })
        .collect()
}
