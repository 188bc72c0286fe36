use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{MeasurementRecord, Series};
use crate::window::Window;

#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub series: Series,
    pub subject: Option<String>,
    pub window: Option<Window>,
}

impl RecordFilter {
    pub fn series(series: Series) -> Self {
        Self {
            series,
            subject: None,
            window: None,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn matches(&self, record: &MeasurementRecord) -> bool {
        record.series == self.series
            && self
                .subject
                .as_deref()
                .map_or(true, |subject| record.subject == subject)
            && self
                .window
                .map_or(true, |window| window.contains(record.timestamp))
    }
}

/// Append-only measurement log.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records matching `filter`, oldest first.
    async fn fetch(&self, filter: &RecordFilter) -> anyhow::Result<Vec<MeasurementRecord>>;

    /// Returns `false` when a record with the same source key already exists.
    async fn append(&self, record: &MeasurementRecord) -> anyhow::Result<bool>;

    async fn earliest(&self, series: Series) -> anyhow::Result<Option<DateTime<Utc>>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<MeasurementRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MeasurementRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|record| seen.insert(record.dedup_key()))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, filter: &RecordFilter) -> anyhow::Result<Vec<MeasurementRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        let mut matching: Vec<MeasurementRecord> = records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matching.sort_by_key(|record| record.timestamp);
        Ok(matching)
    }

    async fn append(&self, record: &MeasurementRecord) -> anyhow::Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        let key = record.dedup_key();
        if records.iter().any(|existing| existing.dedup_key() == key) {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn earliest(&self, series: Series) -> anyhow::Result<Option<DateTime<Utc>>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(records
            .iter()
            .filter(|record| record.series == series)
            .map(|record| record.timestamp)
            .min())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metrics, RecordKind};
    use crate::window;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn record(subject: &str, series: Series, day: u32, key: &str) -> MeasurementRecord {
        MeasurementRecord {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap(),
            series,
            metrics: Metrics {
                value: 10.0,
                weight_kg: None,
                fat_pct: None,
            },
            kind: RecordKind::Daily,
            source_key: Some(key.to_string()),
        }
    }

    #[tokio::test]
    async fn fetch_filters_by_series_subject_and_window() {
        let store = MemoryStore::with_records(vec![
            record("x", Series::Steps, 20, "a"),
            record("x", Series::Steps, 12, "b"),
            record("y", Series::Steps, 21, "c"),
            record("x", Series::FatMass, 20, "d"),
        ]);
        let now = Utc.with_ymd_and_hms(2026, 10, 22, 9, 0, 0).unwrap();

        let week = store
            .fetch(&RecordFilter::series(Series::Steps).window(window::current_week(now).unwrap()))
            .await
            .unwrap();
        assert_eq!(week.len(), 2);

        let mine = store
            .fetch(&RecordFilter::series(Series::Steps).subject("x"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].timestamp < mine[1].timestamp);
    }

    #[tokio::test]
    async fn append_is_idempotent_on_source_key() {
        let store = MemoryStore::new();
        let first = record("x", Series::Steps, 20, "same");
        assert!(store.append(&first).await.unwrap());
        assert!(!store.append(&first).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn earliest_is_per_series() {
        let store = MemoryStore::with_records(vec![
            record("x", Series::Steps, 2, "a"),
            record("x", Series::FatMass, 9, "b"),
            record("y", Series::FatMass, 5, "c"),
        ]);
        assert_eq!(
            store.earliest(Series::FatMass).await.unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 10, 5, 12, 0, 0).unwrap())
        );
        assert_eq!(MemoryStore::new().earliest(Series::Steps).await.unwrap(), None);
    }
}
