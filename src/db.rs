use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{MeasurementRecord, Metrics, RecordKind, Series};
use crate::store::{RecordFilter, RecordStore};
use crate::submit;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> anyhow::Result<MeasurementRecord> {
    let series: String = row.get("series");
    let kind: String = row.get("kind");

    Ok(MeasurementRecord {
        id: row.get("id"),
        subject: row.get("subject"),
        timestamp: row.get("recorded_at"),
        series: series.parse()?,
        metrics: Metrics {
            value: row.get("value"),
            weight_kg: row.get("weight_kg"),
            fat_pct: row.get("fat_pct"),
        },
        kind: kind.parse()?,
        source_key: row.get("source_key"),
    })
}

#[async_trait]
impl RecordStore for PgStore {
    async fn fetch(&self, filter: &RecordFilter) -> anyhow::Result<Vec<MeasurementRecord>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, subject, recorded_at, series, value, weight_kg, fat_pct, kind, source_key \
             FROM wellness.measurements WHERE series = ",
        );
        query.push_bind(filter.series.as_str());

        if let Some(subject) = &filter.subject {
            query.push(" AND subject = ").push_bind(subject.as_str());
        }
        if let Some(window) = filter.window {
            query
                .push(" AND recorded_at >= ")
                .push_bind(window.start)
                .push(" AND recorded_at < ")
                .push_bind(window.end);
        }
        query.push(" ORDER BY recorded_at, created_at");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch measurements")?;
        debug!(series = %filter.series, rows = rows.len(), "fetched measurements");

        rows.iter().map(record_from_row).collect()
    }

    async fn append(&self, record: &MeasurementRecord) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO wellness.measurements
            (id, subject, recorded_at, series, value, weight_kg, fat_pct, kind, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.subject)
        .bind(record.timestamp)
        .bind(record.series.as_str())
        .bind(record.metrics.value)
        .bind(record.metrics.weight_kg)
        .bind(record.metrics.fat_pct)
        .bind(record.kind.as_str())
        .bind(record.dedup_key())
        .execute(&self.pool)
        .await
        .context("failed to insert measurement")?;

        Ok(result.rows_affected() > 0)
    }

    async fn earliest(&self, series: Series) -> anyhow::Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT MIN(recorded_at) AS earliest FROM wellness.measurements WHERE series = $1",
        )
        .bind(series.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("earliest"))
    }
}

/// Inserts three weeks of demo data for a handful of members, anchored on
/// the current week.
pub async fn seed(store: &dyn RecordStore, now: DateTime<Utc>) -> anyhow::Result<usize> {
    let weigh_ins = [
        ("warpedrufus", [(92.0, 28.0), (91.2, 27.4), (90.1, 26.9)]),
        ("fitpokiko", [(64.5, 24.0), (64.0, 23.6), (64.3, 23.8)]),
        ("sashimimojo", [(78.0, 22.0), (77.1, 21.5), (76.4, 21.1)]),
    ];
    let step_logs = [
        ("warpedrufus", [8200, 9100, 10400]),
        ("fitpokiko", [12000, 11800, 13050]),
        ("sashimimojo", [6400, 7000, 7550]),
    ];

    let mut inserted = 0usize;
    let today = now.date_naive();

    for (subject, weeks) in weigh_ins {
        for (offset, (weight, fat_pct)) in weeks.into_iter().enumerate() {
            let date = today - Duration::weeks(2 - offset as i64);
            let mut record = submit::weight_record(subject, date, weight, fat_pct)?;
            record.source_key = Some(format!("seed-weight-{subject}-{offset}"));
            if store.append(&record).await? {
                inserted += 1;
            }
        }
    }

    for (subject, days) in step_logs {
        for (offset, steps) in days.into_iter().enumerate() {
            let date = today - Duration::days(offset as i64);
            let mut record = submit::steps_record(subject, date, steps, RecordKind::Daily)?;
            record.source_key = Some(format!("seed-steps-{subject}-{offset}"));
            if store.append(&record).await? {
                inserted += 1;
            }
        }
    }

    info!(inserted, "seed data written");
    Ok(inserted)
}

pub async fn import_csv(store: &dyn RecordStore, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        username: String,
        date: NaiveDate,
        series: String,
        value: Option<f64>,
        weight_kg: Option<f64>,
        fat_pct: Option<f64>,
        kind: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV row {}", line + 1))?;
        let kind: RecordKind = row.kind.as_deref().unwrap_or("daily").parse()?;

        let mut record = match row.series.parse::<Series>()? {
            Series::FatMass => match (row.weight_kg, row.fat_pct) {
                (Some(weight), Some(fat_pct)) => {
                    submit::weight_record(&row.username, row.date, weight, fat_pct)?
                }
                _ => anyhow::bail!("row {} needs weight_kg and fat_pct", line + 1),
            },
            Series::Steps => {
                let steps = row
                    .value
                    .with_context(|| format!("row {} needs a step count", line + 1))?;
                submit::steps_record(&row.username, row.date, steps.round() as i64, kind)?
            }
        };

        record.source_key = Some(
            row.source_key
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
        );

        if store.append(&record).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}
