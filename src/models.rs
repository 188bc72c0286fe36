use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;

/// Which measurement a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    FatMass,
    Steps,
}

impl Series {
    pub fn as_str(&self) -> &'static str {
        match self {
            Series::FatMass => "fat_mass",
            Series::Steps => "steps",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Series {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fat_mass" => Ok(Series::FatMass),
            "steps" => Ok(Series::Steps),
            other => Err(TrackerError::InvalidSeries(other.to_string())),
        }
    }
}

/// Submission cadence. A weekly steps submission replaces the daily ones of
/// the same week on the weekly leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Daily,
    Weekly,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Daily => "daily",
            RecordKind::Weekly => "weekly",
        }
    }
}

impl FromStr for RecordKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RecordKind::Daily),
            "weekly" => Ok(RecordKind::Weekly),
            other => Err(TrackerError::InvalidKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    pub series: Series,
    pub metrics: Metrics,
    pub kind: RecordKind,
    #[serde(default)]
    pub source_key: Option<String>,
}

impl MeasurementRecord {
    /// Key used for idempotent inserts. Records without an explicit key fall
    /// back to their id.
    pub fn dedup_key(&self) -> String {
        self.source_key
            .clone()
            .unwrap_or_else(|| format!("record-{}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub subject: String,
    pub aggregate_value: f64,
}

/// Per-subject aggregates in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summaries {
    entries: Vec<SubjectSummary>,
}

impl Summaries {
    pub fn new(entries: Vec<SubjectSummary>) -> Self {
        Self { entries }
    }

    pub fn get(&self, subject: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.subject == subject)
            .map(|entry| entry.aggregate_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectSummary> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.aggregate_value).sum()
    }
}

impl FromIterator<(String, f64)> for Summaries {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(subject, aggregate_value)| SubjectSummary {
                    subject,
                    aggregate_value,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub score: f64,
}

/// Wire row of the fat-loss leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatLossRow {
    pub name: String,
    #[serde(rename = "fatLossPercentage")]
    pub fat_loss_percentage: f64,
}

impl From<LeaderboardEntry> for FatLossRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            name: entry.display_name,
            fat_loss_percentage: entry.score,
        }
    }
}

/// Wire row of the steps leaderboard. `username` carries the display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepsRow {
    pub username: String,
    pub steps: i64,
}

impl From<LeaderboardEntry> for StepsRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            username: entry.display_name,
            steps: entry.score.round() as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepsStats {
    pub total_steps: i64,
    pub weekly_steps: i64,
    pub daily_average: i64,
    /// Days with at least one entry in the requested month, ascending.
    pub entry_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeighIn {
    pub week_start: NaiveDate,
    pub weight_kg: Option<f64>,
    pub fat_pct: Option<f64>,
    pub fat_mass: f64,
    pub change_from_previous: Option<f64>,
}
