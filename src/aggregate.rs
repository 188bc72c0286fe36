use std::collections::HashMap;

use serde_json::Value;

use crate::models::{MeasurementRecord, RecordKind, Summaries, SubjectSummary};
use crate::payload;

/// Strategy collapsing one subject's records into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean rounded to two decimals.
    Mean,
    Sum,
    /// Largest weekly submission if the subject has any, else the sum of dailies.
    MaxOfWeeklySubmissions,
}

#[derive(Debug, Default)]
struct Accumulator {
    total: f64,
    count: usize,
    daily_total: f64,
    weekly_max: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, record: &MeasurementRecord) {
        let value = record.metrics.value;
        self.total += value;
        self.count += 1;

        match record.kind {
            RecordKind::Daily => self.daily_total += value,
            RecordKind::Weekly => {
                self.weekly_max = Some(self.weekly_max.map_or(value, |max| max.max(value)));
            }
        }
    }

    fn reduce(&self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Mean => {
                if self.count == 0 {
                    0.0
                } else {
                    round2(self.total / self.count as f64)
                }
            }
            Reducer::Sum => self.total,
            Reducer::MaxOfWeeklySubmissions => self.weekly_max.unwrap_or(self.daily_total),
        }
    }
}

/// Rounds to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Groups records by subject and reduces each group. Subjects keep the order
/// in which they first appear in `records`.
pub fn group_and_reduce<'a, I>(records: I, reducer: Reducer) -> Summaries
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut order: Vec<&'a str> = Vec::new();
    let mut groups: HashMap<&'a str, Accumulator> = HashMap::new();

    for record in records {
        let subject = record.subject.as_str();
        groups
            .entry(subject)
            .or_insert_with(|| {
                order.push(subject);
                Accumulator::default()
            })
            .push(record);
    }

    Summaries::new(
        order
            .into_iter()
            .filter_map(|subject| {
                groups.get(subject).map(|acc| SubjectSummary {
                    subject: subject.to_string(),
                    aggregate_value: acc.reduce(reducer),
                })
            })
            .collect(),
    )
}

/// Same as [`group_and_reduce`] over an untyped payload; anything that is not
/// an array of records reduces to nothing.
pub fn group_and_reduce_value(payload: &Value, reducer: Reducer) -> Summaries {
    let records = payload::records_from_value(payload);
    group_and_reduce(&records, reducer)
}
