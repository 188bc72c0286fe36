use std::cmp::Ordering;

use tracing::debug;

use crate::aggregate::{self, Reducer};
use crate::models::{LeaderboardEntry, MeasurementRecord, Summaries};
use crate::names::NameResolver;

/// Steps cohorts are large, so only the top of the board is returned.
pub const STEPS_LEADERBOARD_CAP: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StepsMode {
    /// Sum of every submission in the window.
    Overall,
    /// Weekly submission if present, otherwise summed dailies.
    Weekly,
}

impl StepsMode {
    fn reducer(self) -> Reducer {
        match self {
            StepsMode::Overall => Reducer::Sum,
            StepsMode::Weekly => Reducer::MaxOfWeeklySubmissions,
        }
    }
}

fn rank_descending(entries: &mut [LeaderboardEntry]) {
    // stable: ties keep input order
    entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Ranks subjects by relative fat-mass loss between `baseline` and `current`.
///
/// Only subjects present in both periods are ranked. Scores are percentages
/// rounded to two decimals; a gain yields a negative score.
pub fn fat_loss_leaderboard<R>(
    current: &Summaries,
    baseline: &Summaries,
    names: &R,
) -> Vec<LeaderboardEntry>
where
    R: NameResolver + ?Sized,
{
    if current.is_empty() || baseline.is_empty() {
        return Vec::new();
    }

    let mut entries: Vec<LeaderboardEntry> = current
        .iter()
        .filter_map(|summary| {
            let before = baseline.get(&summary.subject)?;
            if before == 0.0 {
                debug!(subject = %summary.subject, "zero baseline, no delta");
                return None;
            }

            let score = aggregate::round2((before - summary.aggregate_value) / before * 100.0);
            Some(LeaderboardEntry {
                display_name: names.resolve_or_raw(&summary.subject),
                score,
            })
        })
        .collect();

    rank_descending(&mut entries);
    entries
}

/// Ranks subjects by step totals within one window, capped at
/// [`STEPS_LEADERBOARD_CAP`] entries.
pub fn steps_leaderboard<'a, I, R>(
    window_records: I,
    mode: StepsMode,
    names: &R,
) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
    R: NameResolver + ?Sized,
{
    let totals = aggregate::group_and_reduce(window_records, mode.reducer());

    let mut entries: Vec<LeaderboardEntry> = totals
        .iter()
        .map(|summary| LeaderboardEntry {
            display_name: names.resolve_or_raw(&summary.subject),
            score: summary.aggregate_value,
        })
        .collect();

    rank_descending(&mut entries);
    entries.truncate(STEPS_LEADERBOARD_CAP);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FatLossRow, Metrics, RecordKind, Series, StepsRow};
    use crate::names::DisplayNames;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn summaries(values: &[(&str, f64)]) -> Summaries {
        values
            .iter()
            .map(|(subject, value)| (subject.to_string(), *value))
            .collect()
    }

    fn steps(subject: &str, value: f64, kind: RecordKind) -> MeasurementRecord {
        MeasurementRecord {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 20, 7, 30, 0).unwrap(),
            series: Series::Steps,
            metrics: Metrics {
                value,
                weight_kg: None,
                fat_pct: None,
            },
            kind,
            source_key: None,
        }
    }

    fn no_names() -> DisplayNames {
        DisplayNames::default()
    }

    #[test]
    fn subjects_missing_from_baseline_are_excluded() {
        let current = summaries(&[("A", 18.0), ("B", 20.0)]);
        let baseline = summaries(&[("A", 20.0)]);

        let board = fat_loss_leaderboard(&current, &baseline, &no_names());
        assert_eq!(
            board,
            vec![LeaderboardEntry {
                display_name: "A".to_string(),
                score: 10.0
            }]
        );
    }

    #[test]
    fn gains_score_negative() {
        let board = fat_loss_leaderboard(
            &summaries(&[("A", 22.0)]),
            &summaries(&[("A", 20.0)]),
            &no_names(),
        );
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, -10.0);
    }

    #[test]
    fn empty_periods_yield_empty_board() {
        let some = summaries(&[("A", 20.0)]);
        let none = Summaries::default();
        assert!(fat_loss_leaderboard(&some, &none, &no_names()).is_empty());
        assert!(fat_loss_leaderboard(&none, &some, &no_names()).is_empty());
    }

    #[test]
    fn zero_baseline_is_skipped() {
        let board = fat_loss_leaderboard(
            &summaries(&[("A", 1.0), ("B", 9.0)]),
            &summaries(&[("A", 0.0), ("B", 10.0)]),
            &no_names(),
        );
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].display_name, "B");
    }

    #[test]
    fn fat_loss_ranks_descending_with_stable_ties() {
        let current = summaries(&[("c", 19.0), ("a", 18.0), ("b", 19.0), ("d", 21.0)]);
        let baseline = summaries(&[("a", 20.0), ("b", 20.0), ("c", 20.0), ("d", 20.0)]);

        let order: Vec<String> = fat_loss_leaderboard(&current, &baseline, &no_names())
            .into_iter()
            .map(|entry| entry.display_name)
            .collect();
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        let board = fat_loss_leaderboard(
            &summaries(&[("A", 17.0)]),
            &summaries(&[("A", 18.0)]),
            &no_names(),
        );
        assert_eq!(board[0].score, 5.56);
    }

    #[test]
    fn half_way_scores_round_away_from_zero() {
        let current = summaries(&[("loser", 799.0), ("gainer", 801.0)]);
        let baseline = summaries(&[("loser", 800.0), ("gainer", 800.0)]);

        let board = fat_loss_leaderboard(&current, &baseline, &no_names());
        assert_eq!(board[0].score, 0.13);
        assert_eq!(board[1].score, -0.13);
    }

    #[test]
    fn unknown_names_fall_back_to_subject() {
        let names: DisplayNames = [("A".to_string(), "Avery".to_string())]
            .into_iter()
            .collect();
        let board = fat_loss_leaderboard(
            &summaries(&[("A", 18.0), ("B", 19.0)]),
            &summaries(&[("A", 20.0), ("B", 20.0)]),
            &names,
        );
        let shown: Vec<&str> = board.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(shown, vec!["Avery", "B"]);
    }

    #[test]
    fn overall_steps_sum_and_rank() {
        let records = vec![
            steps("x", 100.0, RecordKind::Daily),
            steps("x", 50.0, RecordKind::Daily),
            steps("y", 300.0, RecordKind::Daily),
        ];
        let rows: Vec<StepsRow> = steps_leaderboard(&records, StepsMode::Overall, &no_names())
            .into_iter()
            .map(StepsRow::from)
            .collect();

        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            serde_json::json!([
                {"username": "y", "steps": 300},
                {"username": "x", "steps": 150}
            ])
        );
    }

    #[test]
    fn weekly_steps_prefer_weekly_submission() {
        let records = vec![
            steps("x", 100.0, RecordKind::Daily),
            steps("x", 5000.0, RecordKind::Weekly),
        ];
        let board = steps_leaderboard(&records, StepsMode::Weekly, &no_names());
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, 5000.0);
    }

    #[test]
    fn steps_board_is_capped_and_keeps_zero_totals() {
        let records: Vec<MeasurementRecord> = (0..30)
            .map(|i| steps(&format!("user{i}"), f64::from(i) * 10.0, RecordKind::Daily))
            .collect();
        let board = steps_leaderboard(&records, StepsMode::Overall, &no_names());
        assert_eq!(board.len(), STEPS_LEADERBOARD_CAP);
        assert_eq!(board[0].display_name, "user29");

        let few = vec![steps("idle", 0.0, RecordKind::Daily)];
        let board = steps_leaderboard(&few, StepsMode::Overall, &no_names());
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, 0.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let current = summaries(&[("a", 18.0), ("b", 18.0), ("c", 19.5)]);
        let baseline = summaries(&[("a", 20.0), ("b", 20.0), ("c", 20.0)]);
        let first = fat_loss_leaderboard(&current, &baseline, &no_names());
        let second = fat_loss_leaderboard(&current, &baseline, &no_names());
        assert_eq!(first, second);

        let records = vec![
            steps("x", 10.0, RecordKind::Daily),
            steps("y", 10.0, RecordKind::Daily),
        ];
        assert_eq!(
            steps_leaderboard(&records, StepsMode::Weekly, &no_names()),
            steps_leaderboard(&records, StepsMode::Weekly, &no_names())
        );
    }

    #[test]
    fn fat_loss_rows_use_wire_field_names() {
        let rows: Vec<FatLossRow> = fat_loss_leaderboard(
            &summaries(&[("A", 18.0)]),
            &summaries(&[("A", 20.0)]),
            &no_names(),
        )
        .into_iter()
        .map(FatLossRow::from)
        .collect();

        assert_eq!(
            serde_json::to_string(&rows).unwrap(),
            r#"[{"name":"A","fatLossPercentage":10.0}]"#
        );
    }
}
