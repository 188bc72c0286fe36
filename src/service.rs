use chrono::{DateTime, Utc};
use tracing::debug;

use crate::aggregate::{self, Reducer};
use crate::error::TrackerError;
use crate::leaderboard::{self, StepsMode};
use crate::models::{FatLossRow, Series, StepsRow};
use crate::names::NameResolver;
use crate::store::{RecordFilter, RecordStore};
use crate::window::{self, Baseline, Window};

pub async fn fat_loss_board(
    store: &dyn RecordStore,
    names: &dyn NameResolver,
    baseline: Baseline,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<FatLossRow>> {
    let earliest = match baseline {
        Baseline::InitialWeek => store.earliest(Series::FatMass).await?,
        _ => None,
    };
    let Some(baseline_window) = baseline.window(now, earliest)? else {
        debug!("no fat-mass history yet, empty leaderboard");
        return Ok(Vec::new());
    };

    let current_window = window::current_week(now)?;
    let current = store
        .fetch(&RecordFilter::series(Series::FatMass).window(current_window))
        .await?;
    let previous = store
        .fetch(&RecordFilter::series(Series::FatMass).window(baseline_window))
        .await?;
    debug!(
        current = current.len(),
        baseline = previous.len(),
        "computing fat-loss leaderboard against {}",
        baseline.label()
    );

    let board = leaderboard::fat_loss_leaderboard(
        &aggregate::group_and_reduce(&current, Reducer::Mean),
        &aggregate::group_and_reduce(&previous, Reducer::Mean),
        names,
    );
    Ok(board.into_iter().map(FatLossRow::from).collect())
}

/// Weekly boards look `weeks_back` weeks into the past, overall boards
/// `months_back` calendar months.
pub fn steps_window(
    mode: StepsMode,
    now: DateTime<Utc>,
    weeks_back: u32,
    months_back: u32,
) -> Result<Window, TrackerError> {
    match mode {
        StepsMode::Weekly => window::week_offset(now, weeks_back),
        StepsMode::Overall => window::month_offset(now, months_back),
    }
}

pub async fn steps_board(
    store: &dyn RecordStore,
    names: &dyn NameResolver,
    mode: StepsMode,
    window: Window,
) -> anyhow::Result<Vec<StepsRow>> {
    let records = store
        .fetch(&RecordFilter::series(Series::Steps).window(window))
        .await?;
    debug!(records = records.len(), ?mode, "computing steps leaderboard");

    let board = leaderboard::steps_leaderboard(&records, mode, names);
    Ok(board.into_iter().map(StepsRow::from).collect())
}
