use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::leaderboard::StepsMode;
use crate::models::{FatLossRow, StepsRow};
use crate::names::NameResolver;
use crate::service;
use crate::store::RecordStore;
use crate::window::Baseline;

pub fn write_fat_loss_section(output: &mut String, title: &str, rows: &[FatLossRow]) {
    let _ = writeln!(output, "## {title}");

    if rows.is_empty() {
        let _ = writeln!(output, "No members with weigh-ins in both periods.");
    } else {
        for (rank, row) in rows.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} {:+.2}%",
                rank + 1,
                row.name,
                row.fat_loss_percentage
            );
        }
    }
    let _ = writeln!(output);
}

pub fn write_steps_section(output: &mut String, title: &str, rows: &[StepsRow]) {
    let _ = writeln!(output, "## {title}");

    if rows.is_empty() {
        let _ = writeln!(output, "No steps logged in this window.");
    } else {
        for (rank, row) in rows.iter().enumerate() {
            let _ = writeln!(output, "{}. {} {} steps", rank + 1, row.username, row.steps);
        }
    }
    let _ = writeln!(output);
}

pub async fn build_report(
    store: &dyn RecordStore,
    names: &dyn NameResolver,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let weekly = service::fat_loss_board(store, names, Baseline::LastWeek, now).await?;
    let overall = service::fat_loss_board(store, names, Baseline::InitialWeek, now).await?;

    let week = service::steps_window(StepsMode::Weekly, now, 0, 0)?;
    let weekly_steps = service::steps_board(store, names, StepsMode::Weekly, week).await?;
    let month = service::steps_window(StepsMode::Overall, now, 0, 0)?;
    let monthly_steps = service::steps_board(store, names, StepsMode::Overall, month).await?;

    let mut output = String::new();
    let _ = writeln!(output, "# Wellness Club Leaderboards");
    let _ = writeln!(
        output,
        "Generated {} (week starting {})",
        now.format("%Y-%m-%d %H:%M UTC"),
        week.start.date_naive()
    );
    let _ = writeln!(output);

    write_fat_loss_section(&mut output, "Fat Loss This Week", &weekly);
    write_fat_loss_section(&mut output, "Fat Loss Since Day One", &overall);
    write_steps_section(&mut output, "Steps This Week", &weekly_steps);
    write_steps_section(&mut output, "Steps This Month", &monthly_steps);

    Ok(output)
}
