use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wellness_leaderboard::config::Config;
use wellness_leaderboard::leaderboard::StepsMode;
use wellness_leaderboard::models::{RecordKind, Series};
use wellness_leaderboard::service;
use wellness_leaderboard::store::{MemoryStore, RecordFilter, RecordStore};
use wellness_leaderboard::window::Baseline;
use wellness_leaderboard::{db, payload, report, stats, submit};

#[derive(Parser)]
#[command(name = "wellness-leaderboard")]
#[command(about = "Body-composition and step leaderboards for the wellness club", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Read records from a JSON dump instead of Postgres
    #[arg(long, env = "WELLNESS_RECORDS", value_name = "FILE")]
    records: Option<PathBuf>,

    /// Roster of members and display names (TOML)
    #[arg(long, env = "WELLNESS_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo members, weigh-ins and steps
    Seed,
    /// Import measurements from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import measurements from a JSON array
    ImportJson {
        #[arg(long)]
        file: PathBuf,
    },
    /// Record a weigh-in for the week containing --date
    SubmitWeight {
        #[arg(long)]
        username: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        fat_pct: f64,
    },
    /// Record a step count
    SubmitSteps {
        #[arg(long)]
        username: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        steps: i64,
        #[arg(long, value_enum, default_value_t = RecordKind::Daily)]
        kind: RecordKind,
    },
    /// Rank members by fat-mass loss against a baseline week
    FatLeaderboard {
        /// last-week, initial, or a YYYY-MM-DD date inside the baseline week
        #[arg(long, default_value = "last-week")]
        baseline: Baseline,
        #[arg(long)]
        json: bool,
    },
    /// Rank members by steps
    StepsLeaderboard {
        #[arg(long, value_enum, default_value_t = StepsMode::Weekly)]
        mode: StepsMode,
        /// Weeks back from the current week (weekly mode)
        #[arg(long, default_value_t = 0)]
        week_offset: u32,
        /// Months back from the current month (overall mode)
        #[arg(long, default_value_t = 0)]
        month_offset: u32,
        #[arg(long)]
        json: bool,
    },
    /// Show one member's steps totals and weigh-in history
    Stats {
        #[arg(long)]
        username: String,
        /// Month whose entry days are listed, counted back from the current one
        #[arg(long, default_value_t = 0)]
        month_offset: u32,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown leaderboard digest
    Report {
        #[arg(long, default_value = "leaderboards.md")]
        out: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<PgPool> {
    let database_url =
        database_url.context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn RecordStore>> {
    if let Some(path) = &cli.records {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        let records = payload::records_from_value(&value);
        info!(records = records.len(), "using in-memory records from {}", path.display());
        return Ok(Box::new(MemoryStore::with_records(records)));
    }

    let pool = connect(cli.database_url.as_deref()).await?;
    Ok(Box::new(db::PgStore::new(pool)))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::InitDb = cli.command {
        let pool = connect(cli.database_url.as_deref()).await?;
        db::init_db(&pool).await?;
        println!("Schema ready.");
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let names = config.display_names();
    let roster = config.roster();
    let store = open_store(&cli).await?;
    let store = store.as_ref();
    let now = Utc::now();
    debug!(%now, "store ready");

    match &cli.command {
        Commands::InitDb => {}
        Commands::Seed => {
            let inserted = db::seed(store, now).await?;
            println!("Seed data inserted ({inserted} records).");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(store, csv).await?;
            println!("Inserted {inserted} measurements from {}.", csv.display());
        }
        Commands::ImportJson { file } => {
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let mut inserted = 0usize;
            for record in payload::records_from_value(&value) {
                if store.append(&record).await? {
                    inserted += 1;
                }
            }
            println!("Inserted {inserted} measurements from {}.", file.display());
        }
        Commands::SubmitWeight {
            username,
            date,
            weight,
            fat_pct,
        } => {
            let record =
                submit::submit_weight(store, &roster, username, *date, *weight, *fat_pct).await?;
            println!(
                "Saved weigh-in for {} (week of {}, fat mass {:.2} kg).",
                username,
                record.timestamp.date_naive(),
                record.metrics.value
            );
        }
        Commands::SubmitSteps {
            username,
            date,
            steps,
            kind,
        } => {
            let record =
                submit::submit_steps(store, &roster, username, *date, *steps, *kind).await?;
            println!(
                "Saved {} {} steps for {} on {}.",
                kind.as_str(),
                steps,
                username,
                record.timestamp.date_naive()
            );
        }
        Commands::FatLeaderboard { baseline, json } => {
            let rows = service::fat_loss_board(store, &names, *baseline, now).await?;

            if *json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No members with weigh-ins in both periods.");
            } else {
                println!("Fat loss vs {}:", baseline.label());
                for (rank, row) in rows.iter().enumerate() {
                    println!("{:>2}. {} {:+.2}%", rank + 1, row.name, row.fat_loss_percentage);
                }
            }
        }
        Commands::StepsLeaderboard {
            mode,
            week_offset,
            month_offset,
            json,
        } => {
            let window = service::steps_window(*mode, now, *week_offset, *month_offset)?;
            let rows = service::steps_board(store, &names, *mode, window).await?;

            if *json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No steps logged in this window.");
            } else {
                println!(
                    "Top steppers {} to {}:",
                    window.start.date_naive(),
                    window.end.date_naive()
                );
                for (rank, row) in rows.iter().enumerate() {
                    println!("{:>2}. {} {} steps", rank + 1, row.username, row.steps);
                }
            }
        }
        Commands::Stats {
            username,
            month_offset,
            json,
        } => {
            let steps = store
                .fetch(&RecordFilter::series(Series::Steps).subject(username.as_str()))
                .await?;
            let weigh_ins = store
                .fetch(&RecordFilter::series(Series::FatMass).subject(username.as_str()))
                .await?;
            let totals = stats::steps_stats(&steps, now, *month_offset)?;
            let history = stats::fat_mass_history(&weigh_ins);

            if *json {
                print_json(&serde_json::json!({
                    "steps": totals,
                    "weigh_ins": history,
                }))?;
            } else {
                println!(
                    "{}: {} steps total, {} this week, {} per entry on average",
                    username, totals.total_steps, totals.weekly_steps, totals.daily_average
                );
                if totals.entry_dates.is_empty() {
                    println!("No entries in the selected month.");
                } else {
                    let days: Vec<String> =
                        totals.entry_dates.iter().map(ToString::to_string).collect();
                    println!("Entries on: {}", days.join(", "));
                }
                for weigh_in in &history {
                    let change = weigh_in
                        .change_from_previous
                        .map(|delta| format!(" ({delta:+.2} kg)"))
                        .unwrap_or_default();
                    println!(
                        "- week of {}: fat mass {:.2} kg{}",
                        weigh_in.week_start, weigh_in.fat_mass, change
                    );
                }
            }
        }
        Commands::Report { out } => {
            let report = report::build_report(store, &names, now).await?;
            std::fs::write(out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
