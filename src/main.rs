//! Shadow Waste Engine CLI
//!
//! Drives scheduled monitoring cycles over a batch of meter readings and
//! prints the decisions the pipeline produces.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use shadow_waste_engine::{
    config::Config,
    core::{BaselineStrategy, CycleDriver, CycleOutcome},
    ingest::{load_schedule, load_usage_logs},
    Decision, VERSION,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shadow-waste")]
#[command(version = VERSION)]
#[command(about = "Detects water and electricity waste during scheduled inactivity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scheduled monitoring cycles over a reading batch
    Run {
        /// Usage-log CSV (timestamp,building,resource,usage)
        #[arg(long)]
        readings: PathBuf,

        /// Schedule CSV (building,start_time,end_time,expected_activity)
        #[arg(long)]
        schedule: PathBuf,

        /// Baseline strategy for the session
        #[arg(long, value_enum, default_value_t = BaselineStrategy::Mean)]
        strategy: BaselineStrategy,

        /// Stop after this many data cycles (a day is 48)
        #[arg(long)]
        max_cycles: Option<u32>,

        /// Export the anomaly and decision streams as JSON
        #[arg(long)]
        export: bool,

        /// Export directory (defaults to the configured export path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Load and check both sources without running the pipeline
    Validate {
        #[arg(long)]
        readings: PathBuf,

        #[arg(long)]
        schedule: PathBuf,
    },

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            readings,
            schedule,
            strategy,
            max_cycles,
            export,
            output,
        } => cmd_run(&readings, &schedule, strategy, max_cycles, export, output),
        Commands::Validate { readings, schedule } => cmd_validate(&readings, &schedule),
        Commands::Config => cmd_config(),
    }
}

fn cmd_run(
    readings_path: &PathBuf,
    schedule_path: &PathBuf,
    strategy: BaselineStrategy,
    max_cycles: Option<u32>,
    export: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("Shadow Waste Engine v{VERSION}");
    println!();

    let config = Config::load().unwrap_or_default();

    let readings = load_usage_logs(readings_path)
        .with_context(|| format!("loading usage logs from {readings_path:?}"))?;
    let schedule = load_schedule(schedule_path)
        .with_context(|| format!("loading schedule from {schedule_path:?}"))?;

    println!("Loaded {} readings, {} schedule rules", readings.len(), schedule.len());
    println!("Baseline strategy: {strategy}");
    println!("Cycle length: {} minutes", config.cycle_minutes);
    println!();

    let mut driver = CycleDriver::with_cycle_length(
        readings,
        schedule,
        strategy,
        Duration::minutes(config.cycle_minutes),
    );

    loop {
        if let Some(max) = max_cycles {
            if driver.cycle_count() >= max {
                println!("Stopping after {max} cycles.");
                break;
            }
        }
        match driver.run_cycle() {
            CycleOutcome::Ready {
                run_time,
                readings,
                anomalies,
            } => {
                println!(
                    "[{}] Cycle {}: {} readings, {} anomalies",
                    run_time.format("%Y-%m-%d %H:%M"),
                    driver.cycle_count(),
                    readings,
                    anomalies
                );
            }
            CycleOutcome::NoData { .. } => {}
            CycleOutcome::Exhausted => break,
        }
    }

    println!();
    for decision in driver.decision_history() {
        print_decision(decision);
    }

    println!("{}", driver.stats().summary());

    if export {
        let export_dir = output.unwrap_or_else(|| config.export_path.clone());
        std::fs::create_dir_all(&export_dir)
            .with_context(|| format!("creating export directory {export_dir:?}"))?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");

        let anomalies_path = export_dir.join(format!("anomalies_{stamp}.json"));
        let anomalies_json = serde_json::to_string_pretty(driver.anomaly_history())?;
        std::fs::write(&anomalies_path, anomalies_json)
            .with_context(|| format!("writing {anomalies_path:?}"))?;

        let decisions_path = export_dir.join(format!("decisions_{stamp}.json"));
        let decisions_json = serde_json::to_string_pretty(driver.decision_history())?;
        std::fs::write(&decisions_path, decisions_json)
            .with_context(|| format!("writing {decisions_path:?}"))?;

        println!();
        println!(
            "Exported {} anomaly records to {:?}",
            driver.anomaly_history().len(),
            anomalies_path
        );
        println!(
            "Exported {} decisions to {:?}",
            driver.decision_history().len(),
            decisions_path
        );
    }

    Ok(())
}

/// Render one decision the way an operator reads it.
fn print_decision(decision: &Decision) {
    println!("{}", "=".repeat(72));
    println!("Building           : {}", decision.building);
    println!("Resource           : {}", decision.resource);
    println!("Issue              : {}", decision.detected_issue);
    println!("{}", "-".repeat(72));
    println!("Observed usage     : {:.1}", decision.observed_usage);
    println!("Normal (silence)   : {:.1}", decision.normal_silence_usage);
    println!("Confidence         : {:.1}%", decision.confidence_percent);
    println!("Cycle / run time   : {} / {}", decision.cycle, decision.run_time.format("%Y-%m-%d %H:%M"));
    println!("{}", "-".repeat(72));
    println!("Likely cause       : {}", decision.likely_cause);
    println!("Recommended action : {}", decision.recommended_action);
    println!("{}", "=".repeat(72));
    println!();
}

fn cmd_validate(readings_path: &PathBuf, schedule_path: &PathBuf) -> Result<()> {
    let readings = load_usage_logs(readings_path)
        .with_context(|| format!("loading usage logs from {readings_path:?}"))?;
    let schedule = load_schedule(schedule_path)
        .with_context(|| format!("loading schedule from {schedule_path:?}"))?;

    let buildings: std::collections::HashSet<&str> =
        readings.iter().map(|r| r.building.as_str()).collect();
    let silence_rules = schedule.iter().filter(|r| r.is_silence_rule()).count();

    println!("Usage logs  : {} readings across {} buildings", readings.len(), buildings.len());
    println!("Schedule    : {} rules ({} silence windows)", schedule.len(), silence_rules);

    if let (Some(first), Some(last)) = (
        readings.iter().map(|r| r.timestamp).min(),
        readings.iter().map(|r| r.timestamp).max(),
    ) {
        println!(
            "Time range  : {} .. {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("Both sources parsed cleanly.");
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
