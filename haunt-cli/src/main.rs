//! haunt - proximity-driven lure/scare sound controller
//!
//! Reads an ultrasonic rangefinder and plays a buzz that speeds up as a
//! visitor approaches, plus a thunder when they come too close.
//!
//! ## Configuration
//! Layered, later wins: JSON file (`--config`), `HAUNT_*` variables (also read
//! from `.env`), then command-line flags. Examples:
//! - `HAUNT_IDLE_FAR_CM`, `HAUNT_SCARE_NEAR_CM`, `HAUNT_LURE_ENTRY_MIN_CM`
//! - `HAUNT_WINDOW_SIZE`, `HAUNT_POLL_INTERVAL_MS`
//! - `HAUNT_RELEASE_DWELL_MS`, `HAUNT_BUZZ_DIVISOR`, `HAUNT_THUNDER_MIN_S`
//!
//! Logging follows `RUST_LOG` (default `haunt=info,haunt_orchestration=info`).

mod args;
mod setup;

use std::time::Duration;

use clap::Parser;
use colored::*;
use haunt_core::traits::{Sensor, SoundSink};
use haunt_core::types::{Centimeters, SoundChannel};
use haunt_orchestration::{HauntConfig, Orchestrator, RunReport};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Args, SensorSpec};

/// Used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "haunt=info,haunt_orchestration=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = setup::build_config(&args)?;

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let duration = args.run_for()?;
    let sink = setup::build_sink(&args, &config)?;

    let report = match &args.sensor {
        SensorSpec::Iio(device) => {
            let sensor = setup::open_iio(device.as_deref())?;
            supervise(config, sensor, sink, duration).await?
        }
        SensorSpec::Sim(script) => {
            let sensor = setup::open_script(script)?;
            supervise(config, sensor, sink, duration).await?
        }
    };

    log_report(&report);
    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Runs until Ctrl-C (or `duration`), then shuts down
async fn supervise<S>(
    config: HauntConfig,
    sensor: S,
    sink: Box<dyn SoundSink>,
    duration: Option<Duration>,
) -> anyhow::Result<RunReport>
where
    S: Sensor<Reading = Centimeters> + 'static,
{
    let running = Orchestrator::new(config)?.start(sensor, sink)?;

    match duration {
        Some(limit) => {
            info!("haunt running for {:.1}s (Ctrl-C to stop early)", limit.as_secs_f64());
            tokio::select! {
                result = tokio::signal::ctrl_c() => result?,
                _ = tokio::time::sleep(limit) => {}
            }
        }
        None => {
            info!("haunt running (Ctrl-C to stop)");
            tokio::signal::ctrl_c().await?;
        }
    }

    info!("shutting down");
    let report = tokio::task::spawn_blocking(move || running.shutdown()).await??;
    Ok(report)
}

fn log_report(report: &RunReport) {
    info!("");
    info!("Run summary:");
    info!("  Uptime:      {:.1}s", report.uptime.as_secs_f64());
    info!("  Final state: {}", report.final_state);
    info!("  Transitions: {}", report.machine.transitions);
    info!(
        "  Polls:       {} ({} faults, {} without target)",
        report.ranging.polls, report.ranging.faults, report.ranging.no_target
    );
    for channel in SoundChannel::ALL {
        let stats = report.channel(channel);
        info!(
            "  {:<12} {} emissions, {} failures",
            format!("{}:", channel),
            stats.emissions,
            stats.failures
        );
    }
    info!("  Sink:        {:?}", report.sink_status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());

        let targets: Vec<&str> = DEFAULT_LOG_FILTER
            .split(',')
            .filter_map(|directive| directive.split('=').next())
            .collect();
        assert_eq!(targets, vec!["haunt", "haunt_orchestration"]);
    }
}
