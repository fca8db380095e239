//! Builds configuration, sensor and sink from the arguments

use anyhow::Context;
use haunt_core::traits::SoundSink;
use haunt_orchestration::HauntConfig;
use haunt_ranging::iio::IIO_DEVICES_ROOT;
use haunt_ranging::{IioConfig, IioRangeSensor, ScriptedRangeSensor};
use haunt_voice::{FluidSynthConfig, FluidSynthSink, RecordingSink};
use tracing::{debug, info};

use crate::args::{Args, SinkKind};

/// File → `HAUNT_*` environment → flags, then validation
pub fn build_config(args: &Args) -> anyhow::Result<HauntConfig> {
    build_config_with(args, haunt_core::env::var)
}

/// Same layering with `HAUNT_*` values taken from `lookup`
pub fn build_config_with<F>(args: &Args, lookup: F) -> anyhow::Result<HauntConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => HauntConfig::load(path)?,
        None => HauntConfig::default(),
    };

    let applied = config.apply_env(lookup)?;
    if !applied.is_empty() {
        debug!(keys = ?applied, "environment overrides applied");
    }

    args.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Opens the HC-SR04; `None` scans every IIO device for the srf04 driver
pub fn open_iio(device: Option<&std::path::Path>) -> anyhow::Result<IioRangeSensor> {
    let config = match device {
        Some(path) => IioConfig::for_device(path),
        None => IioRangeSensor::discover(IIO_DEVICES_ROOT)
            .context("no rangefinder found; load the hc-sr04 overlay or pass --sensor iio:<dir>")?,
    };

    info!(device = %config.device_path.display(), "using IIO rangefinder");
    Ok(IioRangeSensor::open(config)?)
}

pub fn open_script(script: &str) -> anyhow::Result<ScriptedRangeSensor> {
    let sensor = ScriptedRangeSensor::parse(script)?.named("sim");
    info!(script, "using scripted distances");
    Ok(sensor)
}

pub fn build_sink(args: &Args, config: &HauntConfig) -> anyhow::Result<Box<dyn SoundSink>> {
    match args.sink {
        SinkKind::Fluidsynth => {
            let mut synth = FluidSynthConfig {
                channels: config.voice.channels,
                ..FluidSynthConfig::default()
            };
            if let Some(path) = &args.fluidsynth_config {
                synth.config_file = Some(path.clone());
            }
            if let Some(path) = &args.soundfont {
                synth.soundfont = Some(path.clone());
            }
            debug!(command = ?synth.command_line(), "fluidsynth command line");
            Ok(Box::new(FluidSynthSink::new(synth)?))
        }
        SinkKind::Log => Ok(Box::new(RecordingSink::with_history(256).named("log").logging(true))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use clap::Parser;
    use haunt_core::traits::HauntComponent;

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haunt.json");
        std::fs::write(&path, r#"{ "thresholds": { "idle_far_cm": 320.0 }, "dwell": { "release_ms": 900 } }"#).unwrap();

        let args = Args::parse_from([
            "haunt",
            "--config",
            path.to_str().unwrap(),
            "--release-dwell-ms",
            "1200",
        ]);
        let config = build_config_with(&args, |_| None).unwrap();

        assert_eq!(config.thresholds.idle_far_cm, 320.0);
        assert_eq!(config.dwell.release_ms, 1_200);
        assert_eq!(config.dwell.idle_ms, 300);
    }

    #[test]
    fn test_environment_sits_between_file_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haunt.json");
        std::fs::write(&path, r#"{ "thresholds": { "idle_far_cm": 320.0 }, "dwell": { "idle_ms": 250 } }"#).unwrap();

        let env: HashMap<&str, &str> = [
            ("HAUNT_IDLE_FAR_CM", "330"),
            ("HAUNT_RELEASE_DWELL_MS", "700"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let args = Args::parse_from([
            "haunt",
            "--config",
            path.to_str().unwrap(),
            "--release-dwell-ms",
            "1200",
        ]);
        let config = build_config_with(&args, lookup).unwrap();

        assert_eq!(config.thresholds.idle_far_cm, 330.0);
        assert_eq!(config.dwell.idle_ms, 250);
        assert_eq!(config.dwell.release_ms, 1_200);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::parse_from(["haunt", "--scare-near-cm", "500"]);
        assert!(build_config_with(&args, |_| None).is_err());

        let args = Args::parse_from(["haunt"]);
        let bad_window = |key: &str| (key == "HAUNT_WINDOW_SIZE").then(|| "ten".to_string());
        assert!(build_config_with(&args, bad_window).is_err());
    }

    #[test]
    fn test_missing_iio_device() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_iio(Some(dir.path())).is_err());
    }

    #[test]
    fn test_log_sink() {
        let args = Args::parse_from(["haunt", "--sink", "log"]);
        let sink = build_sink(&args, &HauntConfig::default()).unwrap();
        assert_eq!(sink.name(), "log");
    }
}
