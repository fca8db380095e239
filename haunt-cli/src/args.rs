//! Command-line arguments

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use haunt_orchestration::HauntConfig;

#[derive(Parser, Debug)]
#[command(name = "haunt")]
#[command(author = "Haunt Contributors")]
#[command(version = "2026.10.1")]
#[command(about = "Proximity-driven lure/scare sound controller", long_about = None)]
pub struct Args {
    /// JSON configuration file (missing fields keep their defaults)
    #[arg(short, long, value_name = "FILE", env = "HAUNT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Distance source: `iio:auto`, `iio:<device dir>` or `sim:<script>`
    /// (e.g. `sim:400*20,300*30,x,40*50`)
    #[arg(short, long, default_value = "iio:auto", env = "HAUNT_SENSOR")]
    pub sensor: SensorSpec,

    /// Sound back end
    #[arg(long, value_enum, default_value_t = SinkKind::Fluidsynth, env = "HAUNT_SINK")]
    pub sink: SinkKind,

    /// FluidSynth settings file passed with `-f`
    #[arg(long, value_name = "FILE", env = "HAUNT_FLUIDSYNTH_CONFIG")]
    pub fluidsynth_config: Option<PathBuf>,

    /// SoundFont loaded by FluidSynth
    #[arg(long, value_name = "SF2", env = "HAUNT_SOUNDFONT")]
    pub soundfont: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(short, long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Override: no target at or beyond this distance (cm)
    #[arg(long, value_name = "CM")]
    pub idle_far_cm: Option<f64>,

    /// Override: Scare below this distance (cm)
    #[arg(long, value_name = "CM")]
    pub scare_near_cm: Option<f64>,

    /// Override: lower bound of the Idle → Lure band (cm)
    #[arg(long, value_name = "CM")]
    pub lure_entry_min_cm: Option<f64>,

    /// Override: rolling-minimum window (samples)
    #[arg(long, value_name = "N")]
    pub window_size: Option<usize>,

    /// Override: sensor polling period (ms)
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Override: dwell before returning to Idle (ms)
    #[arg(long, value_name = "MS")]
    pub release_dwell_ms: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Print the run report as JSON on exit
    #[arg(long)]
    pub report: bool,
}

impl Args {
    /// Apply flag overrides (highest precedence)
    pub fn apply_overrides(&self, config: &mut HauntConfig) {
        if let Some(v) = self.idle_far_cm {
            config.thresholds.idle_far_cm = v;
        }
        if let Some(v) = self.scare_near_cm {
            config.thresholds.scare_near_cm = v;
        }
        if let Some(v) = self.lure_entry_min_cm {
            config.thresholds.lure_entry_min_cm = v;
        }
        if let Some(v) = self.window_size {
            config.sensor.window_size = v;
        }
        if let Some(v) = self.poll_interval_ms {
            config.sensor.poll_interval_ms = v;
        }
        if let Some(v) = self.release_dwell_ms {
            config.dwell.release_ms = v;
        }
    }

    pub fn run_for(&self) -> anyhow::Result<Option<Duration>> {
        match self.duration {
            None => Ok(None),
            Some(s) if s.is_finite() && s > 0.0 => Ok(Some(Duration::from_secs_f64(s))),
            Some(s) => anyhow::bail!("duration must be a positive number of seconds, got {}", s),
        }
    }
}

/// Where distances come from
#[derive(Debug, Clone, PartialEq)]
pub enum SensorSpec {
    /// HC-SR04 through IIO; `None` discovers the first srf04 device
    Iio(Option<PathBuf>),
    /// Scripted distances
    Sim(String),
}

impl FromStr for SensorSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("iio", "auto")) | Some(("iio", "")) => Ok(SensorSpec::Iio(None)),
            Some(("iio", path)) => Ok(SensorSpec::Iio(Some(PathBuf::from(path)))),
            Some(("sim", script)) if !script.trim().is_empty() => Ok(SensorSpec::Sim(script.to_string())),
            Some(("sim", _)) => Err("sim sensor needs a script, e.g. sim:300*30,40*50".to_string()),
            _ if s == "iio" => Ok(SensorSpec::Iio(None)),
            _ => Err(format!("unknown sensor '{}', expected iio:auto, iio:<dir> or sim:<script>", s)),
        }
    }
}

impl fmt::Display for SensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorSpec::Iio(None) => write!(f, "iio:auto"),
            SensorSpec::Iio(Some(path)) => write!(f, "iio:{}", path.display()),
            SensorSpec::Sim(script) => write!(f, "sim:{}", script),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// FluidSynth child process
    Fluidsynth,
    /// Log every command instead of playing it
    Log,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_spec_parsing() {
        assert_eq!("iio:auto".parse::<SensorSpec>().unwrap(), SensorSpec::Iio(None));
        assert_eq!("iio".parse::<SensorSpec>().unwrap(), SensorSpec::Iio(None));
        assert_eq!(
            "iio:/sys/bus/iio/devices/iio:device1".parse::<SensorSpec>().unwrap(),
            SensorSpec::Iio(Some(PathBuf::from("/sys/bus/iio/devices/iio:device1")))
        );
        assert_eq!(
            "sim:300*10,40".parse::<SensorSpec>().unwrap(),
            SensorSpec::Sim("300*10,40".into())
        );
        assert!("sim:".parse::<SensorSpec>().is_err());
        assert!("lidar:0".parse::<SensorSpec>().is_err());
    }

    #[test]
    fn test_flag_overrides() {
        let args = Args::parse_from([
            "haunt",
            "--sensor",
            "sim:200",
            "--sink",
            "log",
            "--idle-far-cm",
            "300",
            "--release-dwell-ms",
            "500",
        ]);
        let mut config = HauntConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(args.sink, SinkKind::Log);
        assert_eq!(config.thresholds.idle_far_cm, 300.0);
        assert_eq!(config.dwell.release_ms, 500);
        assert_eq!(config.thresholds.scare_near_cm, 90.0);
    }

    #[test]
    fn test_duration_must_be_positive() {
        let args = Args::parse_from(["haunt", "--duration", "0"]);
        assert!(args.run_for().is_err());
        let args = Args::parse_from(["haunt", "--duration", "2.5"]);
        assert_eq!(args.run_for().unwrap(), Some(Duration::from_millis(2_500)));
    }
}
