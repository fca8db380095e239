//! Telemetro HC-SR04 via subsistema IIO do Linux
//!
//! Com o overlay `srf04` carregado (ex.: Raspberry Pi,
//! `dtoverlay=hc-sr04,trig=23,echo=24`), o kernel expõe a distância em
//! `/sys/bus/iio/devices/iio:deviceN/in_distance_raw`, em milímetros. Cada
//! leitura do atributo dispara uma medição; um eco perdido aparece como erro
//! de I/O, que a [`DistanceSource`](crate::DistanceSource) trata como "sem alvo".

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use haunt_core::traits::{HauntComponent, Sensor, SensorError};
use haunt_core::types::Centimeters;
use serde::{Deserialize, Serialize};

use crate::error::{RangingError, RangingResult};

/// Raiz padrão dos dispositivos IIO
pub const IIO_DEVICES_ROOT: &str = "/sys/bus/iio/devices";

/// Nome reportado pelo driver `srf04`
pub const SRF04_DRIVER_NAME: &str = "srf04";

/// Configuração do telemetro IIO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IioConfig {
    /// Diretório do dispositivo (ex.: `/sys/bus/iio/devices/iio:device0`)
    pub device_path: PathBuf,
    /// Atributo com a leitura bruta
    pub attribute: String,
    /// Fator bruto → cm (driver srf04 reporta mm)
    pub raw_to_cm: f64,
}

impl Default for IioConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(IIO_DEVICES_ROOT).join("iio:device0"),
            attribute: "in_distance_raw".to_string(),
            raw_to_cm: 0.1,
        }
    }
}

impl IioConfig {
    pub fn for_device(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
            ..Default::default()
        }
    }

    fn attribute_path(&self) -> PathBuf {
        self.device_path.join(&self.attribute)
    }
}

/// Sensor ultrassônico lido via sysfs
#[derive(Debug, Clone)]
pub struct IioRangeSensor {
    config: IioConfig,
    ready: bool,
    reads: u64,
}

impl IioRangeSensor {
    /// Abre o dispositivo; falha se o atributo não existir
    pub fn open(config: IioConfig) -> RangingResult<Self> {
        if !(config.raw_to_cm.is_finite() && config.raw_to_cm > 0.0) {
            return Err(RangingError::InvalidConfig(format!(
                "raw_to_cm must be positive, got {}",
                config.raw_to_cm
            )));
        }

        let attribute = config.attribute_path();
        if !attribute.exists() {
            return Err(RangingError::DeviceNotFound(attribute.display().to_string()));
        }

        Ok(Self {
            config,
            ready: true,
            reads: 0,
        })
    }

    /// Procura o primeiro dispositivo cujo `name` é o driver srf04
    pub fn discover(root: impl AsRef<Path>) -> RangingResult<IioConfig> {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|e| {
            RangingError::DeviceNotFound(format!("{}: {}", root.display(), e))
        })?;

        let mut devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                fs::read_to_string(path.join("name"))
                    .map(|name| name.trim() == SRF04_DRIVER_NAME)
                    .unwrap_or(false)
            })
            .collect();
        devices.sort();

        devices
            .into_iter()
            .next()
            .map(IioConfig::for_device)
            .ok_or_else(|| {
                RangingError::DeviceNotFound(format!(
                    "no '{}' device under {}",
                    SRF04_DRIVER_NAME,
                    root.display()
                ))
            })
    }

    pub fn config(&self) -> &IioConfig {
        &self.config
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl HauntComponent for IioRangeSensor {
    fn name(&self) -> &str {
        "iio-rangefinder"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

impl Sensor for IioRangeSensor {
    type Reading = Centimeters;
    type Config = IioConfig;

    fn configure(&mut self, config: Self::Config) -> Result<(), SensorError> {
        *self = Self::open(config)?;
        Ok(())
    }

    fn read(&mut self) -> Result<Centimeters, SensorError> {
        if !self.ready {
            return Err(SensorError::NotInitialized);
        }

        self.reads += 1;
        let path = self.config.attribute_path();
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => SensorError::Timeout(0),
            ErrorKind::NotFound => SensorError::Hardware(format!("{} disappeared", path.display())),
            _ => SensorError::ReadFailed(e.to_string()),
        })?;

        let raw: f64 = text.trim().parse().map_err(|_| {
            SensorError::ReadFailed(format!("unparsable reading '{}'", text.trim()))
        })?;

        Ok(raw * self.config.raw_to_cm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_device(root: &Path, dir: &str, name: &str, raw: &str) -> PathBuf {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("name"), format!("{}\n", name)).unwrap();
        fs::write(path.join("in_distance_raw"), format!("{}\n", raw)).unwrap();
        path
    }

    #[test]
    fn test_read_converts_mm_to_cm() {
        let root = tempfile::tempdir().unwrap();
        let device = fake_device(root.path(), "iio:device0", "srf04", "1234");

        let mut sensor = IioRangeSensor::open(IioConfig::for_device(&device)).unwrap();
        let cm = sensor.read().unwrap();
        assert!((cm - 123.4).abs() < 1e-9);
        assert_eq!(sensor.reads(), 1);
    }

    #[test]
    fn test_open_missing_device() {
        let root = tempfile::tempdir().unwrap();
        let result = IioRangeSensor::open(IioConfig::for_device(root.path().join("nope")));
        assert!(matches!(result, Err(RangingError::DeviceNotFound(_))));
    }

    #[test]
    fn test_unparsable_reading_is_error() {
        let root = tempfile::tempdir().unwrap();
        let device = fake_device(root.path(), "iio:device0", "srf04", "garbage");

        let mut sensor = IioRangeSensor::open(IioConfig::for_device(&device)).unwrap();
        assert!(matches!(sensor.read(), Err(SensorError::ReadFailed(_))));
    }

    #[test]
    fn test_discover_finds_srf04() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "iio:device0", "ads1015", "0");
        let expected = fake_device(root.path(), "iio:device1", "srf04", "500");

        let config = IioRangeSensor::discover(root.path()).unwrap();
        assert_eq!(config.device_path, expected);
    }

    #[test]
    fn test_discover_without_device() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "iio:device0", "ads1015", "0");
        assert!(IioRangeSensor::discover(root.path()).is_err());
    }
}
