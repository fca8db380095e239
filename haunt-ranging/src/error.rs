//! Erros específicos do módulo de distância

use haunt_core::traits::SensorError;
use thiserror::Error;

pub type RangingResult<T> = Result<T, RangingError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RangingError {
    #[error("Rangefinder device not found: {0}")]
    DeviceNotFound(String),

    #[error("Rangefinder read failed: {0}")]
    ReadFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid script: {0}")]
    InvalidScript(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

// Conversão para SensorError do core
impl From<RangingError> for SensorError {
    fn from(err: RangingError) -> Self {
        match err {
            RangingError::DeviceNotFound(msg) => SensorError::Hardware(msg),
            RangingError::ReadFailed(msg) => SensorError::ReadFailed(msg),
            RangingError::InvalidConfig(msg) | RangingError::InvalidScript(msg) => {
                SensorError::InvalidConfig(msg)
            }
            RangingError::Timeout(ms) => SensorError::Timeout(ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RangingError::DeviceNotFound("/sys/bus/iio/devices/iio:device0".into());
        assert!(err.to_string().contains("iio:device0"));
    }

    #[test]
    fn test_conversion_to_sensor_error() {
        let err: SensorError = RangingError::Timeout(60).into();
        assert_eq!(err, SensorError::Timeout(60));

        let err: SensorError = RangingError::InvalidScript("abc".into()).into();
        assert!(matches!(err, SensorError::InvalidConfig(_)));
    }
}
