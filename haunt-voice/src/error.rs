//! Erros da camada sonora

use haunt_core::traits::SinkError;
use thiserror::Error;

pub type VoiceResult<T> = Result<T, VoiceError>;

/// Erros de sink sonoro
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// Processo do sintetizador não iniciou
    #[error("Synth spawn failed: {0}")]
    SpawnFailed(String),

    /// Sintetizador não ficou pronto a tempo
    #[error("Synth not ready after {0}ms")]
    ReadyTimeout(u64),

    /// Sessão encerrada pelo outro lado
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// Sink ainda não conectado
    #[error("Sink not connected")]
    NotConnected,

    /// Configuração inválida
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<VoiceError> for SinkError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::NotConnected => SinkError::NotConnected,
            VoiceError::InvalidConfig(msg) => SinkError::InvalidConfig(msg),
            VoiceError::SpawnFailed(msg) | VoiceError::SessionLost(msg) => {
                SinkError::Unavailable(msg)
            }
            VoiceError::ReadyTimeout(ms) => {
                SinkError::Unavailable(format!("synth not ready after {}ms", ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoiceError::ReadyTimeout(10_000);
        assert!(err.to_string().contains("10000ms"));
    }

    #[test]
    fn test_conversion_to_sink_error() {
        let err: SinkError = VoiceError::SessionLost("broken pipe".into()).into();
        assert_eq!(err, SinkError::Unavailable("broken pipe".into()));

        let err: SinkError = VoiceError::NotConnected.into();
        assert_eq!(err, SinkError::NotConnected);
    }
}
