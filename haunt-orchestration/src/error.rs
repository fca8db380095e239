//! Erros de orquestração

use haunt_core::traits::SinkError;
use haunt_ranging::RangingError;
use thiserror::Error;

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Erros de orquestração
#[derive(Debug, Error, Clone)]
pub enum OrchestrationError {
    /// Configuração inválida
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Falha ao carregar configuração
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    /// Erro da fonte de distância
    #[error("Ranging error: {0}")]
    Ranging(#[from] RangingError),

    /// Erro do sink sonoro
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Thread não pôde ser criada
    #[error("Failed to spawn activity: {0}")]
    SpawnFailed(String),

    /// Atividade terminou com pânico
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Lock poison
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for OrchestrationError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        OrchestrationError::LockPoisoned(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestrationError::InvalidConfiguration("scare_near >= idle_far".into());
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_ranging_error_conversion() {
        let err: OrchestrationError = RangingError::InvalidConfig("window".into()).into();
        assert!(err.to_string().contains("Ranging error"));
    }

    #[test]
    fn test_poison_conversion() {
        let lock = std::sync::Arc::new(std::sync::Mutex::new(0));
        let poisoner = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err: OrchestrationError = lock.lock().unwrap_err().into();
        assert!(matches!(err, OrchestrationError::LockPoisoned(_)));
    }
}
