//! # 🎯 Traits — Contratos dos Colaboradores
//!
//! | Papel | Trait | Implementações |
//! |:------|:------|:---------------|
//! | Percepção | [`Sensor`] | `haunt-ranging` (IIO, scripted) |
//! | Atuação | [`SoundSink`] | `haunt-voice` (FluidSynth, recording) |
//!
//! Os traits são abstrações puras: o núcleo nunca conhece o hardware, apenas
//! handles possuídos explicitamente e passados aos componentes que os usam.

use std::fmt::Debug;

use crate::types::{SilenceTarget, SoundChannel, Voice};

// ═══════════════════════════════════════════════════════════════════════════════
// TRAIT BASE
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait base para qualquer componente do ecossistema haunt.
///
/// # Exemplo
///
/// ```ignore
/// use haunt_core::traits::HauntComponent;
///
/// #[derive(Debug)]
/// struct Rangefinder;
///
/// impl HauntComponent for Rangefinder {
///     fn name(&self) -> &str { "hc-sr04" }
/// }
/// ```
pub trait HauntComponent: Send + Sync + Debug {
    /// Nome único do componente (para logs e debug)
    fn name(&self) -> &str;

    /// Versão do componente
    fn version(&self) -> &str {
        "2026.10.1"
    }

    /// Componente está pronto para uso?
    fn is_ready(&self) -> bool {
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PERCEPÇÃO — Sensores
// ═══════════════════════════════════════════════════════════════════════════════

/// Erro de sensor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("Sensor not initialized")]
    NotInitialized,
    #[error("Sensor read failed: {0}")]
    ReadFailed(String),
    #[error("Configuration invalid: {0}")]
    InvalidConfig(String),
    #[error("Hardware error: {0}")]
    Hardware(String),
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// Trait para sensores lidos sob demanda.
///
/// O sensor não guarda estado que o núcleo precise gerenciar além do handle
/// adquirido uma vez na inicialização.
///
/// # Exemplo
///
/// ```ignore
/// use haunt_core::traits::{Sensor, SensorError};
///
/// impl Sensor for Rangefinder {
///     type Reading = f64; // centímetros
///     type Config = ();
///
///     fn read(&mut self) -> Result<f64, SensorError> {
///         Ok(120.0)
///     }
/// }
/// ```
pub trait Sensor: HauntComponent {
    /// Tipo da leitura bruta
    type Reading;

    /// Tipo de configuração do sensor
    type Config;

    /// Configura o sensor
    fn configure(&mut self, _config: Self::Config) -> Result<(), SensorError> {
        Ok(())
    }

    /// Lê uma amostra bruta
    fn read(&mut self) -> Result<Self::Reading, SensorError>;

    /// Calibra o sensor
    fn calibrate(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATUAÇÃO — Saída sonora
// ═══════════════════════════════════════════════════════════════════════════════

/// Erro do sink sonoro
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("Sound sink not connected")]
    NotConnected,
    #[error("Sound sink unavailable: {0}")]
    Unavailable(String),
    #[error("Command failed: {0}")]
    CommandFailed(String),
    #[error("Configuration invalid: {0}")]
    InvalidConfig(String),
}

/// Status da sessão do sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SinkStatus {
    /// `connect` ainda não foi chamado (ou `disconnect` já foi)
    Disconnected,
    /// Sessão ativa
    Ready,
    /// Sessão perdida; não há reconexão automática
    Lost,
}

/// Trait para o back end que produz som.
///
/// Todas as chamadas são fire-and-forget: o núcleo nunca espera resposta além
/// do estabelecimento da conexão.
pub trait SoundSink: HauntComponent {
    /// Estabelece a sessão (uma vez, antes de qualquer `trigger`/`silence`)
    fn connect(&mut self) -> Result<(), SinkError>;

    /// Dispara uma nota no canal, re-disparando se já houver uma soando
    fn trigger(&mut self, channel: SoundChannel, voice: Voice) -> Result<(), SinkError>;

    /// Silencia um canal ou todos
    fn silence(&mut self, target: SilenceTarget) -> Result<(), SinkError>;

    /// Encerra a sessão
    fn disconnect(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Status atual da sessão
    fn status(&self) -> SinkStatus;
}

impl<S: SoundSink + ?Sized> HauntComponent for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn version(&self) -> &str {
        (**self).version()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

impl<S: SoundSink + ?Sized> SoundSink for Box<S> {
    fn connect(&mut self) -> Result<(), SinkError> {
        (**self).connect()
    }

    fn trigger(&mut self, channel: SoundChannel, voice: Voice) -> Result<(), SinkError> {
        (**self).trigger(channel, voice)
    }

    fn silence(&mut self, target: SilenceTarget) -> Result<(), SinkError> {
        (**self).silence(target)
    }

    fn disconnect(&mut self) -> Result<(), SinkError> {
        (**self).disconnect()
    }

    fn status(&self) -> SinkStatus {
        (**self).status()
    }
}
