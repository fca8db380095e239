//! Tipos compartilhados entre percepção, orquestração e atuação

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Distância em centímetros
pub type Centimeters = f64;

// ═══════════════════════════════════════════════════════════════════════════════
// ESTADO DE PROXIMIDADE
// ═══════════════════════════════════════════════════════════════════════════════

/// Regime atual do controlador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProximityState {
    /// Nenhum alvo: silêncio
    #[default]
    Idle,
    /// Alvo à distância: buzz intermitente
    Lure,
    /// Alvo próximo: buzz + thunder
    Scare,
}

impl ProximityState {
    pub const ALL: [ProximityState; 3] = [Self::Idle, Self::Lure, Self::Scare];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Lure => "lure",
            Self::Scare => "scare",
        }
    }
}

impl fmt::Display for ProximityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERVALO
// ═══════════════════════════════════════════════════════════════════════════════

/// Período mínimo entre eventos de um canal, ou o sentinela "inativo".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// Canal não produz eventos
    #[default]
    Inactive,
    /// Período em segundos (sempre positivo e finito)
    Active(f64),
}

impl Interval {
    pub const INACTIVE: Interval = Interval::Inactive;

    /// Cria intervalo ativo; valores não positivos ou não finitos viram `Inactive`
    pub fn active(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self::Active(seconds)
        } else {
            Self::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Active(s) => Some(*s),
            Self::Inactive => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        self.seconds().and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    /// Aplica um piso absoluto (mantém `Inactive` inativo)
    pub fn with_floor(self, floor_seconds: f64) -> Self {
        match self {
            Self::Active(s) => Self::Active(s.max(floor_seconds)),
            Self::Inactive => Self::Inactive,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(s) => write!(f, "{:.2}s", s),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CANAIS E VOZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Canal sonoro lógico
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundChannel {
    /// Tom intermitente de atração
    Buzz,
    /// Evento grave exclusivo do regime Scare
    Thunder,
}

impl SoundChannel {
    pub const ALL: [SoundChannel; 2] = [Self::Buzz, Self::Thunder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buzz => "buzz",
            Self::Thunder => "thunder",
        }
    }
}

impl fmt::Display for SoundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alvo de um pedido de silêncio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SilenceTarget {
    Channel(SoundChannel),
    All,
}

/// Par nota/volume de um disparo (faixa MIDI 0-127)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voice {
    pub pitch: u8,
    pub volume: u8,
}

impl Voice {
    pub const MIDI_MAX: u8 = 127;

    /// Cria voz, saturando em 127
    pub fn new(pitch: u8, volume: u8) -> Self {
        Self {
            pitch: pitch.min(Self::MIDI_MAX),
            volume: volume.min(Self::MIDI_MAX),
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pitch={} volume={}", self.pitch, self.volume)
    }
}
