//! Configuração do controlador
//!
//! Todos os limiares, dwells e faixas de mapeamento vivem aqui. A configuração
//! é validada uma única vez, antes de qualquer laço começar; uma violação é
//! fatal na partida e nunca aparece em tempo de execução.
//!
//! Camadas, da mais fraca para a mais forte: defaults → arquivo JSON →
//! variáveis `HAUNT_*` → flags da CLI.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use haunt_core::types::{Centimeters, SoundChannel, Voice};
use haunt_ranging::RangingConfig;
use haunt_voice::ChannelMap;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, OrchestrationResult};

/// Parâmetros de polling do sensor
pub type SensorSettings = RangingConfig;

/// Configuração completa
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HauntConfig {
    pub sensor: SensorSettings,
    pub thresholds: ThresholdConfig,
    pub dwell: DwellConfig,
    pub mapper: MapperConfig,
    pub voice: VoiceConfig,
    pub pacing: PacingConfig,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEÇÕES
// ═══════════════════════════════════════════════════════════════════════════════

/// Limiares de distância (cm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// A partir daqui não há alvo
    pub idle_far_cm: Centimeters,
    /// Abaixo daqui é Scare
    pub scare_near_cm: Centimeters,
    /// Limite inferior da faixa Idle→Lure
    pub lure_entry_min_cm: Centimeters,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            idle_far_cm: 350.0,
            scare_near_cm: 90.0,
            lure_entry_min_cm: 0.0,
        }
    }
}

/// Tempo mínimo de permanência antes de deixar cada estado (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// Idle → Lure
    pub idle_ms: u64,
    /// Lure → Scare
    pub lure_ms: u64,
    /// Scare → Lure
    pub scare_ms: u64,
    /// Lure/Scare → Idle
    pub release_ms: u64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            idle_ms: 300,
            lure_ms: 300,
            scare_ms: 300,
            release_ms: 2_000,
        }
    }
}

/// Distância → intervalo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub buzz_divisor: f64,
    pub buzz_min_s: f64,
    pub buzz_max_s: f64,
    pub thunder_divisor: f64,
    /// Piso absoluto do thunder
    pub thunder_min_s: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            buzz_divisor: 200.0,
            buzz_min_s: 0.1,
            buzz_max_s: 2.5,
            thunder_divisor: 30.0,
            thunder_min_s: 9.6,
        }
    }
}

/// Faixas de nota/volume e canais MIDI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub pitch_min: u8,
    pub pitch_max: u8,
    pub volume_min: u8,
    pub volume_max: u8,
    /// Voz fixa do thunder
    pub thunder: Voice,
    pub channels: ChannelMap,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            pitch_min: 36,
            pitch_max: 60,
            volume_min: 35,
            volume_max: 55,
            thunder: Voice::new(30, 50),
            channels: ChannelMap::default(),
        }
    }
}

/// Cadência dos laços internos (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Período de avaliação da máquina de estados
    pub tick_ms: u64,
    /// Pausa do scheduler com canal inativo
    pub inactive_fallback_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            inactive_fallback_ms: 50,
        }
    }
}

impl DwellConfig {
    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    pub fn lure(&self) -> Duration {
        Duration::from_millis(self.lure_ms)
    }

    pub fn scare(&self) -> Duration {
        Duration::from_millis(self.scare_ms)
    }

    pub fn release(&self) -> Duration {
        Duration::from_millis(self.release_ms)
    }
}

impl PacingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn inactive_fallback(&self) -> Duration {
        Duration::from_millis(self.inactive_fallback_ms)
    }
}

impl MapperConfig {
    /// Piso absoluto aplicado pelo scheduler do canal
    pub fn floor(&self, channel: SoundChannel) -> Option<f64> {
        match channel {
            SoundChannel::Buzz => None,
            SoundChannel::Thunder => Some(self.thunder_min_s),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDAÇÃO
// ═══════════════════════════════════════════════════════════════════════════════

fn invalid(msg: impl Into<String>) -> OrchestrationError {
    OrchestrationError::InvalidConfiguration(msg.into())
}

/// Maior intervalo aceito entre disparos (uma hora)
pub const MAX_INTERVAL_S: f64 = 3_600.0;

fn at_most_an_hour(name: &str, value: f64) -> OrchestrationResult<()> {
    if value <= MAX_INTERVAL_S {
        Ok(())
    } else {
        Err(invalid(format!("{} must be at most {} s, got {}", name, MAX_INTERVAL_S, value)))
    }
}

fn positive(name: &str, value: f64) -> OrchestrationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be positive, got {}", name, value)))
    }
}

impl HauntConfig {
    /// Verifica todas as restrições
    pub fn validate(&self) -> OrchestrationResult<()> {
        self.sensor
            .validate()
            .map_err(|e| invalid(format!("sensor: {}", e)))?;

        let t = &self.thresholds;
        if !(t.lure_entry_min_cm.is_finite() && t.scare_near_cm.is_finite() && t.idle_far_cm.is_finite()) {
            return Err(invalid("thresholds must be finite"));
        }
        if !(0.0 <= t.lure_entry_min_cm && t.lure_entry_min_cm <= t.scare_near_cm && t.scare_near_cm < t.idle_far_cm) {
            return Err(invalid(format!(
                "thresholds must satisfy 0 <= lure_entry_min ({}) <= scare_near ({}) < idle_far ({})",
                t.lure_entry_min_cm, t.scare_near_cm, t.idle_far_cm
            )));
        }

        let m = &self.mapper;
        positive("buzz_divisor", m.buzz_divisor)?;
        positive("buzz_min_s", m.buzz_min_s)?;
        positive("thunder_divisor", m.thunder_divisor)?;
        positive("thunder_min_s", m.thunder_min_s)?;
        if !(m.buzz_max_s.is_finite() && m.buzz_min_s < m.buzz_max_s) {
            return Err(invalid(format!(
                "buzz_min_s ({}) must be below buzz_max_s ({})",
                m.buzz_min_s, m.buzz_max_s
            )));
        }
        at_most_an_hour("buzz_max_s", m.buzz_max_s)?;
        at_most_an_hour("thunder_min_s", m.thunder_min_s)?;
        at_most_an_hour("idle_far_cm / thunder_divisor", t.idle_far_cm / m.thunder_divisor)?;

        let v = &self.voice;
        if v.pitch_min > v.pitch_max {
            return Err(invalid(format!("pitch range {}-{} is inverted", v.pitch_min, v.pitch_max)));
        }
        if v.volume_min > v.volume_max {
            return Err(invalid(format!("volume range {}-{} is inverted", v.volume_min, v.volume_max)));
        }
        let midi_max = [v.pitch_max, v.volume_max, v.thunder.pitch, v.thunder.volume]
            .into_iter()
            .max()
            .unwrap_or(0);
        if midi_max > Voice::MIDI_MAX {
            return Err(invalid(format!("MIDI values must be <= {}, got {}", Voice::MIDI_MAX, midi_max)));
        }
        v.channels.validate().map_err(invalid)?;

        if self.pacing.tick_ms == 0 {
            return Err(invalid("tick_ms must be > 0"));
        }
        if self.pacing.inactive_fallback_ms == 0 {
            return Err(invalid("inactive_fallback_ms must be > 0"));
        }

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CARREGAMENTO
    // ═══════════════════════════════════════════════════════════════════════════

    /// Lê JSON (campos ausentes ficam no default). Não valida.
    pub fn from_json_str(text: &str) -> OrchestrationResult<Self> {
        serde_json::from_str(text).map_err(|e| OrchestrationError::ConfigLoad(e.to_string()))
    }

    /// Lê um arquivo JSON. Não valida.
    pub fn load(path: impl AsRef<Path>) -> OrchestrationResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| OrchestrationError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
            .map_err(|e| OrchestrationError::ConfigLoad(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json_pretty(&self) -> OrchestrationResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| OrchestrationError::ConfigLoad(e.to_string()))
    }

    /// Sobrepõe valores de `lookup` (chave completa, ex.: `HAUNT_IDLE_FAR_CM`).
    /// Em produção `lookup` é `haunt_core::env::var` (ambiente e `.env`).
    ///
    /// Retorna as chaves aplicadas. Valores que não fazem parse são erro.
    pub fn apply_env<F>(&mut self, lookup: F) -> OrchestrationResult<Vec<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvOverlay {
            lookup,
            applied: Vec::new(),
        };

        env.set("WINDOW_SIZE", &mut self.sensor.window_size)?;
        env.set("POLL_INTERVAL_MS", &mut self.sensor.poll_interval_ms)?;
        env.set("MAX_RANGE_CM", &mut self.sensor.max_range_cm)?;

        env.set("IDLE_FAR_CM", &mut self.thresholds.idle_far_cm)?;
        env.set("SCARE_NEAR_CM", &mut self.thresholds.scare_near_cm)?;
        env.set("LURE_ENTRY_MIN_CM", &mut self.thresholds.lure_entry_min_cm)?;

        env.set("IDLE_DWELL_MS", &mut self.dwell.idle_ms)?;
        env.set("LURE_DWELL_MS", &mut self.dwell.lure_ms)?;
        env.set("SCARE_DWELL_MS", &mut self.dwell.scare_ms)?;
        env.set("RELEASE_DWELL_MS", &mut self.dwell.release_ms)?;

        env.set("BUZZ_DIVISOR", &mut self.mapper.buzz_divisor)?;
        env.set("BUZZ_MIN_S", &mut self.mapper.buzz_min_s)?;
        env.set("BUZZ_MAX_S", &mut self.mapper.buzz_max_s)?;
        env.set("THUNDER_DIVISOR", &mut self.mapper.thunder_divisor)?;
        env.set("THUNDER_MIN_S", &mut self.mapper.thunder_min_s)?;

        env.set("TICK_MS", &mut self.pacing.tick_ms)?;
        env.set("INACTIVE_FALLBACK_MS", &mut self.pacing.inactive_fallback_ms)?;

        Ok(env.applied)
    }
}

struct EnvOverlay<F> {
    lookup: F,
    applied: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> EnvOverlay<F> {
    fn set<T: FromStr>(&mut self, name: &str, target: &mut T) -> OrchestrationResult<()> {
        let key = haunt_core::env::key(name);
        let Some(raw) = (self.lookup)(&key) else {
            return Ok(());
        };
        *target = raw
            .trim()
            .parse()
            .map_err(|_| invalid(format!("{}: cannot parse '{}'", key, raw)))?;
        self.applied.push(key);
        Ok(())
    }
}
