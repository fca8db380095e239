//! Mapeamento distância → intervalo → voz
//!
//! Funções puras e monótonas:
//!
//! | Saída | Fórmula | Default |
//! |:------|:--------|:--------|
//! | buzz | `clamp(d / div, min, max)` | `d / 200`, 0.1–2.5 s |
//! | thunder | `max(d / div, min)` | `d / 30`, ≥ 9.6 s |
//! | voz do buzz | linear decrescente no intervalo | nota 36–60, volume 35–55 |
//!
//! Quanto mais perto o alvo, mais curto o intervalo e mais aguda e forte a nota.

use haunt_core::types::{Centimeters, Interval, SoundChannel, Voice};

use crate::config::{MapperConfig, VoiceConfig};

/// Bloco de mapeamento (cópia barata; cada atividade guarda a sua)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalMapper {
    mapper: MapperConfig,
    voice: VoiceConfig,
}

impl Default for IntervalMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default(), VoiceConfig::default())
    }
}

impl IntervalMapper {
    pub fn new(mapper: MapperConfig, voice: VoiceConfig) -> Self {
        Self { mapper, voice }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.mapper
    }

    /// Período do buzz para a distância `d`
    pub fn buzz_interval(&self, d: Centimeters) -> Interval {
        let m = &self.mapper;
        Interval::active((d / m.buzz_divisor).clamp(m.buzz_min_s, m.buzz_max_s))
    }

    /// Período do thunder para a distância `d` (já com o piso)
    pub fn thunder_interval(&self, d: Centimeters) -> Interval {
        let m = &self.mapper;
        Interval::active((d / m.thunder_divisor).max(m.thunder_min_s))
    }

    /// Nota e volume do buzz para um intervalo (segundos)
    pub fn buzz_voice(&self, interval_s: f64) -> Voice {
        let v = &self.voice;
        Voice::new(
            self.scale(interval_s, v.pitch_min, v.pitch_max),
            self.scale(interval_s, v.volume_min, v.volume_max),
        )
    }

    /// Voz fixa do thunder
    pub fn thunder_voice(&self) -> Voice {
        self.voice.thunder
    }

    /// Voz do canal para um intervalo ativo
    pub fn voice_for(&self, channel: SoundChannel, interval_s: f64) -> Voice {
        match channel {
            SoundChannel::Buzz => self.buzz_voice(interval_s),
            SoundChannel::Thunder => self.thunder_voice(),
        }
    }

    /// `max - ratio * (interval - interval_min)`, limitado e arredondado
    fn scale(&self, interval_s: f64, min: u8, max: u8) -> u8 {
        let (lo, hi) = (f64::from(min), f64::from(max));
        let (i_min, i_max) = (self.mapper.buzz_min_s, self.mapper.buzz_max_s);

        let ratio = (hi - lo) / (i_max - i_min);
        let value = hi - ratio * (interval_s - i_min);
        if value.is_nan() {
            return min;
        }
        value.clamp(lo, hi).round() as u8
    }
}
