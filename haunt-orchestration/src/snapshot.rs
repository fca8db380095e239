//! Snapshot publicado pela máquina de estados

use std::time::Instant;

use haunt_core::types::{Centimeters, Interval, ProximityState, SoundChannel};

/// Estado completo visto pelos schedulers.
///
/// Publicado inteiro em uma célula `Latest`, então estado, timer e intervalos
/// nunca aparecem misturados entre duas versões.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySnapshot {
    pub state: ProximityState,
    /// Instante da última transição (StateTimer)
    pub entered_at: Instant,
    /// Distância filtrada usada na última avaliação
    pub distance: Centimeters,
    pub buzz: Interval,
    pub thunder: Interval,
    /// Número de transições até aqui
    pub epoch: u64,
}

impl ProximitySnapshot {
    /// Snapshot inicial: Idle, ambos inativos
    pub fn initial(now: Instant) -> Self {
        Self {
            state: ProximityState::Idle,
            entered_at: now,
            distance: f64::INFINITY,
            buzz: Interval::Inactive,
            thunder: Interval::Inactive,
            epoch: 0,
        }
    }

    pub fn interval(&self, channel: SoundChannel) -> Interval {
        match channel {
            SoundChannel::Buzz => self.buzz,
            SoundChannel::Thunder => self.thunder,
        }
    }

    /// O intervalo do canal ainda pertence ao mesmo estado de `other`?
    pub fn same_regime(&self, other: &ProximitySnapshot, channel: SoundChannel) -> bool {
        self.epoch == other.epoch && self.interval(channel).is_active() == other.interval(channel).is_active()
    }
}
