//! Tipos de dados de distância

use std::collections::VecDeque;
use std::time::Instant;

use haunt_core::types::Centimeters;
use serde::{Deserialize, Serialize};

/// Amostra de distância individual (cm).
///
/// Leituras inválidas (≤ 0, NaN, além do alcance máximo ou falha do sensor)
/// são normalizadas para [`DistanceSample::NO_TARGET`], um valor infinito:
/// nunca vence o mínimo da janela enquanto houver uma leitura real.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceSample {
    pub cm: Centimeters,
}

impl DistanceSample {
    /// Sentinela "sem alvo"
    pub const NO_TARGET: DistanceSample = DistanceSample { cm: f64::INFINITY };

    /// Normaliza uma leitura bruta contra o alcance máximo do sensor
    pub fn from_raw(cm: Centimeters, max_range_cm: Centimeters) -> Self {
        if cm.is_finite() && cm > 0.0 && cm < max_range_cm {
            Self { cm }
        } else {
            Self::NO_TARGET
        }
    }

    /// Existe alvo nesta amostra?
    pub fn is_target(&self) -> bool {
        self.cm.is_finite()
    }
}

/// Janela de tamanho fixo com as últimas N amostras, em ordem de chegada.
#[derive(Debug, Clone)]
pub struct DistanceWindow {
    samples: VecDeque<DistanceSample>,
    capacity: usize,
}

impl DistanceWindow {
    /// Cria janela vazia; capacidade mínima 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insere amostra, descartando a mais antiga quando cheia
    pub fn push(&mut self, sample: DistanceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mínimo da janela (NO_TARGET se vazia ou sem alvos)
    pub fn min(&self) -> Centimeters {
        self.samples
            .iter()
            .map(|s| s.cm)
            .fold(DistanceSample::NO_TARGET.cm, f64::min)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Amostras em ordem de chegada (mais antiga primeiro)
    pub fn iter(&self) -> impl Iterator<Item = &DistanceSample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Leitura publicada pelo laço de polling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceReading {
    /// Última amostra bruta (já normalizada)
    pub raw: DistanceSample,
    /// Mínimo da janela
    pub filtered: Centimeters,
    /// Instante da amostra
    pub at: Instant,
    /// Número sequencial do poll
    pub sequence: u64,
}

impl DistanceReading {
    /// Leitura inicial, antes de qualquer poll
    pub fn empty() -> Self {
        Self {
            raw: DistanceSample::NO_TARGET,
            filtered: DistanceSample::NO_TARGET.cm,
            at: Instant::now(),
            sequence: 0,
        }
    }
}
