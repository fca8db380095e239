//! Fonte de distância filtrada
//!
//! A [`DistanceSource`] possui o handle do sensor. Cada `poll` lê uma amostra,
//! converte falhas em "sem alvo" e empurra o resultado na janela. O laço
//! [`DistanceSource::run`] repete isso em cadência fixa e publica cada
//! [`DistanceReading`] em uma célula [`Latest`], de modo que leitores nunca
//! bloqueiam o polling.

use std::time::{Duration, Instant};

use haunt_core::shutdown::ShutdownListener;
use haunt_core::sync::Latest;
use haunt_core::traits::{HauntComponent, Sensor};
use haunt_core::types::Centimeters;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{RangingError, RangingResult};
use crate::types::{DistanceReading, DistanceSample, DistanceWindow};

/// Configuração da fonte de distância
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Tamanho da janela de mínimo móvel (amostras)
    pub window_size: usize,
    /// Período de polling (ms)
    pub poll_interval_ms: u64,
    /// Alcance máximo do sensor (cm); leituras ≥ isto são "sem alvo"
    pub max_range_cm: Centimeters,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            poll_interval_ms: 100,
            max_range_cm: 400.0,
        }
    }
}

impl RangingConfig {
    pub fn validate(&self) -> RangingResult<()> {
        if self.window_size == 0 {
            return Err(RangingError::InvalidConfig("Window size must be > 0".into()));
        }

        if self.poll_interval_ms == 0 {
            return Err(RangingError::InvalidConfig("Poll interval must be > 0".into()));
        }

        if !(self.max_range_cm.is_finite() && self.max_range_cm > 0.0) {
            return Err(RangingError::InvalidConfig(format!(
                "Max range must be a positive number of cm, got {}",
                self.max_range_cm
            )));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Horizonte aproximado da janela
    pub fn look_back(&self) -> Duration {
        self.poll_interval() * self.window_size as u32
    }
}

/// Contadores do laço de polling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangingStats {
    /// Total de polls
    pub polls: u64,
    /// Polls em que o sensor falhou
    pub faults: u64,
    /// Polls sem alvo (falhas incluídas)
    pub no_target: u64,
}

/// Sensor + janela de mínimo móvel
#[derive(Debug)]
pub struct DistanceSource<S> {
    sensor: S,
    window: DistanceWindow,
    config: RangingConfig,
    stats: RangingStats,
    last: DistanceReading,
}

impl<S> DistanceSource<S>
where
    S: Sensor<Reading = Centimeters>,
{
    pub fn new(sensor: S, config: RangingConfig) -> RangingResult<Self> {
        config.validate()?;

        Ok(Self {
            sensor,
            window: DistanceWindow::new(config.window_size),
            config,
            stats: RangingStats::default(),
            last: DistanceReading::empty(),
        })
    }

    /// Lê uma amostra e avança a janela
    pub fn poll(&mut self) -> DistanceSample {
        self.poll_at(Instant::now())
    }

    /// Igual a [`poll`](Self::poll), com instante explícito
    pub fn poll_at(&mut self, now: Instant) -> DistanceSample {
        let sample = match self.sensor.read() {
            Ok(cm) => DistanceSample::from_raw(cm, self.config.max_range_cm),
            Err(err) => {
                trace!(sensor = self.sensor.name(), error = %err, "sensor fault, treating as no target");
                self.stats.faults += 1;
                DistanceSample::NO_TARGET
            }
        };

        self.stats.polls += 1;
        if !sample.is_target() {
            self.stats.no_target += 1;
        }

        self.window.push(sample);
        self.last = DistanceReading {
            raw: sample,
            filtered: self.window.min(),
            at: now,
            sequence: self.stats.polls,
        };

        sample
    }

    /// Distância filtrada (mínimo da janela)
    pub fn filtered(&self) -> Centimeters {
        self.window.min()
    }

    /// Última leitura completa
    pub fn reading(&self) -> DistanceReading {
        self.last
    }

    pub fn window(&self) -> &DistanceWindow {
        &self.window
    }

    pub fn config(&self) -> &RangingConfig {
        &self.config
    }

    pub fn stats(&self) -> RangingStats {
        self.stats
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn into_sensor(self) -> S {
        self.sensor
    }

    /// Laço de polling: roda até o desligamento, publicando cada leitura.
    pub fn run(mut self, output: &Latest<DistanceReading>, shutdown: &ShutdownListener) -> RangingStats {
        let interval = self.config.poll_interval();
        debug!(
            sensor = self.sensor.name(),
            interval_ms = self.config.poll_interval_ms,
            window = self.config.window_size,
            "distance polling started"
        );

        loop {
            self.poll();
            output.publish(self.last);

            if !shutdown.sleep(interval) {
                break;
            }
        }

        debug!(polls = self.stats.polls, faults = self.stats.faults, "distance polling stopped");
        self.stats
    }
}
