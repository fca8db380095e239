//! Sensor programado (simulação e testes)
//!
//! Reproduz uma sequência de passos, um por leitura. Clones compartilham o
//! mesmo estado interno via `Arc<Mutex<_>>`, então um teste pode mover o
//! sensor para a thread de polling e continuar controlando a distância.

use std::sync::{Arc, Mutex, PoisonError};

use haunt_core::traits::{HauntComponent, Sensor, SensorError};
use haunt_core::types::Centimeters;
use serde::{Deserialize, Serialize};

use crate::error::{RangingError, RangingResult};

/// Passo do roteiro
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Leitura válida (cm)
    Distance(Centimeters),
    /// Falha de leitura
    Fault,
}

#[derive(Debug, Default)]
struct ScriptState {
    steps: Vec<ScriptStep>,
    cursor: usize,
    looping: bool,
    reads: u64,
}

impl ScriptState {
    fn next_step(&mut self) -> Option<ScriptStep> {
        if self.steps.is_empty() {
            return None;
        }

        let step = self.steps[self.cursor];
        if self.cursor + 1 < self.steps.len() {
            self.cursor += 1;
        } else if self.looping {
            self.cursor = 0;
        }
        // Sem loop: o último passo se repete indefinidamente
        Some(step)
    }
}

/// Sensor com roteiro de leituras
#[derive(Debug, Clone)]
pub struct ScriptedRangeSensor {
    state: Arc<Mutex<ScriptState>>,
    name: String,
}

impl ScriptedRangeSensor {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                steps,
                ..Default::default()
            })),
            name: "scripted-rangefinder".to_string(),
        }
    }

    pub fn from_distances(distances: Vec<Centimeters>) -> Self {
        Self::new(distances.into_iter().map(ScriptStep::Distance).collect())
    }

    /// Sensor que sempre lê a mesma distância
    pub fn constant(cm: Centimeters) -> Self {
        Self::from_distances(vec![cm])
    }

    /// Interpreta um roteiro textual.
    ///
    /// Formato: itens separados por vírgula; cada item é uma distância em cm
    /// ou `x` (falha), opcionalmente seguido de `*N` para repetir N vezes.
    /// Ex.: `"400*20,300*30,x,40*50"`.
    pub fn parse(script: &str) -> RangingResult<Self> {
        let mut steps = Vec::new();

        for item in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (value, count) = match item.split_once('*') {
                Some((value, count)) => {
                    let count: usize = count.trim().parse().map_err(|_| {
                        RangingError::InvalidScript(format!("Invalid repeat count in '{}'", item))
                    })?;
                    (value.trim(), count)
                }
                None => (item, 1),
            };

            let step = if value.eq_ignore_ascii_case("x") {
                ScriptStep::Fault
            } else {
                let cm: f64 = value.parse().map_err(|_| {
                    RangingError::InvalidScript(format!("Invalid distance '{}'", value))
                })?;
                ScriptStep::Distance(cm)
            };

            steps.extend(std::iter::repeat_n(step, count));
        }

        if steps.is_empty() {
            return Err(RangingError::InvalidScript("Script is empty".into()));
        }

        Ok(Self::new(steps))
    }

    /// Repete o roteiro ao chegar ao fim
    pub fn looping(self, looping: bool) -> Self {
        self.lock().looping = looping;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Substitui o roteiro por uma distância fixa (afeta todos os clones)
    pub fn set_distance(&self, cm: Centimeters) {
        self.replace(vec![ScriptStep::Distance(cm)]);
    }

    /// Faz todas as leituras seguintes falharem
    pub fn set_fault(&self) {
        self.replace(vec![ScriptStep::Fault]);
    }

    /// Substitui o roteiro (afeta todos os clones)
    pub fn replace(&self, steps: Vec<ScriptStep>) {
        let mut state = self.lock();
        state.steps = steps;
        state.cursor = 0;
    }

    /// Total de leituras feitas
    pub fn reads(&self) -> u64 {
        self.lock().reads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HauntComponent for ScriptedRangeSensor {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Sensor for ScriptedRangeSensor {
    type Reading = Centimeters;
    type Config = Vec<ScriptStep>;

    fn configure(&mut self, config: Self::Config) -> Result<(), SensorError> {
        if config.is_empty() {
            return Err(SensorError::InvalidConfig("Script must not be empty".into()));
        }
        self.replace(config);
        Ok(())
    }

    fn read(&mut self) -> Result<Centimeters, SensorError> {
        let mut state = self.lock();
        state.reads += 1;

        match state.next_step() {
            Some(ScriptStep::Distance(cm)) => Ok(cm),
            Some(ScriptStep::Fault) => Err(SensorError::ReadFailed("scripted fault".into())),
            None => Err(SensorError::NotInitialized),
        }
    }

    fn calibrate(&mut self) -> Result<(), SensorError> {
        let mut state = self.lock();
        state.cursor = 0;
        state.reads = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_repeats_and_faults() {
        let mut sensor = ScriptedRangeSensor::parse("300*2, x, 40").unwrap();
        assert_eq!(sensor.read().unwrap(), 300.0);
        assert_eq!(sensor.read().unwrap(), 300.0);
        assert!(sensor.read().is_err());
        assert_eq!(sensor.read().unwrap(), 40.0);
        // Último passo se repete
        assert_eq!(sensor.read().unwrap(), 40.0);
        assert_eq!(sensor.reads(), 5);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ScriptedRangeSensor::parse("").is_err());
        assert!(ScriptedRangeSensor::parse("abc").is_err());
        assert!(ScriptedRangeSensor::parse("100*z").is_err());
    }

    #[test]
    fn test_looping() {
        let mut sensor = ScriptedRangeSensor::from_distances(vec![1.0, 2.0]).looping(true);
        let reads: Vec<f64> = (0..5).map(|_| sensor.read().unwrap()).collect();
        assert_eq!(reads, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_clones_share_state() {
        let sensor = ScriptedRangeSensor::constant(400.0);
        let mut moved = sensor.clone();

        assert_eq!(moved.read().unwrap(), 400.0);
        sensor.set_distance(40.0);
        assert_eq!(moved.read().unwrap(), 40.0);

        sensor.set_fault();
        assert!(moved.read().is_err());
    }

    #[test]
    fn test_empty_script_is_not_initialized() {
        let mut sensor = ScriptedRangeSensor::new(Vec::new());
        assert_eq!(sensor.read(), Err(SensorError::NotInitialized));
    }
}
