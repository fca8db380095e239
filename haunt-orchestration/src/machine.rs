//! Máquina de estados de proximidade
//!
//! ```text
//!            d na faixa de lure, após dwell idle
//!   ┌──────┐ ─────────────────────────────────→ ┌──────┐   0 < d < scare_near
//!   │ Idle │                                    │ Lure │ ───────────────────→ ┌───────┐
//!   └──────┘ ←───────────────────────────────── └──────┘    após dwell lure   │ Scare │
//!       ↑       sem alvo, após dwell release        ↑                         └───────┘
//!       │                                           └── scare_near ≤ d < idle_far ──┘
//!       │                                                após dwell scare       │
//!       └──────────────────── sem alvo, após dwell release ─────────────────────┘
//! ```
//!
//! A máquina é dona exclusiva do estado: uma única função de transição com
//! tabela de guardas, instantes explícitos e nenhum relógio interno. O laço que
//! a alimenta vive no orquestrador.

use std::time::{Duration, Instant};

use haunt_core::types::{Centimeters, Interval, ProximityState};

use crate::config::{DwellConfig, HauntConfig, ThresholdConfig};
use crate::mapper::IntervalMapper;
use crate::snapshot::ProximitySnapshot;

/// Transição efetivada por [`ProximityStateMachine::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: ProximityState,
    pub to: ProximityState,
    pub at: Instant,
    pub distance: Centimeters,
    /// Epoch do snapshot resultante
    pub epoch: u64,
}

impl Transition {
    /// Entrar em Idle silencia todos os canais
    pub fn requires_silence(&self) -> bool {
        self.to == ProximityState::Idle
    }
}

/// Máquina Idle/Lure/Scare com histerese por dwell
#[derive(Debug, Clone)]
pub struct ProximityStateMachine {
    thresholds: ThresholdConfig,
    dwell: DwellConfig,
    mapper: IntervalMapper,
    snapshot: ProximitySnapshot,
    ticks: u64,
}

impl ProximityStateMachine {
    /// Começa em Idle com ambos os canais inativos
    pub fn new(config: &HauntConfig, now: Instant) -> Self {
        Self {
            thresholds: config.thresholds,
            dwell: config.dwell,
            mapper: IntervalMapper::new(config.mapper, config.voice),
            snapshot: ProximitySnapshot::initial(now),
            ticks: 0,
        }
    }

    pub fn state(&self) -> ProximityState {
        self.snapshot.state
    }

    pub fn snapshot(&self) -> ProximitySnapshot {
        self.snapshot
    }

    /// StateTimer
    pub fn entered_at(&self) -> Instant {
        self.snapshot.entered_at
    }

    pub fn transitions(&self) -> u64 {
        self.snapshot.epoch
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn mapper(&self) -> &IntervalMapper {
        &self.mapper
    }

    /// Distância utilizável para refrescar intervalos
    pub fn is_target(&self, d: Centimeters) -> bool {
        d > 0.0 && d < self.thresholds.idle_far_cm
    }

    /// Destino permitido pela tabela de guardas, sem olhar o dwell
    pub fn candidate(&self, d: Centimeters) -> Option<ProximityState> {
        let t = &self.thresholds;
        let target = self.is_target(d);

        match self.snapshot.state {
            ProximityState::Idle => {
                (target && d >= t.lure_entry_min_cm).then_some(ProximityState::Lure)
            }
            ProximityState::Lure if !target => Some(ProximityState::Idle),
            ProximityState::Lure => (d < t.scare_near_cm).then_some(ProximityState::Scare),
            ProximityState::Scare if !target => Some(ProximityState::Idle),
            ProximityState::Scare => (d >= t.scare_near_cm).then_some(ProximityState::Lure),
        }
    }

    /// Permanência mínima em `from` antes de ir para `to`
    pub fn dwell(&self, from: ProximityState, to: ProximityState) -> Duration {
        if to == ProximityState::Idle {
            return self.dwell.release();
        }
        match from {
            ProximityState::Idle => self.dwell.idle(),
            ProximityState::Lure => self.dwell.lure(),
            ProximityState::Scare => self.dwell.scare(),
        }
    }

    /// Avalia um tick com a distância filtrada `d`
    pub fn update(&mut self, d: Centimeters, now: Instant) -> Option<Transition> {
        self.ticks += 1;
        self.snapshot.distance = d;

        if let Some(to) = self.candidate(d) {
            let resident = now.saturating_duration_since(self.snapshot.entered_at);
            if resident >= self.dwell(self.snapshot.state, to) {
                return Some(self.transition(to, d, now));
            }
        }

        self.refresh(d);
        None
    }

    fn transition(&mut self, to: ProximityState, d: Centimeters, now: Instant) -> Transition {
        let from = self.snapshot.state;

        if from == ProximityState::Scare {
            self.snapshot.thunder = Interval::Inactive;
        }

        self.snapshot.state = to;
        self.snapshot.entered_at = now;
        self.snapshot.epoch += 1;

        match to {
            ProximityState::Idle => {
                self.snapshot.buzz = Interval::Inactive;
                self.snapshot.thunder = Interval::Inactive;
            }
            ProximityState::Lure => {
                self.snapshot.buzz = self.mapper.buzz_interval(d);
            }
            ProximityState::Scare => {
                self.snapshot.buzz = self.mapper.buzz_interval(d);
                self.snapshot.thunder = self.mapper.thunder_interval(d);
            }
        }

        Transition {
            from,
            to,
            at: now,
            distance: d,
            epoch: self.snapshot.epoch,
        }
    }

    /// Recalcula os intervalos do estado atual; leituras sem alvo mantêm os valores
    fn refresh(&mut self, d: Centimeters) {
        if !self.is_target(d) {
            return;
        }
        match self.snapshot.state {
            ProximityState::Idle => {}
            ProximityState::Lure => {
                self.snapshot.buzz = self.mapper.buzz_interval(d);
            }
            ProximityState::Scare => {
                self.snapshot.buzz = self.mapper.buzz_interval(d);
                self.snapshot.thunder = self.mapper.thunder_interval(d);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn machine() -> (ProximityStateMachine, Instant) {
        let t0 = Instant::now();
        (ProximityStateMachine::new(&HauntConfig::default(), t0), t0)
    }

    #[test]
    fn test_starts_idle_and_silent() {
        let (machine, t0) = machine();
        assert_eq!(machine.state(), ProximityState::Idle);
        assert_eq!(machine.entered_at(), t0);
        assert_eq!(machine.snapshot().buzz, Interval::Inactive);
        assert_eq!(machine.snapshot().thunder, Interval::Inactive);
    }

    #[test]
    fn test_guard_table() {
        let (mut m, t0) = machine();

        assert_eq!(m.candidate(0.0), None);
        assert_eq!(m.candidate(350.0), None);
        assert_eq!(m.candidate(349.0), Some(ProximityState::Lure));
        assert_eq!(m.candidate(40.0), Some(ProximityState::Lure));

        m.update(200.0, t0 + ms(300));
        assert_eq!(m.state(), ProximityState::Lure);
        assert_eq!(m.candidate(200.0), None);
        assert_eq!(m.candidate(89.9), Some(ProximityState::Scare));
        assert_eq!(m.candidate(f64::INFINITY), Some(ProximityState::Idle));
        assert_eq!(m.candidate(-1.0), Some(ProximityState::Idle));

        m.update(50.0, t0 + ms(600));
        assert_eq!(m.state(), ProximityState::Scare);
        assert_eq!(m.candidate(50.0), None);
        assert_eq!(m.candidate(90.0), Some(ProximityState::Lure));
        assert_eq!(m.candidate(350.0), Some(ProximityState::Idle));
    }

    #[test]
    fn test_lure_entry_min_band() {
        let mut config = HauntConfig::default();
        config.thresholds.lure_entry_min_cm = 60.0;
        let m = ProximityStateMachine::new(&config, Instant::now());

        assert_eq!(m.candidate(59.0), None);
        assert_eq!(m.candidate(60.0), Some(ProximityState::Lure));
    }

    #[test]
    fn test_idle_dwell_delays_lure() {
        let (mut m, t0) = machine();

        assert!(m.update(200.0, t0 + ms(100)).is_none());
        assert!(m.update(200.0, t0 + ms(299)).is_none());
        let t = m.update(200.0, t0 + ms(300)).unwrap();

        assert_eq!((t.from, t.to), (ProximityState::Idle, ProximityState::Lure));
        assert_eq!(m.entered_at(), t0 + ms(300));
        assert_eq!(m.snapshot().buzz, Interval::active(1.0));
        assert_eq!(m.snapshot().thunder, Interval::Inactive);
    }

    #[test]
    fn test_scare_entry_and_exit_actions() {
        let (mut m, t0) = machine();
        m.update(150.0, t0 + ms(300));
        m.update(60.0, t0 + ms(600));
        assert_eq!(m.state(), ProximityState::Scare);
        assert!(m.snapshot().thunder.seconds().unwrap() >= 9.6);
        assert_eq!(m.snapshot().buzz, Interval::active(0.3));

        let t = m.update(200.0, t0 + ms(900)).unwrap();
        assert_eq!(t.to, ProximityState::Lure);
        assert_eq!(m.snapshot().thunder, Interval::Inactive);
        assert_eq!(m.snapshot().buzz, Interval::active(1.0));
    }

    #[test]
    fn test_release_dwell_keeps_intervals_live() {
        let (mut m, t0) = machine();
        m.update(150.0, t0 + ms(300));
        m.update(40.0, t0 + ms(600));
        let before = m.snapshot();

        assert!(m.update(f64::INFINITY, t0 + ms(700)).is_none());
        assert!(m.update(f64::INFINITY, t0 + ms(2_599)).is_none());
        assert_eq!(m.snapshot().buzz, before.buzz);
        assert_eq!(m.snapshot().thunder, before.thunder);

        let t = m.update(f64::INFINITY, t0 + ms(2_600)).unwrap();
        assert!(t.requires_silence());
        assert_eq!(m.snapshot().buzz, Interval::Inactive);
        assert_eq!(m.snapshot().thunder, Interval::Inactive);
    }

    #[test]
    fn test_refresh_tracks_distance_in_lure() {
        let (mut m, t0) = machine();
        m.update(300.0, t0 + ms(300));
        assert_eq!(m.state(), ProximityState::Lure);
        assert_eq!(m.snapshot().buzz, Interval::active(1.5));

        assert!(m.update(200.0, t0 + ms(400)).is_none());
        assert_eq!(m.snapshot().buzz, Interval::active(1.0));
        assert_eq!(m.snapshot().thunder, Interval::Inactive);
        assert_eq!(m.transitions(), 1);
    }

    #[test]
    fn test_refresh_tracks_distance_in_scare() {
        let mut config = HauntConfig::default();
        config.mapper.thunder_min_s = 1.0;
        let t0 = Instant::now();
        let mut m = ProximityStateMachine::new(&config, t0);

        m.update(80.0, t0 + ms(300));
        m.update(80.0, t0 + ms(600));
        assert_eq!(m.state(), ProximityState::Scare);
        assert_eq!(m.snapshot().buzz, Interval::active(0.4));
        assert_eq!(m.snapshot().thunder, Interval::active(80.0 / 30.0));

        assert!(m.update(30.0, t0 + ms(700)).is_none());
        assert_eq!(m.snapshot().buzz, Interval::active(0.15));
        assert_eq!(m.snapshot().thunder, Interval::active(1.0));

        // Mais perto que o piso: thunder fica no mínimo, buzz no clamp
        assert!(m.update(15.0, t0 + ms(800)).is_none());
        assert_eq!(m.snapshot().buzz, Interval::active(0.1));
        assert_eq!(m.snapshot().thunder, Interval::active(1.0));
        assert_eq!(m.transitions(), 2);
    }

    #[test]
    fn test_out_of_band_reading_does_not_refresh() {
        let (mut m, t0) = machine();
        m.update(200.0, t0 + ms(300));
        assert_eq!(m.snapshot().buzz, Interval::active(1.0));

        // Eco além de idle_far durante o dwell de release
        assert!(m.update(400.0, t0 + ms(400)).is_none());
        assert!(m.update(f64::INFINITY, t0 + ms(500)).is_none());
        assert_eq!(m.state(), ProximityState::Lure);
        assert_eq!(m.snapshot().buzz, Interval::active(1.0));
        assert_eq!(m.snapshot().distance, f64::INFINITY);
    }

    #[test]
    fn test_no_self_transitions() {
        let (mut m, t0) = machine();
        m.update(200.0, t0 + ms(300));
        for i in 1..50 {
            assert!(m.update(120.0 + i as f64, t0 + ms(300 + i * 100)).is_none());
        }
        assert_eq!(m.transitions(), 1);
    }

    #[test]
    fn test_dwell_measured_from_state_timer() {
        let (mut m, t0) = machine();
        // Muito tempo parado em Idle não adianta o dwell de Lure
        m.update(200.0, t0 + ms(10_000));
        assert!(m.update(40.0, t0 + ms(10_100)).is_none());
        assert!(m.update(40.0, t0 + ms(10_300)).is_some());
    }
}
