//! Scheduler de eventos sonoros (um por canal)
//!
//! Cada ciclo lê o snapshot publicado pela máquina de estados:
//!
//! - canal inativo → pausa curta (`inactive_fallback`) e re-checagem
//! - canal ativo e intervalo vencido → um disparo, depois pausa do intervalo atual
//! - canal ativo e intervalo não vencido → pausa pelo restante
//!
//! As pausas terminam cedo em transições de estado. Antes de disparar, o
//! scheduler trava o sink e confere de novo o snapshot; como a máquina publica
//! o novo estado *antes* de pedir silêncio, nenhum disparo de um estado já
//! encerrado chega ao sink depois do silêncio.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use haunt_core::shutdown::{ShutdownListener, Wake};
use haunt_core::sync::Latest;
use haunt_core::traits::SoundSink;
use haunt_core::types::{Interval, SoundChannel, Voice};
use serde::Serialize;
use tracing::{debug, error};

use crate::config::HauntConfig;
use crate::events::{EventBus, HauntEvent};
use crate::mapper::IntervalMapper;
use crate::snapshot::ProximitySnapshot;

/// Sink compartilhado entre schedulers e máquina de estados
pub type SharedSink = Arc<Mutex<Box<dyn SoundSink>>>;

/// Embrulha um sink para uso compartilhado
pub fn shared_sink(sink: Box<dyn SoundSink>) -> SharedSink {
    Arc::new(Mutex::new(sink))
}

/// Resultado da avaliação de um ciclo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Disparar agora
    Emit { interval_s: f64, voice: Voice },
    /// Nada a fazer por este tempo
    Wait(Duration),
}

/// Estatísticas do scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SchedulerStats {
    /// Ciclos avaliados
    pub cycles: u64,
    /// Disparos aceitos pelo sink
    pub emissions: u64,
    /// Disparos recusados pelo sink
    pub failures: u64,
    /// Disparos abortados porque o estado mudou no meio do ciclo
    pub aborted: u64,
    /// Último intervalo usado (s)
    pub last_interval_s: Option<f64>,
    /// Menor intervalo usado (s)
    pub min_interval_s: Option<f64>,
    /// Maior intervalo usado (s)
    pub max_interval_s: Option<f64>,
}

impl SchedulerStats {
    fn record_interval(&mut self, interval_s: f64) {
        self.last_interval_s = Some(interval_s);
        self.min_interval_s = Some(self.min_interval_s.map_or(interval_s, |m| m.min(interval_s)));
        self.max_interval_s = Some(self.max_interval_s.map_or(interval_s, |m| m.max(interval_s)));
    }
}

/// Scheduler auto-cadenciado de um canal
#[derive(Debug)]
pub struct EventScheduler {
    channel: SoundChannel,
    mapper: IntervalMapper,
    /// Piso absoluto do canal (thunder)
    floor: Option<f64>,
    fallback: Duration,
    last_emission: Option<Instant>,
    stats: SchedulerStats,
    failure_logged: bool,
}

impl EventScheduler {
    pub fn new(channel: SoundChannel, config: &HauntConfig) -> Self {
        Self {
            channel,
            mapper: IntervalMapper::new(config.mapper, config.voice),
            floor: config.mapper.floor(channel),
            fallback: config.pacing.inactive_fallback(),
            last_emission: None,
            stats: SchedulerStats::default(),
            failure_logged: false,
        }
    }

    pub fn channel(&self) -> SoundChannel {
        self.channel
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn last_emission(&self) -> Option<Instant> {
        self.last_emission
    }

    /// Intervalo do canal no snapshot, com o piso aplicado
    pub fn effective_interval(&self, snapshot: &ProximitySnapshot) -> Interval {
        let interval = snapshot.interval(self.channel);
        match self.floor {
            Some(floor) => interval.with_floor(floor),
            None => interval,
        }
    }

    /// Decide o ciclo sem efeitos colaterais
    pub fn decide(&self, snapshot: &ProximitySnapshot, now: Instant) -> Decision {
        let Some(interval_s) = self.effective_interval(snapshot).seconds() else {
            return Decision::Wait(self.fallback);
        };

        let elapsed = self
            .last_emission
            .map(|at| now.saturating_duration_since(at).as_secs_f64());

        match elapsed {
            Some(elapsed) if elapsed < interval_s => {
                Decision::Wait(self.pause_for(interval_s - elapsed))
            }
            _ => Decision::Emit {
                interval_s,
                voice: self.mapper.voice_for(self.channel, interval_s),
            },
        }
    }

    /// Executa um ciclo; retorna a pausa até o próximo
    pub fn step(
        &mut self,
        snapshots: &Latest<ProximitySnapshot>,
        sink: &SharedSink,
        events: &EventBus,
        now: Instant,
    ) -> Duration {
        self.stats.cycles += 1;
        let snapshot = snapshots.load();

        match self.decide(&snapshot, now) {
            Decision::Wait(pause) => pause,
            Decision::Emit { interval_s, voice } => {
                self.fire(&snapshot, interval_s, voice, snapshots, sink, events, now)
            }
        }
    }

    /// Dispara com o sink travado, se o snapshot ainda for o mesmo regime
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn fire(
        &mut self,
        expected: &ProximitySnapshot,
        interval_s: f64,
        voice: Voice,
        snapshots: &Latest<ProximitySnapshot>,
        sink: &SharedSink,
        events: &EventBus,
        now: Instant,
    ) -> Duration {
        let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);

        let current = snapshots.load();
        if !current.same_regime(expected, self.channel) || !self.effective_interval(&current).is_active() {
            drop(guard);
            self.stats.aborted += 1;
            return Duration::ZERO;
        }

        let result = guard.trigger(self.channel, voice);
        drop(guard);

        self.last_emission = Some(now);
        self.stats.record_interval(interval_s);

        match result {
            Ok(()) => {
                self.stats.emissions += 1;
                debug!(
                    channel = %self.channel,
                    interval_s,
                    pitch = voice.pitch,
                    volume = voice.volume,
                    "emit"
                );
                events.emit(HauntEvent::Emission {
                    channel: self.channel,
                    interval_s,
                    voice,
                });
            }
            Err(err) => {
                self.stats.failures += 1;
                if self.failure_logged {
                    debug!(channel = %self.channel, error = %err, "trigger failed");
                } else {
                    error!(channel = %self.channel, error = %err, "trigger failed, sound channel degraded");
                    self.failure_logged = true;
                }
                events.emit(HauntEvent::SinkFailure {
                    channel: Some(self.channel),
                    error: err.to_string(),
                });
            }
        }

        self.pause_for(interval_s)
    }

    /// Pausa em segundos; o que não cabe num `Duration` vira o fallback
    fn pause_for(&self, seconds: f64) -> Duration {
        Duration::try_from_secs_f64(seconds).unwrap_or(self.fallback)
    }

    /// Laço do scheduler; `wake` deve vir de `snapshots.watch()`
    pub fn run(
        mut self,
        snapshots: &Latest<ProximitySnapshot>,
        sink: &SharedSink,
        events: &EventBus,
        wake: &Receiver<()>,
        shutdown: &ShutdownListener,
    ) -> SchedulerStats {
        debug!(channel = %self.channel, floor = ?self.floor, "scheduler started");

        loop {
            let pause = self.step(snapshots, sink, events, Instant::now());
            if shutdown.sleep_or_wake(pause, wake) == Wake::Shutdown {
                break;
            }
        }

        debug!(
            channel = %self.channel,
            emissions = self.stats.emissions,
            failures = self.stats.failures,
            "scheduler stopped"
        );
        self.stats
    }
}
