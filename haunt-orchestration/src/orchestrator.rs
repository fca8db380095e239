//! Orquestrador principal
//!
//! Possui os handles de sensor e sink e roda quatro atividades periódicas,
//! cada uma em sua thread:
//!
//! | Atividade | Escreve | Lê |
//! |:----------|:--------|:---|
//! | ranging | `Latest<DistanceReading>` | sensor |
//! | machine | `Latest<ProximitySnapshot>` | leituras |
//! | buzz / thunder | sink | snapshot |
//!
//! Cada valor compartilhado tem um único escritor. O desligamento é
//! cooperativo e observado em toda pausa.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use haunt_core::shutdown::{Shutdown, ShutdownListener};
use haunt_core::sync::Latest;
use haunt_core::traits::{Sensor, SinkStatus, SoundSink};
use haunt_core::types::{Centimeters, ProximityState, SilenceTarget, SoundChannel};
use haunt_ranging::{DistanceReading, DistanceSource, RangingStats};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::HauntConfig;
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::events::{EventBus, EventFilter, HauntEvent, Subscription};
use crate::machine::ProximityStateMachine;
use crate::scheduler::{shared_sink, EventScheduler, SchedulerStats, SharedSink};
use crate::snapshot::ProximitySnapshot;

/// Contadores do laço da máquina de estados
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MachineStats {
    pub ticks: u64,
    pub transitions: u64,
}

/// Resumo de uma execução
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub uptime: Duration,
    pub final_state: ProximityState,
    pub machine: MachineStats,
    pub ranging: RangingStats,
    pub buzz: SchedulerStats,
    pub thunder: SchedulerStats,
    pub sink_status: SinkStatus,
}

impl RunReport {
    pub fn channel(&self, channel: SoundChannel) -> &SchedulerStats {
        match channel {
            SoundChannel::Buzz => &self.buzz,
            SoundChannel::Thunder => &self.thunder,
        }
    }
}

/// Orquestrador configurado, ainda parado
#[derive(Debug)]
pub struct Orchestrator {
    config: HauntConfig,
    events: EventBus,
}

impl Orchestrator {
    /// Valida a configuração; qualquer violação é fatal aqui
    pub fn new(config: HauntConfig) -> OrchestrationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            events: EventBus::new(),
        })
    }

    pub fn config(&self) -> &HauntConfig {
        &self.config
    }

    /// Bus de eventos (inscreva-se antes do `start` para não perder nada)
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Conecta o sink e inicia as atividades.
    ///
    /// Um sink que não conecta é registrado em log e a execução segue sem som.
    pub fn start<S>(self, sensor: S, mut sink: Box<dyn SoundSink>) -> OrchestrationResult<RunningOrchestrator>
    where
        S: Sensor<Reading = Centimeters> + 'static,
    {
        let Self { config, events } = self;
        let source = DistanceSource::new(sensor, config.sensor.clone())?;

        match sink.connect() {
            Ok(()) => {
                info!(sink = sink.name(), "sound sink connected");
                if let Err(err) = sink.silence(SilenceTarget::All) {
                    warn!(sink = sink.name(), error = %err, "initial silence failed");
                }
            }
            Err(err) => {
                error!(sink = sink.name(), error = %err, "sound sink unavailable, running silent");
                events.emit(HauntEvent::SinkFailure {
                    channel: None,
                    error: err.to_string(),
                });
            }
        }

        let sink = shared_sink(sink);
        let shutdown = Shutdown::new();
        let started = Instant::now();

        let machine = ProximityStateMachine::new(&config, started);
        let readings = Latest::new(DistanceReading::empty());
        let snapshots = Latest::new(machine.snapshot());
        info!("State: {}", machine.state());

        let spawned = spawn_activities(
            &config,
            source,
            machine,
            &readings,
            &snapshots,
            &sink,
            &events,
            shutdown.listener(),
        );
        let activities = match spawned {
            Ok(activities) => activities,
            Err(err) => {
                shutdown.trigger();
                return Err(err);
            }
        };

        Ok(RunningOrchestrator {
            shutdown,
            readings,
            snapshots,
            sink,
            events,
            activities: Some(activities),
            started,
        })
    }
}

struct Activities {
    ranging: JoinHandle<RangingStats>,
    machine: JoinHandle<MachineStats>,
    buzz: JoinHandle<SchedulerStats>,
    thunder: JoinHandle<SchedulerStats>,
}

fn spawn<T, F>(name: &str, f: F) -> OrchestrationResult<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map_err(|e| OrchestrationError::SpawnFailed(format!("{}: {}", name, e)))
}

#[allow(clippy::too_many_arguments)]
fn spawn_activities<S>(
    config: &HauntConfig,
    source: DistanceSource<S>,
    machine: ProximityStateMachine,
    readings: &Latest<DistanceReading>,
    snapshots: &Latest<ProximitySnapshot>,
    sink: &SharedSink,
    events: &EventBus,
    listener: ShutdownListener,
) -> OrchestrationResult<Activities>
where
    S: Sensor<Reading = Centimeters> + 'static,
{
    let ranging = {
        let (readings, listener) = (readings.clone(), listener.clone());
        spawn("haunt-ranging", move || source.run(&readings, &listener))?
    };

    let machine = {
        let loop_ = MachineLoop {
            machine,
            readings: readings.clone(),
            snapshots: snapshots.clone(),
            sink: sink.clone(),
            events: events.clone(),
            tick: config.pacing.tick(),
        };
        let listener = listener.clone();
        spawn("haunt-machine", move || loop_.run(&listener))?
    };

    let mut schedulers = Vec::with_capacity(2);
    for channel in SoundChannel::ALL {
        let scheduler = EventScheduler::new(channel, config);
        let wake = snapshots.watch();
        let (snapshots, sink, events, listener) =
            (snapshots.clone(), sink.clone(), events.clone(), listener.clone());
        let name = format!("haunt-{}", channel);
        schedulers.push(spawn(&name, move || {
            scheduler.run(&snapshots, &sink, &events, &wake, &listener)
        })?);
    }
    let thunder = schedulers.pop();
    let buzz = schedulers.pop();

    match (buzz, thunder) {
        (Some(buzz), Some(thunder)) => Ok(Activities {
            ranging,
            machine,
            buzz,
            thunder,
        }),
        _ => Err(OrchestrationError::SpawnFailed("scheduler threads missing".into())),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAÇO DA MÁQUINA DE ESTADOS
// ═══════════════════════════════════════════════════════════════════════════════

struct MachineLoop {
    machine: ProximityStateMachine,
    readings: Latest<DistanceReading>,
    snapshots: Latest<ProximitySnapshot>,
    sink: SharedSink,
    events: EventBus,
    tick: Duration,
}

impl MachineLoop {
    fn run(mut self, shutdown: &ShutdownListener) -> MachineStats {
        let mut silence_failed = false;
        debug!(tick_ms = self.tick.as_millis() as u64, "state machine started");

        loop {
            let distance = self.readings.load().filtered;
            let now = Instant::now();

            match self.machine.update(distance, now) {
                Some(transition) => {
                    // Publica antes de silenciar: schedulers revalidam sob o lock do sink
                    self.snapshots.announce(self.machine.snapshot());
                    info!("State: {}", transition.to);
                    debug!(from = %transition.from, distance = transition.distance, "transition");
                    self.events.emit(HauntEvent::Transition {
                        from: transition.from,
                        to: transition.to,
                        distance: transition.distance,
                    });

                    if transition.requires_silence() {
                        self.silence_all(&mut silence_failed);
                    }
                }
                None => {
                    self.snapshots.publish(self.machine.snapshot());
                }
            }

            if !shutdown.sleep(self.tick) {
                break;
            }
        }

        debug!(transitions = self.machine.transitions(), "state machine stopped");
        MachineStats {
            ticks: self.machine.ticks(),
            transitions: self.machine.transitions(),
        }
    }

    fn silence_all(&self, failure_logged: &mut bool) {
        let result = {
            let mut sink = self.sink.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            sink.silence(SilenceTarget::All)
        };

        match result {
            Ok(()) => self.events.emit(HauntEvent::Silenced {
                target: SilenceTarget::All,
            }),
            Err(err) => {
                if *failure_logged {
                    debug!(error = %err, "silence failed");
                } else {
                    error!(error = %err, "silence failed, sound sink degraded");
                    *failure_logged = true;
                }
                self.events.emit(HauntEvent::SinkFailure {
                    channel: None,
                    error: err.to_string(),
                });
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXECUÇÃO
// ═══════════════════════════════════════════════════════════════════════════════

/// Orquestrador em execução
pub struct RunningOrchestrator {
    shutdown: Shutdown,
    readings: Latest<DistanceReading>,
    snapshots: Latest<ProximitySnapshot>,
    sink: SharedSink,
    events: EventBus,
    activities: Option<Activities>,
    started: Instant,
}

impl RunningOrchestrator {
    /// Snapshot mais recente da máquina de estados
    pub fn snapshot(&self) -> ProximitySnapshot {
        self.snapshots.load()
    }

    pub fn state(&self) -> ProximityState {
        self.snapshots.load().state
    }

    /// Leitura mais recente do sensor
    pub fn reading(&self) -> DistanceReading {
        self.readings.load()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn subscribe_filtered(&self, filter: EventFilter) -> Subscription {
        self.events.subscribe_filtered(filter)
    }

    /// Listener do mesmo sinal de desligamento
    pub fn listener(&self) -> ShutdownListener {
        self.shutdown.listener()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Dispara o desligamento, junta as atividades e encerra o sink
    pub fn shutdown(mut self) -> OrchestrationResult<RunReport> {
        self.shutdown.trigger();

        let Some(activities) = self.activities.take() else {
            return Err(OrchestrationError::ExecutionFailed("activities already joined".into()));
        };

        let ranging = join("ranging", activities.ranging);
        let machine = join("machine", activities.machine);
        let buzz = join("buzz", activities.buzz);
        let thunder = join("thunder", activities.thunder);

        let sink_status = {
            let mut sink = self.sink.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if sink.status() == SinkStatus::Ready {
                if let Err(err) = sink.silence(SilenceTarget::All) {
                    warn!(error = %err, "final silence failed");
                }
                if let Err(err) = sink.disconnect() {
                    warn!(error = %err, "sink disconnect failed");
                }
            }
            sink.status()
        };
        self.events.emit(HauntEvent::Shutdown);

        let report = RunReport {
            uptime: self.started.elapsed(),
            final_state: self.snapshots.load().state,
            machine: machine?,
            ranging: ranging?,
            buzz: buzz?,
            thunder: thunder?,
            sink_status,
        };
        info!(
            uptime_s = report.uptime.as_secs_f64(),
            transitions = report.machine.transitions,
            "haunt stopped"
        );
        Ok(report)
    }
}

fn join<T>(name: &str, handle: JoinHandle<T>) -> OrchestrationResult<T> {
    handle
        .join()
        .map_err(|_| OrchestrationError::ExecutionFailed(format!("{} activity panicked", name)))
}

impl Drop for RunningOrchestrator {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl std::fmt::Debug for RunningOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningOrchestrator")
            .field("snapshot", &self.snapshots.load())
            .field("uptime", &self.uptime())
            .field("running", &self.activities.is_some())
            .finish()
    }
}
