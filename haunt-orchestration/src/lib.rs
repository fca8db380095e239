//! # 🎭 haunt-orchestration — Controle de Proximidade
//!
//! Liga a distância filtrada a dois canais sonoros: uma máquina de estados com
//! histerese decide *quando* cada canal está ativo, o mapeador decide *com que
//! frequência* e *com qual voz*, e um scheduler por canal dispara os eventos.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Orchestrator                          │
//! │                                                              │
//! │  DistanceSource ──▶ Latest<DistanceReading>                  │
//! │                          │                                   │
//! │                          ▼                                   │
//! │              ProximityStateMachine ──▶ Latest<Snapshot>      │
//! │                    │ (silence)              │       │        │
//! │                    ▼                        ▼       ▼        │
//! │                 SoundSink ◀──────────── buzz   thunder       │
//! │                                        EventScheduler        │
//! │                                                              │
//! │  EventBus: Transition | Emission | Silenced | SinkFailure    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```no_run
//! use haunt_orchestration::{HauntConfig, Orchestrator};
//! use haunt_ranging::ScriptedRangeSensor;
//! use haunt_voice::RecordingSink;
//!
//! let orchestrator = Orchestrator::new(HauntConfig::default()).unwrap();
//! let running = orchestrator
//!     .start(ScriptedRangeSensor::constant(300.0), Box::new(RecordingSink::new()))
//!     .unwrap();
//!
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! let report = running.shutdown().unwrap();
//! println!("{} transitions", report.machine.transitions);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod machine;
pub mod mapper;
pub mod orchestrator;
pub mod scheduler;
pub mod snapshot;

pub use config::{
    DwellConfig, HauntConfig, MapperConfig, PacingConfig, SensorSettings, ThresholdConfig,
    VoiceConfig, MAX_INTERVAL_S,
};
pub use error::{OrchestrationError, OrchestrationResult};
pub use events::{EventBus, EventFilter, HauntEvent, Subscription};
pub use machine::{ProximityStateMachine, Transition};
pub use mapper::IntervalMapper;
pub use orchestrator::{MachineStats, Orchestrator, RunReport, RunningOrchestrator};
pub use scheduler::{shared_sink, Decision, EventScheduler, SchedulerStats, SharedSink};
pub use snapshot::ProximitySnapshot;

// Re-exporta traits do core
pub use haunt_core::prelude::*;
