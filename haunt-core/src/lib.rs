//! # 👻 Haunt-Core
//!
//! Abstrações compartilhadas pelo controlador de proximidade `haunt`.
//!
//! > *"Trait no core, implementação no módulo."*
//!
//! Um sensor de distância alimenta uma máquina de estados (Idle → Lure → Scare)
//! que agenda eventos sonoros em dois canais independentes (buzz e thunder).
//! Este crate define apenas os contratos e primitivas; as implementações
//! concretas vivem em `haunt-ranging`, `haunt-voice` e `haunt-orchestration`.
//!
//! ## Módulos
//!
//! - [`traits`]: [`Sensor`](traits::Sensor), [`SoundSink`](traits::SoundSink) e erros de colaborador
//! - [`types`]: [`ProximityState`](types::ProximityState), [`Interval`](types::Interval), [`Voice`](types::Voice)
//! - [`sync`]: [`Latest`](sync::Latest): célula "último valor vence" de escritor único
//! - [`shutdown`]: sinal cooperativo de desligamento observado em cada pausa
//! - [`env`]: leitura de variáveis `HAUNT_*` (com `.env`)
//!
//! ## Quick Start
//!
//! ```
//! use haunt_core::prelude::*;
//!
//! let interval = Interval::active(1.5);
//! assert!(interval.is_active());
//! assert_eq!(Interval::INACTIVE.seconds(), None);
//! assert_eq!(ProximityState::Lure.to_string(), "lure");
//! ```

pub mod env;
pub mod prelude;
pub mod shutdown;
pub mod sync;
pub mod traits;
pub mod types;

pub use shutdown::{Shutdown, ShutdownListener, Wake};
pub use sync::Latest;
pub use traits::{HauntComponent, Sensor, SensorError, SinkError, SinkStatus, SoundSink};
pub use types::{Centimeters, Interval, ProximityState, SilenceTarget, SoundChannel, Voice};
