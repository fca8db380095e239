//! # 🔊 haunt-voice — Atuação Sonora
//!
//! Implementações do trait [`SoundSink`](haunt_core::traits::SoundSink).
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              SoundSink                  │
//! │  connect(), trigger(), silence()        │
//! │  ┌────────────────┐ ┌────────────────┐  │
//! │  │ FluidSynthSink │ │ RecordingSink  │  │
//! │  │ (processo,     │ │ (memória,      │  │
//! │  │  stdin shell)  │ │  testes/log)   │  │
//! │  └────────────────┘ └────────────────┘  │
//! └─────────────────────────────────────────┘
//!                   ↓
//!        fluidsynth → ALSA → alto-falante
//! ```
//!
//! ## Características
//!
//! - **Fire-and-forget**: nenhum comando espera resposta além do `connect`
//! - **Re-disparo**: `trigger` solta a nota anterior do canal antes da nova
//! - **Sessão perdida é terminal**: após uma falha de escrita o sink responde
//!   `SinkError::Unavailable` sem tentar reconectar
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use haunt_voice::RecordingSink;
//! use haunt_core::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sink = RecordingSink::new();
//! sink.connect()?;
//! sink.trigger(SoundChannel::Buzz, Voice::new(48, 45))?;
//! sink.silence(SilenceTarget::All)?;
//! assert_eq!(sink.trigger_count(SoundChannel::Buzz), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fluidsynth;
pub mod recording;
pub mod types;

pub use error::{VoiceError, VoiceResult};
pub use fluidsynth::{FluidSynthConfig, FluidSynthSink};
pub use recording::RecordingSink;
pub use types::{ChannelMap, RecordedCommand, ShellCommand, SinkCommand};

#[cfg(test)]
mod tests;
