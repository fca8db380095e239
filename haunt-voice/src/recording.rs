//! Sink em memória
//!
//! Registra cada chamada com seu instante de chegada. Clones compartilham o
//! mesmo estado, então um teste pode entregar o sink ao orquestrador e
//! inspecionar o histórico pelo clone que guardou. Com `logging(true)` cada
//! comando também vira um evento `info!`, o que serve de back end "seco" na CLI.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use haunt_core::traits::{HauntComponent, SinkError, SinkStatus, SoundSink};
use haunt_core::types::{SilenceTarget, SoundChannel, Voice};
use tracing::info;

use crate::types::{RecordedCommand, SinkCommand};

/// Capacidade padrão do histórico
pub const DEFAULT_HISTORY: usize = 4096;

#[derive(Debug)]
struct RecordingState {
    status: SinkStatus,
    history: VecDeque<RecordedCommand>,
    max_history: usize,
    /// Chamadas trigger/silence aceitas
    calls: u64,
    /// Perde a sessão após N chamadas aceitas
    fail_after: Option<u64>,
    logging: bool,
}

/// Sink sonoro que apenas grava os comandos
#[derive(Debug, Clone)]
pub struct RecordingSink {
    name: String,
    state: Arc<Mutex<RecordingState>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    /// Histórico limitado a `max_history` comandos (os mais antigos saem)
    pub fn with_history(max_history: usize) -> Self {
        Self {
            name: "recording".to_string(),
            state: Arc::new(Mutex::new(RecordingState {
                status: SinkStatus::Disconnected,
                history: VecDeque::new(),
                max_history: max_history.max(1),
                calls: 0,
                fail_after: None,
                logging: false,
            })),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Emite cada comando como evento de log
    pub fn logging(self, enabled: bool) -> Self {
        self.lock().logging = enabled;
        self
    }

    /// Simula perda da sessão após `calls` chamadas trigger/silence
    pub fn fail_after(self, calls: u64) -> Self {
        self.lock().fail_after = Some(calls);
        self
    }

    /// Marca a sessão como perdida imediatamente
    pub fn set_lost(&self) {
        self.lock().status = SinkStatus::Lost;
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cópia do histórico
    pub fn history(&self) -> Vec<RecordedCommand> {
        self.lock().history.iter().copied().collect()
    }

    /// Apenas os comandos, sem instantes
    pub fn commands(&self) -> Vec<SinkCommand> {
        self.lock().history.iter().map(|r| r.command).collect()
    }

    /// Disparos de um canal, em ordem
    pub fn triggers(&self, channel: SoundChannel) -> Vec<RecordedCommand> {
        self.lock()
            .history
            .iter()
            .filter(|r| r.command.is_trigger() && r.command.channel() == Some(channel))
            .copied()
            .collect()
    }

    pub fn trigger_count(&self, channel: SoundChannel) -> usize {
        self.triggers(channel).len()
    }

    /// Vozes disparadas em um canal
    pub fn voices(&self, channel: SoundChannel) -> Vec<Voice> {
        self.triggers(channel)
            .into_iter()
            .filter_map(|r| match r.command {
                SinkCommand::Trigger { voice, .. } => Some(voice),
                _ => None,
            })
            .collect()
    }

    /// Instante do último silêncio que cobre o canal
    pub fn last_silence(&self, channel: SoundChannel) -> Option<Instant> {
        self.lock()
            .history
            .iter()
            .rev()
            .find(|r| r.command.silences(channel))
            .map(|r| r.at)
    }

    pub fn clear(&self) {
        self.lock().history.clear();
    }

    fn record(state: &mut RecordingState, name: &str, command: SinkCommand) {
        if state.logging {
            match command {
                SinkCommand::Trigger { channel, voice } => info!("[{}] {} {}", name, channel, voice),
                SinkCommand::Silence(SilenceTarget::All) => info!("[{}] silence all", name),
                SinkCommand::Silence(SilenceTarget::Channel(c)) => {
                    info!("[{}] silence {}", name, c)
                }
                SinkCommand::Connect => info!("[{}] connect", name),
                SinkCommand::Disconnect => info!("[{}] disconnect", name),
            }
        }

        if state.history.len() == state.max_history {
            state.history.pop_front();
        }
        state.history.push_back(RecordedCommand {
            command,
            at: Instant::now(),
        });
    }

    fn accept(&self, command: SinkCommand) -> Result<(), SinkError> {
        let mut state = self.lock();
        match state.status {
            SinkStatus::Disconnected => return Err(SinkError::NotConnected),
            SinkStatus::Lost => return Err(SinkError::Unavailable("session lost".into())),
            SinkStatus::Ready => {}
        }

        if state.fail_after.is_some_and(|limit| state.calls >= limit) {
            state.status = SinkStatus::Lost;
            return Err(SinkError::Unavailable("simulated session loss".into()));
        }

        state.calls += 1;
        Self::record(&mut state, &self.name, command);
        Ok(())
    }
}

impl HauntComponent for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.lock().status == SinkStatus::Ready
    }
}

impl SoundSink for RecordingSink {
    fn connect(&mut self) -> Result<(), SinkError> {
        let mut state = self.lock();
        match state.status {
            SinkStatus::Ready => Ok(()),
            SinkStatus::Lost => Err(SinkError::Unavailable("session lost".into())),
            SinkStatus::Disconnected => {
                state.status = SinkStatus::Ready;
                Self::record(&mut state, &self.name, SinkCommand::Connect);
                Ok(())
            }
        }
    }

    fn trigger(&mut self, channel: SoundChannel, voice: Voice) -> Result<(), SinkError> {
        self.accept(SinkCommand::Trigger { channel, voice })
    }

    fn silence(&mut self, target: SilenceTarget) -> Result<(), SinkError> {
        self.accept(SinkCommand::Silence(target))
    }

    fn disconnect(&mut self) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.status == SinkStatus::Ready {
            state.status = SinkStatus::Disconnected;
            Self::record(&mut state, &self.name, SinkCommand::Disconnect);
        }
        Ok(())
    }

    fn status(&self) -> SinkStatus {
        self.lock().status
    }
}
