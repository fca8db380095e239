//! Sessão FluidSynth controlada pelo shell de texto
//!
//! O sintetizador roda como processo filho em modo servidor (`-s`), lendo
//! comandos de uma linha pelo stdin. A sessão fica pronta quando o banner de
//! inicialização termina (duas linhas em branco no stdout).

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, unbounded};
use haunt_core::traits::{HauntComponent, SinkError, SinkStatus, SoundSink};
use haunt_core::types::{SilenceTarget, SoundChannel, Voice};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::error::{VoiceError, VoiceResult};
use crate::types::{ChannelMap, ShellCommand};

/// Configuração da sessão FluidSynth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidSynthConfig {
    /// Executável
    pub program: String,
    /// Argumentos fixos (servidor, sem reverb/chorus, ALSA)
    pub args: Vec<String>,
    /// Arquivo de comandos executado na partida (`-f`), ex.: seleção de programa
    pub config_file: Option<PathBuf>,
    /// SoundFont carregado na partida
    pub soundfont: Option<PathBuf>,
    /// Canais MIDI de buzz e thunder
    pub channels: ChannelMap,
    /// Tempo máximo até o banner terminar
    pub ready_timeout_ms: u64,
    /// Linhas em branco que encerram o banner
    pub ready_blank_lines: usize,
    /// Espera pelo `quit` antes de matar o processo
    pub quit_timeout_ms: u64,
}

impl Default for FluidSynthConfig {
    fn default() -> Self {
        Self {
            program: "fluidsynth".to_string(),
            args: ["-s", "-p", "fluid", "-C0", "-R0", "-r48000", "-a", "alsa", "-m", "alsa_seq"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            config_file: Some(PathBuf::from("config.txt")),
            soundfont: None,
            channels: ChannelMap::default(),
            ready_timeout_ms: 10_000,
            ready_blank_lines: 2,
            quit_timeout_ms: 1_000,
        }
    }
}

impl FluidSynthConfig {
    pub fn validate(&self) -> VoiceResult<()> {
        if self.program.trim().is_empty() {
            return Err(VoiceError::InvalidConfig("program must not be empty".into()));
        }
        if self.ready_timeout_ms == 0 {
            return Err(VoiceError::InvalidConfig(
                "ready_timeout_ms must be positive".into(),
            ));
        }
        self.channels.validate().map_err(VoiceError::InvalidConfig)
    }

    /// Argumentos completos passados ao executável
    pub fn command_line(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(file) = &self.config_file {
            args.push("-f".to_string());
            args.push(file.display().to_string());
        }
        if let Some(soundfont) = &self.soundfont {
            args.push(soundfont.display().to_string());
        }
        args
    }
}

#[derive(Debug)]
struct Session {
    child: Child,
    stdin: ChildStdin,
}

impl Session {
    fn kill(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Sink sonoro sobre um processo FluidSynth
#[derive(Debug)]
pub struct FluidSynthSink {
    config: FluidSynthConfig,
    session: Option<Session>,
    status: SinkStatus,
    /// Nota soando por canal lógico (buzz, thunder)
    sounding: [Option<u8>; 2],
    lines_sent: u64,
}

impl FluidSynthSink {
    pub fn new(config: FluidSynthConfig) -> VoiceResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            session: None,
            status: SinkStatus::Disconnected,
            sounding: [None; 2],
            lines_sent: 0,
        })
    }

    pub fn config(&self) -> &FluidSynthConfig {
        &self.config
    }

    /// Linhas escritas no shell desde o `connect`
    pub fn lines_sent(&self) -> u64 {
        self.lines_sent
    }

    fn slot(channel: SoundChannel) -> usize {
        match channel {
            SoundChannel::Buzz => 0,
            SoundChannel::Thunder => 1,
        }
    }

    fn spawn(&self) -> VoiceResult<Session> {
        let mut child = Command::new(&self.config.program)
            .args(self.config.command_line())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VoiceError::SpawnFailed(format!("{}: {}", self.config.program, e)))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VoiceError::SpawnFailed("child pipes unavailable".into()));
        };

        let (tx, rx) = unbounded::<String>();
        let spawned = thread::Builder::new()
            .name("fluidsynth-stdout".into())
            .spawn(move || {
                // Drena o stdout até o processo terminar
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    trace!(target: "haunt::fluidsynth", "{}", line);
                    let _ = tx.send(line);
                }
            });

        let session = Session { child, stdin };
        if let Err(e) = spawned {
            session.kill();
            return Err(VoiceError::SpawnFailed(format!("stdout reader: {}", e)));
        }

        let timeout = Duration::from_millis(self.config.ready_timeout_ms);
        let deadline = Instant::now() + timeout;
        let mut blank = 0;
        while blank < self.config.ready_blank_lines {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(line) if line.trim().is_empty() => blank += 1,
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => {
                    session.kill();
                    return Err(VoiceError::ReadyTimeout(self.config.ready_timeout_ms));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    session.kill();
                    return Err(VoiceError::SpawnFailed(
                        "synth exited before becoming ready".into(),
                    ));
                }
            }
        }

        Ok(session)
    }

    fn send(&mut self, commands: &[ShellCommand]) -> Result<(), SinkError> {
        match self.status {
            SinkStatus::Disconnected => return Err(SinkError::NotConnected),
            SinkStatus::Lost => return Err(SinkError::Unavailable("session lost".into())),
            SinkStatus::Ready => {}
        }
        let Some(session) = self.session.as_mut() else {
            return Err(SinkError::NotConnected);
        };

        let text: String = commands.iter().map(|c| c.to_string()).collect();
        let written = session
            .stdin
            .write_all(text.as_bytes())
            .and_then(|_| session.stdin.flush());

        match written {
            Ok(()) => {
                self.lines_sent += commands.len() as u64;
                Ok(())
            }
            Err(e) => {
                warn!("FluidSynth session lost: {}", e);
                self.status = SinkStatus::Lost;
                self.sounding = [None; 2];
                if let Some(session) = self.session.take() {
                    session.kill();
                }
                Err(VoiceError::SessionLost(e.to_string()).into())
            }
        }
    }
}

impl HauntComponent for FluidSynthSink {
    fn name(&self) -> &str {
        "fluidsynth"
    }

    fn is_ready(&self) -> bool {
        self.status == SinkStatus::Ready
    }
}

impl SoundSink for FluidSynthSink {
    fn connect(&mut self) -> Result<(), SinkError> {
        match self.status {
            SinkStatus::Ready => return Ok(()),
            SinkStatus::Lost => return Err(SinkError::Unavailable("session lost".into())),
            SinkStatus::Disconnected => {}
        }

        let started = Instant::now();
        let session = self.spawn()?;
        info!(
            "FluidSynth ready in {:?} (pid {})",
            started.elapsed(),
            session.child.id()
        );

        self.session = Some(session);
        self.status = SinkStatus::Ready;
        self.sounding = [None; 2];
        self.lines_sent = 0;
        Ok(())
    }

    fn trigger(&mut self, channel: SoundChannel, voice: Voice) -> Result<(), SinkError> {
        let midi = self.config.channels.midi(channel);
        let slot = Self::slot(channel);

        let mut commands = Vec::with_capacity(2);
        if let Some(previous) = self.sounding[slot] {
            commands.push(ShellCommand::NoteOff {
                channel: midi,
                note: previous,
            });
        }
        commands.push(ShellCommand::NoteOn {
            channel: midi,
            note: voice.pitch,
            velocity: voice.volume,
        });

        self.send(&commands)?;
        self.sounding[slot] = Some(voice.pitch);
        Ok(())
    }

    fn silence(&mut self, target: SilenceTarget) -> Result<(), SinkError> {
        let channels = self.config.channels.targets(target);
        let commands: Vec<ShellCommand> = channels
            .iter()
            .map(|c| ShellCommand::AllNotesOff {
                channel: self.config.channels.midi(*c),
            })
            .collect();

        self.send(&commands)?;
        for channel in channels {
            self.sounding[Self::slot(channel)] = None;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SinkError> {
        // Sessão perdida continua perdida
        if self.status != SinkStatus::Ready {
            return Ok(());
        }

        let farewell = [
            ShellCommand::AllNotesOff {
                channel: self.config.channels.buzz,
            },
            ShellCommand::AllNotesOff {
                channel: self.config.channels.thunder,
            },
            ShellCommand::Quit,
        ];
        let sent = self.send(&farewell);

        if let Some(Session { mut child, stdin }) = self.session.take() {
            drop(stdin);
            let deadline = Instant::now() + Duration::from_millis(self.config.quit_timeout_ms);
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        debug!("FluidSynth exited: {}", status);
                        break;
                    }
                    Ok(None) if Instant::now() < deadline => {
                        thread::sleep(Duration::from_millis(10));
                    }
                    _ => {
                        warn!("FluidSynth did not quit, killing");
                        let _ = child.kill();
                        let _ = child.wait();
                        break;
                    }
                }
            }
        }

        self.status = SinkStatus::Disconnected;
        self.sounding = [None; 2];
        sent
    }

    fn status(&self) -> SinkStatus {
        self.status
    }
}

impl Drop for FluidSynthSink {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.kill();
        }
    }
}
