//! Tipos de comando para sinks sonoros

use std::fmt;
use std::time::Instant;

use haunt_core::types::{SilenceTarget, SoundChannel, Voice};
use serde::{Deserialize, Serialize};

/// Controlador MIDI "All Notes Off"
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Maior canal MIDI endereçável
pub const MIDI_CHANNEL_MAX: u8 = 15;

// ═══════════════════════════════════════════════════════════════════════════════
// COMANDOS DE ALTO NÍVEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Chamada recebida por um sink (o que o núcleo pediu)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkCommand {
    Connect,
    Trigger { channel: SoundChannel, voice: Voice },
    Silence(SilenceTarget),
    Disconnect,
}

impl SinkCommand {
    pub fn is_trigger(&self) -> bool {
        matches!(self, SinkCommand::Trigger { .. })
    }

    /// Canal afetado (None para comandos de sessão)
    pub fn channel(&self) -> Option<SoundChannel> {
        match self {
            SinkCommand::Trigger { channel, .. } => Some(*channel),
            SinkCommand::Silence(SilenceTarget::Channel(channel)) => Some(*channel),
            _ => None,
        }
    }

    /// O comando silencia o canal dado?
    pub fn silences(&self, channel: SoundChannel) -> bool {
        match self {
            SinkCommand::Silence(SilenceTarget::All) => true,
            SinkCommand::Silence(SilenceTarget::Channel(c)) => *c == channel,
            _ => false,
        }
    }
}

/// Comando registrado com o instante de chegada
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedCommand {
    pub command: SinkCommand,
    pub at: Instant,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOLO DO SHELL FLUIDSYNTH
// ═══════════════════════════════════════════════════════════════════════════════

/// Linha do shell de texto do FluidSynth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    AllNotesOff { channel: u8 },
    Quit,
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellCommand::NoteOn {
                channel,
                note,
                velocity,
            } => writeln!(f, "noteon {} {} {}", channel, note, velocity),
            ShellCommand::NoteOff { channel, note } => writeln!(f, "noteoff {} {}", channel, note),
            ShellCommand::AllNotesOff { channel } => {
                writeln!(f, "cc {} {} 0", channel, CC_ALL_NOTES_OFF)
            }
            ShellCommand::Quit => writeln!(f, "quit"),
        }
    }
}

/// Canal lógico → canal MIDI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMap {
    pub buzz: u8,
    pub thunder: u8,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            buzz: 0,
            thunder: 1,
        }
    }
}

impl ChannelMap {
    pub fn midi(&self, channel: SoundChannel) -> u8 {
        match channel {
            SoundChannel::Buzz => self.buzz,
            SoundChannel::Thunder => self.thunder,
        }
    }

    /// Canais lógicos afetados por um pedido de silêncio
    pub fn targets(&self, target: SilenceTarget) -> Vec<SoundChannel> {
        match target {
            SilenceTarget::Channel(channel) => vec![channel],
            SilenceTarget::All => SoundChannel::ALL.to_vec(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.buzz > MIDI_CHANNEL_MAX || self.thunder > MIDI_CHANNEL_MAX {
            return Err(format!(
                "MIDI channels must be 0-{}, got buzz={} thunder={}",
                MIDI_CHANNEL_MAX, self.buzz, self.thunder
            ));
        }
        if self.buzz == self.thunder {
            return Err(format!("buzz and thunder share MIDI channel {}", self.buzz));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_lines() {
        let on = ShellCommand::NoteOn {
            channel: 1,
            note: 30,
            velocity: 40,
        };
        assert_eq!(on.to_string(), "noteon 1 30 40\n");
        assert_eq!(
            ShellCommand::NoteOff { channel: 1, note: 30 }.to_string(),
            "noteoff 1 30\n"
        );
        assert_eq!(
            ShellCommand::AllNotesOff { channel: 1 }.to_string(),
            "cc 1 123 0\n"
        );
        assert_eq!(ShellCommand::Quit.to_string(), "quit\n");
    }

    #[test]
    fn test_channel_map_validation() {
        assert!(ChannelMap::default().validate().is_ok());
        assert!(ChannelMap { buzz: 2, thunder: 2 }.validate().is_err());
        assert!(ChannelMap { buzz: 0, thunder: 16 }.validate().is_err());
    }

    #[test]
    fn test_command_silences() {
        let all = SinkCommand::Silence(SilenceTarget::All);
        assert!(all.silences(SoundChannel::Thunder));

        let buzz_only = SinkCommand::Silence(SilenceTarget::Channel(SoundChannel::Buzz));
        assert!(buzz_only.silences(SoundChannel::Buzz));
        assert!(!buzz_only.silences(SoundChannel::Thunder));
        assert_eq!(buzz_only.channel(), Some(SoundChannel::Buzz));
    }
}
