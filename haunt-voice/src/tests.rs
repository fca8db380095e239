//! Testes do módulo haunt-voice

use super::*;
use haunt_core::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DO RECORDING SINK
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_recording_requires_connect() {
    let mut sink = RecordingSink::new();
    assert_eq!(sink.status(), SinkStatus::Disconnected);
    assert_eq!(
        sink.trigger(SoundChannel::Buzz, Voice::new(40, 40)),
        Err(SinkError::NotConnected)
    );

    sink.connect().unwrap();
    assert!(sink.is_ready());
    sink.trigger(SoundChannel::Buzz, Voice::new(40, 40)).unwrap();
    assert_eq!(sink.trigger_count(SoundChannel::Buzz), 1);
}

#[test]
fn test_clones_share_history() {
    let recorder = RecordingSink::new();
    let mut sink: Box<dyn SoundSink> = Box::new(recorder.clone());

    sink.connect().unwrap();
    sink.trigger(SoundChannel::Thunder, Voice::new(30, 50)).unwrap();
    sink.silence(SilenceTarget::All).unwrap();
    sink.disconnect().unwrap();

    assert_eq!(
        recorder.commands(),
        vec![
            SinkCommand::Connect,
            SinkCommand::Trigger {
                channel: SoundChannel::Thunder,
                voice: Voice::new(30, 50),
            },
            SinkCommand::Silence(SilenceTarget::All),
            SinkCommand::Disconnect,
        ]
    );
    assert_eq!(recorder.voices(SoundChannel::Thunder), vec![Voice::new(30, 50)]);
    assert!(recorder.last_silence(SoundChannel::Buzz).is_some());
}

#[test]
fn test_history_is_bounded() {
    let mut sink = RecordingSink::with_history(3);
    sink.connect().unwrap();
    for pitch in 40..45 {
        sink.trigger(SoundChannel::Buzz, Voice::new(pitch, 40)).unwrap();
    }

    let pitches: Vec<u8> = sink
        .voices(SoundChannel::Buzz)
        .iter()
        .map(|v| v.pitch)
        .collect();
    assert_eq!(pitches, vec![42, 43, 44]);
}

#[test]
fn test_simulated_session_loss() {
    let mut sink = RecordingSink::new().fail_after(2);
    sink.connect().unwrap();

    sink.trigger(SoundChannel::Buzz, Voice::new(40, 40)).unwrap();
    sink.silence(SilenceTarget::Channel(SoundChannel::Buzz)).unwrap();
    assert!(matches!(
        sink.trigger(SoundChannel::Buzz, Voice::new(40, 40)),
        Err(SinkError::Unavailable(_))
    ));
    assert_eq!(sink.status(), SinkStatus::Lost);

    // Sem reconexão
    assert!(sink.connect().is_err());
    assert!(sink.silence(SilenceTarget::All).is_err());
    assert_eq!(sink.commands().len(), 3);
}

#[test]
fn test_last_silence_per_channel() {
    let mut sink = RecordingSink::new();
    sink.connect().unwrap();
    sink.silence(SilenceTarget::Channel(SoundChannel::Thunder)).unwrap();

    assert!(sink.last_silence(SoundChannel::Thunder).is_some());
    assert!(sink.last_silence(SoundChannel::Buzz).is_none());
}

#[test]
fn test_recorded_command_serializes() {
    let command = SinkCommand::Trigger {
        channel: SoundChannel::Buzz,
        voice: Voice::new(48, 45),
    };
    let json = serde_json::to_string(&command).unwrap();
    assert!(json.contains("\"buzz\""));
    let back: SinkCommand = serde_json::from_str(&json).unwrap();
    assert_eq!(back, command);
}
