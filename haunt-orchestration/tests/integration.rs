//! Testes de integração para haunt-orchestration (threads reais, tempos curtos)

use std::thread;
use std::time::{Duration, Instant};

use haunt_orchestration::*;
use haunt_ranging::ScriptedRangeSensor;
use haunt_voice::{RecordingSink, SinkCommand};

/// Configuração acelerada: 10 ms por poll/tick, intervalos de dezenas de ms
fn fast_config() -> HauntConfig {
    let mut config = HauntConfig::default();
    config.sensor.poll_interval_ms = 10;
    config.sensor.window_size = 3;
    config.pacing.tick_ms = 10;
    config.pacing.inactive_fallback_ms = 10;
    config.dwell = DwellConfig {
        idle_ms: 30,
        lure_ms: 30,
        scare_ms: 30,
        release_ms: 150,
    };
    config.mapper = MapperConfig {
        buzz_divisor: 3_000.0,
        buzz_min_s: 0.02,
        buzz_max_s: 0.2,
        thunder_divisor: 1_000.0,
        thunder_min_s: 0.05,
    };
    config
}

fn wait_for_state(events: &Subscription, wanted: ProximityState, timeout: Duration) -> Vec<ProximityState> {
    let deadline = Instant::now() + timeout;
    let mut seen = Vec::new();

    while Instant::now() < deadline {
        if let Some(HauntEvent::Transition { to, .. }) = events.recv_timeout(Duration::from_millis(20)) {
            seen.push(to);
            if to == wanted {
                break;
            }
        }
    }
    seen
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = HauntConfig::default();
    config.thresholds.scare_near_cm = 400.0;

    let err = Orchestrator::new(config).unwrap_err();
    assert!(matches!(err, OrchestrationError::InvalidConfiguration(_)));
}

#[test]
fn test_full_cycle_lure_scare_idle() {
    let sensor = ScriptedRangeSensor::parse("300*30,40*40,400").unwrap();
    let recorder = RecordingSink::new();

    let orchestrator = Orchestrator::new(fast_config()).unwrap();
    let transitions = orchestrator.events().subscribe_filtered(EventFilter::Transitions);
    let running = orchestrator.start(sensor, Box::new(recorder.clone())).unwrap();

    let seen = wait_for_state(&transitions, ProximityState::Idle, Duration::from_secs(5));
    assert_eq!(
        seen,
        vec![ProximityState::Lure, ProximityState::Scare, ProximityState::Idle]
    );

    thread::sleep(Duration::from_millis(150));
    assert_eq!(running.state(), ProximityState::Idle);
    let report = running.shutdown().unwrap();

    assert_eq!(report.final_state, ProximityState::Idle);
    assert_eq!(report.machine.transitions, 3);
    assert!(report.buzz.emissions > 0);
    assert!(report.thunder.emissions > 0);
    assert_eq!(report.sink_status, SinkStatus::Disconnected);

    // A última nota veio antes do silêncio de Idle (e do silêncio final)
    let commands = recorder.commands();
    let last_trigger = commands.iter().rposition(SinkCommand::is_trigger).unwrap();
    let silences_after = commands[last_trigger + 1..]
        .iter()
        .filter(|c| matches!(c, SinkCommand::Silence(SilenceTarget::All)))
        .count();
    assert_eq!(silences_after, 2);
    assert_eq!(commands.last(), Some(&SinkCommand::Disconnect));
}

#[test]
fn test_sink_loss_does_not_stop_the_run() {
    let recorder = RecordingSink::new().fail_after(3);

    let orchestrator = Orchestrator::new(fast_config()).unwrap();
    let failures = orchestrator.events().subscribe_filtered(EventFilter::Sink);
    let running = orchestrator
        .start(ScriptedRangeSensor::constant(200.0), Box::new(recorder.clone()))
        .unwrap();

    thread::sleep(Duration::from_millis(400));
    assert_eq!(running.state(), ProximityState::Lure);
    assert!(running.reading().filtered < 201.0);

    let report = running.shutdown().unwrap();
    assert!(report.buzz.failures > 0);
    assert_eq!(report.sink_status, SinkStatus::Lost);
    assert!(failures.try_iter().any(|e| matches!(e, HauntEvent::SinkFailure { .. })));
}

#[test]
fn test_unreachable_sink_runs_silent() {
    let recorder = RecordingSink::new();
    recorder.set_lost();

    let orchestrator = Orchestrator::new(fast_config()).unwrap();
    let sink_events = orchestrator.events().subscribe_filtered(EventFilter::Sink);
    let running = orchestrator
        .start(ScriptedRangeSensor::constant(150.0), Box::new(recorder.clone()))
        .unwrap();

    assert!(matches!(
        sink_events.try_recv(),
        Some(HauntEvent::SinkFailure { channel: None, .. })
    ));

    thread::sleep(Duration::from_millis(300));
    assert_eq!(running.state(), ProximityState::Lure);

    let report = running.shutdown().unwrap();
    assert_eq!(report.buzz.emissions, 0);
    assert!(recorder.history().is_empty());
}

#[test]
fn test_shutdown_interrupts_long_pauses() {
    // Intervalos reais (thunder ≥ 9.6 s): o desligamento não espera por eles
    let mut config = HauntConfig::default();
    config.sensor.poll_interval_ms = 20;
    config.dwell = DwellConfig {
        idle_ms: 0,
        lure_ms: 0,
        scare_ms: 0,
        release_ms: 2_000,
    };

    let orchestrator = Orchestrator::new(config).unwrap();
    let emissions = orchestrator.events().subscribe_filtered(EventFilter::Channel(SoundChannel::Thunder));
    let running = orchestrator
        .start(ScriptedRangeSensor::constant(40.0), Box::new(RecordingSink::new()))
        .unwrap();

    assert!(emissions.recv_timeout(Duration::from_secs(3)).is_some());

    let started = Instant::now();
    let report = running.shutdown().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(report.thunder.emissions, 1);
    assert_eq!(report.final_state, ProximityState::Scare);
}
