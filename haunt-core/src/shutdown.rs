//! Sinal cooperativo de desligamento
//!
//! Cada laço periódico pausa através de um [`ShutdownListener`]; a pausa
//! termina cedo quando o desligamento é disparado (ou, opcionalmente, quando
//! chega uma notificação de mudança de estado). O sinal é o fechamento de um
//! canal crossbeam: disparar = descartar o único `Sender`.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Motivo pelo qual uma pausa terminou
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A duração completa passou
    Elapsed,
    /// Notificação externa (ex.: transição de estado)
    Notified,
    /// Desligamento disparado
    Shutdown,
}

/// Dono do sinal de desligamento
#[derive(Debug)]
pub struct Shutdown {
    trigger: Mutex<Option<Sender<()>>>,
    listener: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Mutex::new(Some(tx)),
            listener: rx,
        }
    }

    /// Novo observador do sinal
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.listener.clone(),
        }
    }

    /// Dispara o desligamento (idempotente)
    pub fn trigger(&self) {
        self.trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_triggered(&self) -> bool {
        self.trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observador do sinal, clonável entre threads
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: Receiver<()>,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Pausa por `duration`; retorna `false` se o desligamento foi disparado
    pub fn sleep(&self, duration: Duration) -> bool {
        matches!(self.rx.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
    }

    /// Pausa por `duration`, acordando cedo com notificações de `wake`.
    ///
    /// Um canal de notificação desconectado é tratado como desligamento.
    pub fn sleep_or_wake(&self, duration: Duration, wake: &Receiver<()>) -> Wake {
        select! {
            recv(self.rx) -> _ => Wake::Shutdown,
            recv(wake) -> msg => match msg {
                Ok(()) => Wake::Notified,
                Err(_) => Wake::Shutdown,
            },
            default(duration) => Wake::Elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_sleep_elapses_without_trigger() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        assert!(listener.sleep(Duration::from_millis(5)));
        assert!(!listener.is_triggered());
    }

    #[test]
    fn test_trigger_interrupts_sleep() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let completed = listener.sleep(Duration::from_secs(10));
            (completed, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        shutdown.trigger();

        let (completed, elapsed) = handle.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_sleep_or_wake() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        let (tx, rx) = bounded(1);

        assert_eq!(listener.sleep_or_wake(Duration::from_millis(5), &rx), Wake::Elapsed);

        tx.send(()).unwrap();
        assert_eq!(listener.sleep_or_wake(Duration::from_secs(10), &rx), Wake::Notified);

        shutdown.trigger();
        assert_eq!(listener.sleep_or_wake(Duration::from_secs(10), &rx), Wake::Shutdown);
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.listener().is_triggered());
    }
}
