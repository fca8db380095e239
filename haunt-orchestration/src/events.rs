//! # Barramento de Eventos
//!
//! Fluxo de observação MPMC sobre canais crossbeam. As atividades emitem sem
//! nunca bloquear (fila cheia descarta o evento); cada assinante consome no
//! próprio ritmo.
//!
//! ## Uso
//!
//! ```
//! use haunt_orchestration::events::{EventBus, EventFilter, HauntEvent};
//! use haunt_core::types::ProximityState;
//!
//! let bus = EventBus::new();
//! let rx = bus.subscribe_filtered(EventFilter::Transitions);
//!
//! bus.emit(HauntEvent::Transition {
//!     from: ProximityState::Idle,
//!     to: ProximityState::Lure,
//!     distance: 300.0,
//! });
//!
//! assert!(matches!(rx.try_recv(), Some(HauntEvent::Transition { .. })));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use crossbeam_utils::sync::ShardedLock;
use haunt_core::types::{Centimeters, ProximityState, SilenceTarget, SoundChannel, Voice};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTOS
// ═══════════════════════════════════════════════════════════════════════════════

/// Eventos observáveis do controlador
#[derive(Debug, Clone, PartialEq)]
pub enum HauntEvent {
    /// Mudança de estado
    Transition {
        from: ProximityState,
        to: ProximityState,
        distance: Centimeters,
    },
    /// Disparo aceito pelo sink
    Emission {
        channel: SoundChannel,
        interval_s: f64,
        voice: Voice,
    },
    /// Silêncio aceito pelo sink
    Silenced { target: SilenceTarget },
    /// Chamada ao sink falhou
    SinkFailure {
        channel: Option<SoundChannel>,
        error: String,
    },
    /// Desligamento concluído
    Shutdown,
}

/// Filtro de eventos
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Todos os eventos
    All,
    /// Apenas transições
    Transitions,
    /// Disparos de qualquer canal
    Emissions,
    /// Disparos de um canal
    Channel(SoundChannel),
    /// Falhas e silêncios do sink
    Sink,
}

impl EventFilter {
    /// Verifica se um evento passa pelo filtro
    pub fn matches(&self, event: &HauntEvent) -> bool {
        match (self, event) {
            (EventFilter::All, _) => true,
            (EventFilter::Transitions, HauntEvent::Transition { .. }) => true,
            (EventFilter::Emissions, HauntEvent::Emission { .. }) => true,
            (EventFilter::Channel(wanted), HauntEvent::Emission { channel, .. }) => wanted == channel,
            (EventFilter::Sink, HauntEvent::SinkFailure { .. } | HauntEvent::Silenced { .. }) => true,
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BARRAMENTO
// ═══════════════════════════════════════════════════════════════════════════════

/// Sender com filtro associado
struct FilteredSender {
    filter: EventFilter,
    sender: Sender<HauntEvent>,
}

/// Barramento lock-free (clones compartilham assinantes e contadores)
#[derive(Clone)]
pub struct EventBus {
    senders: Arc<ShardedLock<Vec<FilteredSender>>>,
    event_count: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    /// Capacidade do canal (0 = ilimitado)
    capacity: usize,
}

/// Handle de assinatura (receptor)
pub struct Subscription {
    receiver: Receiver<HauntEvent>,
    filter: EventFilter,
}

impl EventBus {
    /// Fila padrão por assinante
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Filas limitadas por assinante (0 = ilimitado)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            senders: Arc::new(ShardedLock::new(Vec::new())),
            event_count: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Assina todos os eventos
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_filtered(EventFilter::All)
    }

    /// Assina com filtro
    pub fn subscribe_filtered(&self, filter: EventFilter) -> Subscription {
        let (sender, receiver) = if self.capacity > 0 {
            bounded(self.capacity)
        } else {
            unbounded()
        };

        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FilteredSender {
                filter: filter.clone(),
                sender,
            });

        Subscription { receiver, filter }
    }

    /// Emite para todo assinante cujo filtro aceita (não bloqueia)
    pub fn emit(&self, event: HauntEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);

        let mut dead = Vec::new();
        {
            let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
            for fs in senders.iter().filter(|fs| fs.filter.matches(&event)) {
                match fs.sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => dead.push(fs.sender.clone()),
                }
            }
        }

        if !dead.is_empty() {
            self.prune(&dead);
        }
    }

    /// Número de eventos emitidos
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    /// Entregas descartadas por fila cheia
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Número de assinantes vivos
    pub fn subscriber_count(&self) -> usize {
        self.senders.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Remove assinantes cujo receptor foi descartado
    fn prune(&self, dead: &[Sender<HauntEvent>]) {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|fs| !dead.iter().any(|d| d.same_channel(&fs.sender)));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_count", &self.event_count())
            .field("subscriber_count", &self.subscriber_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSINATURA
// ═══════════════════════════════════════════════════════════════════════════════

impl Subscription {
    /// Tenta receber o próximo evento (não bloqueia)
    pub fn try_recv(&self) -> Option<HauntEvent> {
        self.receiver.try_recv().ok()
    }

    /// Recebe com timeout
    pub fn recv_timeout(&self, timeout: Duration) -> Option<HauntEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Número de eventos pendentes
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Drena os eventos pendentes (não bloqueia)
    pub fn try_iter(&self) -> impl Iterator<Item = HauntEvent> + '_ {
        self.receiver.try_iter()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("filter", &self.filter)
            .field("pending", &self.len())
            .finish()
    }
}
