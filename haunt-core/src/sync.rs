//! # Célula de Último Valor
//!
//! Célula de escritor único e vários leitores que guarda sempre o valor mais
//! recente. Leitores clonam o valor sob o read lock do `ShardedLock`; o
//! escritor troca o valor sob o write lock. Nenhum lado segura o lock durante
//! uma pausa, então o escritor espera no máximo o tempo de um clone.
//!
//! ## Uso
//!
//! ```
//! use haunt_core::sync::Latest;
//!
//! let cell = Latest::new(0u32);
//! let reader = cell.clone();
//!
//! cell.publish(7);
//! assert_eq!(reader.load(), 7);
//! assert_eq!(reader.version(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use crossbeam_utils::sync::ShardedLock;

/// Célula compartilhada "último valor vence"
pub struct Latest<T> {
    inner: Arc<LatestInner<T>>,
}

struct LatestInner<T> {
    value: ShardedLock<T>,
    version: AtomicU64,
    watchers: Mutex<Vec<Sender<()>>>,
}

impl<T: Clone> Latest<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(LatestInner {
                value: ShardedLock::new(initial),
                version: AtomicU64::new(0),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Substitui o valor atual; retorna a nova versão
    pub fn publish(&self, value: T) -> u64 {
        let mut guard = self.inner.value.write().unwrap_or_else(PoisonError::into_inner);
        *guard = value;
        // Incrementada sob o write lock: (valor, versão) sempre consistentes
        self.inner.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Publica e acorda todos os observadores
    pub fn announce(&self, value: T) -> u64 {
        let version = self.publish(value);
        self.notify();
        version
    }

    /// Cópia do valor atual
    pub fn load(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Valor atual junto com sua versão
    pub fn load_versioned(&self) -> (T, u64) {
        let guard = self.inner.value.read().unwrap_or_else(PoisonError::into_inner);
        (guard.clone(), self.inner.version.load(Ordering::Acquire))
    }

    /// Número de publicações até agora
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Receptor que recebe um aviso a cada `announce`.
    ///
    /// Avisos se fundem: no máximo um pendente por observador.
    pub fn watch(&self) -> Receiver<()> {
        let (tx, rx) = bounded(1);
        self.inner
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn notify(&self) {
        let mut watchers = self.inner.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        watchers.retain(|tx| !matches!(tx.try_send(()), Err(TrySendError::Disconnected(_))));
    }
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Latest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (value, version) = self.load_versioned();
        f.debug_struct("Latest")
            .field("value", &value)
            .field("version", &version)
            .finish()
    }
}
