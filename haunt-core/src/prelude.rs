//! # Prelude — Re-exportações Convenientes
//!
//! ```
//! use haunt_core::prelude::*;
//! ```

// Tipos
pub use crate::types::{
    Centimeters,
    Interval,
    ProximityState,
    SilenceTarget,
    SoundChannel,
    Voice,
};

// Traits fundamentais
pub use crate::traits::{
    HauntComponent,
    Sensor,
    SensorError,
    SinkError,
    SinkStatus,
    SoundSink,
};

// Sincronização
pub use crate::shutdown::{Shutdown, ShutdownListener, Wake};
pub use crate::sync::Latest;
