//! # 📡 haunt-ranging — Percepção de Proximidade
//!
//! Sensores de distância (ultrassom) implementando o trait `Sensor` do core e a
//! [`DistanceSource`], que transforma leituras ruidosas em uma distância
//! filtrada pelo mínimo móvel.
//!
//! ## Por que mínimo?
//!
//! Um telemetro ultrassônico raramente mede *menos* do que a distância real;
//! leituras longas demais costumam ser ecos perdidos. O mínimo das últimas N
//! amostras descarta esses falsos "longe" sem atrasar uma aproximação genuína.
//!
//! ## Componentes
//!
//! | Tipo | Uso |
//! |:-----|:----|
//! | [`IioRangeSensor`] | HC-SR04 via driver `srf04` do kernel (sysfs IIO) |
//! | [`ScriptedRangeSensor`] | Sequência programada (simulação, testes) |
//! | [`DistanceSource`] | Polling + janela + publicação |
//!
//! ## Exemplo
//!
//! ```
//! use haunt_ranging::{DistanceSource, RangingConfig, ScriptedRangeSensor};
//!
//! let sensor = ScriptedRangeSensor::from_distances(vec![120.0, 500.0, 90.0]);
//! let mut source = DistanceSource::new(sensor, RangingConfig::default()).unwrap();
//!
//! source.poll();
//! source.poll(); // 500 cm está fora de alcance: vira "sem alvo"
//! source.poll();
//! assert_eq!(source.filtered(), 90.0);
//! ```

pub mod error;
pub mod iio;
pub mod scripted;
pub mod source;
pub mod types;

pub use error::{RangingError, RangingResult};
pub use iio::{IioConfig, IioRangeSensor};
pub use scripted::{ScriptStep, ScriptedRangeSensor};
pub use source::{DistanceSource, RangingConfig, RangingStats};
pub use types::{DistanceReading, DistanceSample, DistanceWindow};

// Re-export core types
pub use haunt_core::prelude::*;
