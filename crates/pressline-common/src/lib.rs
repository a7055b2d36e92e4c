pub mod clock;
pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use clock::{Clock, FrozenClock, SystemClock};
pub use config::{EffectiveConfig, EntityConfig, QuotasConfig, Region, ScoringConfig, SourceConfig, SourceMethod, TopicConfig};
pub use error::{ConfigError, ModelError};
pub use types::*;
