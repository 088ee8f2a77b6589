//! Emotional State Engine.
//!
//! A bounded, continuously decaying set of named impulses with a dominant
//! selection rule, a mood-bias memory and lenient JSON persistence.

pub mod actor;
pub mod engine;
pub mod impulse;
pub mod memory;
pub mod persistence;
pub mod snapshot;

pub use actor::{spawn, EmotionHandle};
pub use engine::{CycleReport, EmotionalState, EngineConfig, Fluctuation, InteractionKind};
pub use impulse::EmotionalImpulse;
pub use memory::{EmotionalMemory, HistoryEntry};
pub use persistence::{PersistedState, SCHEMA_VERSION};
pub use snapshot::{EmotionalSnapshot, Energy, ImpulseView, Mood};
