//! Emotional state persistence.
//!
//! JSON snapshot on disk. Loading is lenient: missing fields fall back to
//! defaults and malformed entries are skipped with a warning, so a damaged
//! file degrades the state instead of failing the session.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::errors::{NexarionError, Result};

use super::engine::{EmotionalState, EngineConfig};
use super::impulse::{EmotionalImpulse, DEFAULT_DOMINANCE};
use super::memory::HistoryEntry;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Source recorded for impulses whose file entry had none.
const RESTORED_SOURCE: &str = "restored";

pub(crate) fn epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
}

/// Serialized impulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedImpulse {
    pub name: String,
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
    pub source: String,
    pub timestamp: Option<f64>,
}

/// Reads a numeric field, ignoring values of the wrong type.
fn number(entry: &Map<String, Value>, key: &str) -> Option<f64> {
    entry.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn text(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

impl From<&EmotionalImpulse> for PersistedImpulse {
    fn from(impulse: &EmotionalImpulse) -> Self {
        Self {
            name: impulse.name().to_string(),
            valence: impulse.valence(),
            arousal: impulse.arousal(),
            dominance: impulse.dominance(),
            source: impulse.source().to_string(),
            timestamp: Some(epoch_seconds(impulse.created_at())),
        }
    }
}

impl PersistedImpulse {
    /// Field-by-field read of one file entry. `None` only when the entry
    /// is not an object; each bad field falls back to its default.
    fn from_value(raw: &Value) -> Option<Self> {
        let entry = raw.as_object()?;
        Some(Self {
            name: text(entry, "name").unwrap_or_default(),
            valence: number(entry, "valence").unwrap_or(0.0),
            arousal: number(entry, "arousal").unwrap_or(0.0),
            dominance: number(entry, "dominance").unwrap_or(DEFAULT_DOMINANCE),
            source: text(entry, "source").unwrap_or_else(|| RESTORED_SOURCE.to_string()),
            timestamp: number(entry, "timestamp"),
        })
    }

    fn into_impulse(self) -> EmotionalImpulse {
        let created_at = self
            .timestamp
            .and_then(from_epoch_seconds)
            .unwrap_or_else(Utc::now);
        EmotionalImpulse::with_created_at(
            self.name,
            self.valence,
            self.arousal,
            self.dominance,
            self.source,
            created_at,
        )
    }
}

/// The persisted snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub current_emotions: Vec<PersistedImpulse>,
    pub memory_history: Vec<HistoryEntry>,
    pub emotional_entropy: f64,
    pub saved_at: f64,
}

impl PersistedState {
    /// Captures the state, keeping only the newest `persisted_history` memories.
    pub fn capture(state: &EmotionalState) -> Self {
        Self {
            version: SCHEMA_VERSION,
            current_emotions: state.impulses.iter().map(PersistedImpulse::from).collect(),
            memory_history: state.memory.recent(state.config.persisted_history),
            emotional_entropy: state.entropy,
            saved_at: epoch_seconds(Utc::now()),
        }
    }

    /// Writes atomically: temp file in the same directory, then rename.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_json_atomically(self, path)?;
        debug!("Saved emotional state to {:?}", path);
        Ok(())
    }
}

/// Pretty JSON written to a sibling temp file, then renamed over `path`.
pub(crate) fn write_json_atomically<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let write_failure = |message: String| NexarionError::PersistenceWriteFailure {
        path: path.to_path_buf(),
        message: Arc::new(message),
    };

    let json =
        serde_json::to_string_pretty(value).map_err(|e| write_failure(format!("serialization failed: {e}")))?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| write_failure(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| write_failure(e.to_string()))?;
    tmp.write_all(json.as_bytes()).map_err(|e| write_failure(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_failure(e.error.to_string()))?;
    Ok(())
}

/// Parses a snapshot document leniently.
fn restore(document: &Value, path: &Path, config: EngineConfig, rng: StdRng) -> Result<EmotionalState> {
    let Some(object) = document.as_object() else {
        return Err(NexarionError::PersistenceCorrupt {
            path: path.to_path_buf(),
            message: Arc::new("top-level value is not an object".to_string()),
        });
    };

    if let Some(version) = object.get("version").and_then(Value::as_u64) {
        if version > u64::from(SCHEMA_VERSION) {
            warn!("Snapshot {:?} has newer schema version {}, reading what we can", path, version);
        }
    }

    let mut state = EmotionalState::empty(config, rng);

    if let Some(entropy) = object.get("emotional_entropy").and_then(Value::as_f64) {
        if entropy.is_finite() {
            state.entropy = entropy.clamp(0.1, 0.3);
        }
    }

    for (idx, raw) in entry_list(object.get("current_emotions")).enumerate() {
        match PersistedImpulse::from_value(raw) {
            Some(entry) if entry.name.trim().is_empty() => {
                warn!("Skipping unnamed impulse #{} in {:?}", idx, path);
            }
            Some(entry) if state.impulse(&entry.name).is_some() => {
                warn!("Skipping duplicate impulse '{}' in {:?}", entry.name, path);
            }
            Some(entry) => state.apply_impulse(entry.into_impulse()),
            None => warn!("Skipping malformed impulse #{} in {:?}", idx, path),
        }
    }

    for (idx, raw) in entry_list(object.get("memory_history")).enumerate() {
        match raw.as_object() {
            Some(entry) => state.memory.record(
                HistoryEntry {
                    name: text(entry, "name").unwrap_or_default(),
                    valence: number(entry, "valence").unwrap_or(0.0),
                    arousal: number(entry, "arousal").unwrap_or(0.0),
                    source: text(entry, "source").unwrap_or_else(|| RESTORED_SOURCE.to_string()),
                    time: number(entry, "time").unwrap_or(0.0),
                }
                .sanitized(),
            ),
            None => warn!("Skipping malformed memory #{} in {:?}", idx, path),
        }
    }

    Ok(state)
}

fn entry_list(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|entries| entries.iter())
        .into_iter()
        .flatten()
}

impl EmotionalState {
    /// Persists impulses, the newest memories and the entropy scalar.
    ///
    /// A failure leaves the in-memory state untouched and authoritative.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        PersistedState::capture(self).write_to(path.as_ref())
    }

    /// Restores a snapshot with an OS-seeded RNG.
    pub fn load(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        Self::load_with_rng(path, config, StdRng::from_os_rng())
    }

    /// Restores a snapshot.
    ///
    /// `PersistenceNotFound` when the file is absent, `PersistenceCorrupt`
    /// when it cannot be read or is not a JSON object. Individual bad
    /// fields never fail the load.
    pub fn load_with_rng(path: impl AsRef<Path>, config: EngineConfig, rng: StdRng) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NexarionError::PersistenceNotFound {
                path: path.to_path_buf(),
            });
        }

        let corrupt = |message: String| NexarionError::PersistenceCorrupt {
            path: path.to_path_buf(),
            message: Arc::new(message),
        };

        let content = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let document: Value = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
        let state = restore(&document, path, config, rng)?;

        info!(
            "Loaded emotional state from {:?}: {} impulses, {} memories",
            path,
            state.impulses.len(),
            state.memory.len()
        );
        Ok(state)
    }

    /// Loads, or falls back to a fresh default state on any error.
    pub fn load_or_default(path: impl AsRef<Path>, config: EngineConfig) -> Self {
        Self::load_or_default_with_rng(path, config, StdRng::from_os_rng())
    }

    pub fn load_or_default_with_rng(path: impl AsRef<Path>, config: EngineConfig, rng: StdRng) -> Self {
        let path = path.as_ref();
        match Self::load_with_rng(path, config.clone(), rng.clone()) {
            Ok(state) => state,
            Err(NexarionError::PersistenceNotFound { .. }) => {
                info!("No saved emotional state at {:?}, starting fresh", path);
                Self::with_rng(config, rng)
            }
            Err(e) => {
                warn!("{}; starting fresh", e);
                Self::with_rng(config, rng)
            }
        }
    }
}
