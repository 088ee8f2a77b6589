//! Emotional memory.
//!
//! FIFO history of dominant impulses. Only used to derive a slow-moving mood bias.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::impulse::{clamp_signed, clamp_unit, EmotionalImpulse};
use super::persistence::epoch_seconds;

/// One recorded dominant impulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub valence: f64,
    #[serde(default)]
    pub arousal: f64,
    #[serde(default)]
    pub source: String,
    /// Creation time of the recorded impulse, seconds since the epoch
    #[serde(default)]
    pub time: f64,
}

impl HistoryEntry {
    /// Same entry with valence and arousal clamped into range.
    pub fn sanitized(mut self) -> Self {
        self.valence = clamp_signed(self.valence);
        self.arousal = clamp_unit(self.arousal);
        if !self.time.is_finite() {
            self.time = 0.0;
        }
        self
    }
}

impl From<&EmotionalImpulse> for HistoryEntry {
    fn from(impulse: &EmotionalImpulse) -> Self {
        Self {
            name: impulse.name().to_string(),
            valence: impulse.valence(),
            arousal: impulse.arousal(),
            source: impulse.source().to_string(),
            time: epoch_seconds(impulse.created_at()),
        }
    }
}

/// Bounded history of dominant impulses.
#[derive(Debug, Clone)]
pub struct EmotionalMemory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    memory_weight: f64,
    window: usize,
}

impl EmotionalMemory {
    pub fn new(capacity: usize, memory_weight: f64, window: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            memory_weight,
            window: window.max(1),
        }
    }

    /// Appends an entry, evicting the oldest on overflow.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Mean valence of the last `window` entries, scaled by the memory weight.
    pub fn mood_bias(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let recent = self.recent(self.window);
        let total: f64 = recent.iter().map(|e| e.valence).sum();
        (total / recent.len() as f64) * self.memory_weight
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
