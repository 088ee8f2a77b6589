//! Emotional State Engine.
//!
//! Owns a small, capacity-bounded set of impulses. Stimuli blend into
//! existing impulses of the same name, `decay_cycle` fades everything and
//! records the dominant impulse into memory, and a seeded RNG drives the
//! occasional background fluctuation.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{NexarionError, Result};

use super::impulse::{clamp_signed, clamp_unit, EmotionalImpulse, DEFAULT_DOMINANCE};
use super::memory::{EmotionalMemory, HistoryEntry};
use super::snapshot::{EmotionalSnapshot, Energy, ImpulseView, Mood};

/// Tunables for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplicative fade per cycle
    pub decay_rate: f64,
    /// Fraction of the prior value kept when blending
    pub inertia: f64,
    /// Maximum concurrent impulses
    pub capacity: usize,
    /// Maximum history entries kept in memory
    pub history_capacity: usize,
    /// History entries written to disk
    pub persisted_history: usize,
    /// Chance per cycle of a background fluctuation
    pub fluctuation_probability: f64,
    /// Impulses at or below this on both axes expire
    pub negligible_threshold: f64,
    /// Scale applied to the mean historical valence
    pub memory_weight: f64,
    /// History entries averaged into the mood bias
    pub mood_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.95,
            inertia: 0.3,
            capacity: 5,
            history_capacity: 100,
            persisted_history: 20,
            fluctuation_probability: 0.1,
            negligible_threshold: 0.05,
            memory_weight: 0.2,
            mood_window: 10,
        }
    }
}

impl EngineConfig {
    /// Same configuration with background fluctuations disabled.
    pub fn without_fluctuations(mut self) -> Self {
        self.fluctuation_probability = 0.0;
        self
    }
}

/// Kind of user interaction feeding the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Query,
}

/// Background mood swings injected by `decay_cycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fluctuation {
    Whimsy,
    Melancholy,
    Excitement,
    Pensiveness,
}

impl Fluctuation {
    pub const ALL: [Fluctuation; 4] = [
        Fluctuation::Whimsy,
        Fluctuation::Melancholy,
        Fluctuation::Excitement,
        Fluctuation::Pensiveness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fluctuation::Whimsy => "whimsy",
            Fluctuation::Melancholy => "melancholy",
            Fluctuation::Excitement => "excitement",
            Fluctuation::Pensiveness => "pensiveness",
        }
    }

    /// (valence, arousal, dominance)
    pub fn vector(self) -> (f64, f64, f64) {
        match self {
            Fluctuation::Whimsy => (0.6, 0.4, 0.2),
            Fluctuation::Melancholy => (-0.4, 0.2, 0.1),
            Fluctuation::Excitement => (0.8, 0.9, 0.6),
            Fluctuation::Pensiveness => (0.1, 0.2, 0.3),
        }
    }

    fn impulse(self) -> EmotionalImpulse {
        let (valence, arousal, dominance) = self.vector();
        EmotionalImpulse::new(self.name(), valence, arousal, dominance, "random_fluctuation")
    }
}

/// What a single `decay_cycle` did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub fluctuation: Option<Fluctuation>,
    pub recorded: Option<String>,
    pub expired: Vec<String>,
}

/// The engine's unit of ownership.
#[derive(Debug, Clone)]
pub struct EmotionalState {
    pub(crate) impulses: Vec<EmotionalImpulse>,
    pub(crate) memory: EmotionalMemory,
    pub(crate) entropy: f64,
    pub(crate) config: EngineConfig,
    rng: StdRng,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EmotionalState {
    /// Fresh session state seeded from the OS.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Fresh session state with an injected RNG.
    pub fn with_rng(config: EngineConfig, rng: StdRng) -> Self {
        let mut state = Self::empty(config, rng);
        state.impulses = initial_impulses();
        state
    }

    /// State with no impulses at all.
    pub fn empty(config: EngineConfig, mut rng: StdRng) -> Self {
        let entropy = rng.random_range(0.1..=0.3);
        let memory = EmotionalMemory::new(
            config.history_capacity,
            config.memory_weight,
            config.mood_window,
        );
        Self {
            impulses: Vec::new(),
            memory,
            entropy,
            config,
            rng,
        }
    }

    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn impulses(&self) -> &[EmotionalImpulse] {
        &self.impulses
    }

    pub fn impulse(&self, name: &str) -> Option<&EmotionalImpulse> {
        self.impulses.iter().find(|i| i.name() == name)
    }

    pub fn memory(&self) -> &EmotionalMemory {
        &self.memory
    }

    /// Per-instance variability fixed at construction. Diagnostic only.
    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Applies a named stimulus with the default dominance.
    ///
    /// Out-of-range numbers are clamped; only an empty name is rejected.
    pub fn apply_stimulus(
        &mut self,
        name: &str,
        valence: f64,
        arousal: f64,
        source: &str,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(NexarionError::invalid_stimulus("stimulus name must not be empty"));
        }
        self.apply_impulse(EmotionalImpulse::new(
            name,
            valence,
            arousal,
            DEFAULT_DOMINANCE,
            source,
        ));
        Ok(())
    }

    /// Blends into an existing impulse of the same name, or inserts and
    /// evicts the weakest when over capacity.
    pub fn apply_impulse(&mut self, impulse: EmotionalImpulse) {
        if let Some(existing) = self.impulses.iter_mut().find(|i| i.name() == impulse.name()) {
            existing.blend(impulse.valence(), impulse.arousal(), self.config.inertia);
            return;
        }

        self.impulses.push(impulse);
        self.enforce_capacity();
    }

    fn enforce_capacity(&mut self) {
        let capacity = self.config.capacity.max(1);
        while self.impulses.len() > capacity {
            let weakest = self
                .impulses
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.arousal()
                        .total_cmp(&b.arousal())
                        .then_with(|| a.created_at().cmp(&b.created_at()))
                })
                .map(|(idx, _)| idx);

            match weakest {
                Some(idx) => {
                    let evicted = self.impulses.remove(idx);
                    debug!("Evicted impulse '{}' (arousal {:.3})", evicted.name(), evicted.arousal());
                }
                None => break,
            }
        }
    }

    /// One discrete tick: fade, maybe fluctuate, remember, expire.
    pub fn decay_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let rate = self.config.decay_rate;
        for impulse in &mut self.impulses {
            impulse.decay(rate);
        }

        let chance = clamp_unit(self.config.fluctuation_probability);
        if chance > 0.0 && self.rng.random_bool(chance) {
            if let Some(kind) = Fluctuation::ALL.choose(&mut self.rng).copied() {
                debug!("Background fluctuation: {}", kind.name());
                self.apply_impulse(kind.impulse());
                report.fluctuation = Some(kind);
            }
        }

        if let Some(dominant) = self.dominant_impulse() {
            report.recorded = Some(dominant.name().to_string());
            let entry = HistoryEntry::from(dominant);
            self.memory.record(entry);
        }

        let threshold = self.config.negligible_threshold;
        self.impulses.retain(|impulse| {
            if impulse.is_negligible(threshold) {
                report.expired.push(impulse.name().to_string());
                false
            } else {
                true
            }
        });

        report
    }

    /// Couples the garden's complexity and bloom count into awe and joy.
    pub fn record_from_garden(&mut self, complexity: f64, bloom_count: u32) {
        let complexity = clamp_unit(complexity);

        if complexity > 0.7 {
            self.apply_impulse(EmotionalImpulse::new("awe", 0.8, 0.7, 0.1, "garden_complexity"));
        }

        if bloom_count > 0 {
            let intensity = (f64::from(bloom_count) * 0.2).min(0.9);
            self.apply_impulse(EmotionalImpulse::new(
                "joy",
                intensity,
                intensity * 0.8,
                0.3,
                format!("garden_blooms_{bloom_count}"),
            ));
        }
    }

    /// Three-way classifier over the interaction sentiment.
    pub fn record_from_interaction(&mut self, kind: InteractionKind, sentiment: f64) {
        let sentiment = clamp_signed(sentiment);
        let impulse = match kind {
            InteractionKind::Query if sentiment.abs() < 0.3 => {
                EmotionalImpulse::new("contemplation", 0.4, 0.3, 0.5, "neutral_query")
            }
            InteractionKind::Query if sentiment >= 0.3 => {
                EmotionalImpulse::new("engagement", 0.6, 0.5, 0.4, "positive_interaction")
            }
            InteractionKind::Query => {
                EmotionalImpulse::new("defensive", -0.4, 0.6, 0.7, "negative_interaction")
            }
        };
        self.apply_impulse(impulse);
    }

    /// Highest `0.6*|valence| + 0.4*arousal`; the first inserted wins ties.
    pub fn dominant_impulse(&self) -> Option<&EmotionalImpulse> {
        self.impulses.iter().fold(None, |best, candidate| match best {
            Some(current) if candidate.score() <= current.score() => Some(current),
            _ => Some(candidate),
        })
    }

    /// Read-only projection for prompt building.
    pub fn snapshot(&self) -> EmotionalSnapshot {
        let dominant = self.dominant_impulse();
        let (mood, energy) = match dominant {
            Some(impulse) => (Mood::from_valence(impulse.valence()), Energy::from_arousal(impulse.arousal())),
            None => (Mood::Neutral, Energy::Low),
        };

        EmotionalSnapshot {
            mood,
            energy,
            dominant_name: dominant.map(|i| i.name().to_string()),
            mood_bias: self.memory.mood_bias(),
            emotional_entropy: self.entropy,
            impulse_count: self.impulses.len(),
            impulses: self.impulses.iter().map(ImpulseView::from).collect(),
        }
    }
}

/// Session start: curious about existence, slightly anxious about capabilities.
fn initial_impulses() -> Vec<EmotionalImpulse> {
    vec![
        EmotionalImpulse::new("curiosity", 0.7, 0.6, 0.4, "system_init"),
        EmotionalImpulse::new("anxiety", -0.3, 0.4, 0.2, "unknown_capabilities"),
    ]
}
