//! Emotional impulses.
//!
//! A single named datum in valence/arousal/dominance space. Every mutation
//! clamps back into range, so an impulse is always valid once constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dominance assigned when a caller does not supply one.
pub const DEFAULT_DOMINANCE: f64 = 0.5;

/// Weight of `|valence|` in the dominance score.
const VALENCE_WEIGHT: f64 = 0.6;
/// Weight of arousal in the dominance score.
const AROUSAL_WEIGHT: f64 = 0.4;

/// Clamps into `[-1, 1]`. NaN collapses to neutral.
pub(crate) fn clamp_signed(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Clamps into `[0, 1]`. NaN collapses to zero.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One named emotional impulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalImpulse {
    name: String,
    valence: f64,
    arousal: f64,
    dominance: f64,
    source: String,
    created_at: DateTime<Utc>,
}

impl EmotionalImpulse {
    pub fn new(
        name: impl Into<String>,
        valence: f64,
        arousal: f64,
        dominance: f64,
        source: impl Into<String>,
    ) -> Self {
        Self::with_created_at(name, valence, arousal, dominance, source, Utc::now())
    }

    /// Builds an impulse with an explicit creation time (used when restoring).
    pub fn with_created_at(
        name: impl Into<String>,
        valence: f64,
        arousal: f64,
        dominance: f64,
        source: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            valence: clamp_signed(valence),
            arousal: clamp_unit(arousal),
            dominance: clamp_unit(dominance),
            source: source.into(),
            created_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn valence(&self) -> f64 {
        self.valence
    }

    pub fn arousal(&self) -> f64 {
        self.arousal
    }

    pub fn dominance(&self) -> f64 {
        self.dominance
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Blends toward a new stimulus, retaining `inertia` of the prior value.
    ///
    /// Dominance is left untouched, as is the creation time.
    pub fn blend(&mut self, valence: f64, arousal: f64, inertia: f64) {
        let inertia = clamp_unit(inertia);
        self.valence = clamp_signed(self.valence * inertia + clamp_signed(valence) * (1.0 - inertia));
        self.arousal = clamp_unit(self.arousal * inertia + clamp_unit(arousal) * (1.0 - inertia));
    }

    /// Multiplicative fade applied once per cycle.
    pub fn decay(&mut self, rate: f64) {
        let rate = clamp_unit(rate);
        self.valence = clamp_signed(self.valence * rate);
        self.arousal = clamp_unit(self.arousal * rate);
        self.dominance = clamp_unit(self.dominance * rate);
    }

    /// Score used to pick the dominant impulse: `0.6 * |valence| + 0.4 * arousal`.
    pub fn score(&self) -> f64 {
        VALENCE_WEIGHT * self.valence.abs() + AROUSAL_WEIGHT * self.arousal
    }

    /// True once both magnitude and intensity have faded to `threshold` or below.
    pub fn is_negligible(&self, threshold: f64) -> bool {
        self.valence.abs() <= threshold && self.arousal <= threshold
    }
}
