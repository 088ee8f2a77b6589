//! Read-only projection of the emotional state handed to prompt builders.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::impulse::EmotionalImpulse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

impl Mood {
    /// Sign of the dominant valence. Zero counts as negative.
    pub fn from_valence(valence: f64) -> Self {
        if valence > 0.0 {
            Mood::Positive
        } else {
            Mood::Negative
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Negative => "negative",
            Mood::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Energy {
    High,
    Medium,
    Low,
}

impl Energy {
    /// `> 0.6` high, `> 0.3` medium, otherwise low.
    pub fn from_arousal(arousal: f64) -> Self {
        if arousal > 0.6 {
            Energy::High
        } else if arousal > 0.3 {
            Energy::Medium
        } else {
            Energy::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Energy::High => "high",
            Energy::Medium => "medium",
            Energy::Low => "low",
        }
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impulse fields exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseView {
    pub name: String,
    pub valence: f64,
    pub arousal: f64,
    pub source: String,
}

impl From<&EmotionalImpulse> for ImpulseView {
    fn from(impulse: &EmotionalImpulse) -> Self {
        Self {
            name: impulse.name().to_string(),
            valence: impulse.valence(),
            arousal: impulse.arousal(),
            source: impulse.source().to_string(),
        }
    }
}

/// Snapshot of the emotional state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalSnapshot {
    pub mood: Mood,
    pub energy: Energy,
    /// `None` when no impulse is active
    pub dominant_name: Option<String>,
    pub mood_bias: f64,
    pub emotional_entropy: f64,
    pub impulse_count: usize,
    pub impulses: Vec<ImpulseView>,
}

impl EmotionalSnapshot {
    /// Dominant impulse name, or "neutral" when the set is empty.
    pub fn dominant_label(&self) -> &str {
        self.dominant_name.as_deref().unwrap_or("neutral")
    }

    /// True when nothing would color a response.
    pub fn is_flat(&self) -> bool {
        self.mood == Mood::Neutral && self.energy == Energy::Low
    }
}
