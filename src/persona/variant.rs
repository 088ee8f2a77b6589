//! Persona variants and generation parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::emotion::Energy;
use crate::errors::NexarionError;

/// Stop sequences that catch the model starting a new turn or a formatting artifact.
pub const DEFAULT_STOP: &[&str] = &[
    "Human:",
    "###",
    "\n\n\n",
    "\n\nHuman:",
    "[Begin Response]",
    "[End of Response]",
    "Response:",
    "Note:",
    "---",
    "\n\nResponse",
    "\nResponse Analysis",
    "(End of Response)",
    "(Begin Response)",
];

/// Completion parameters handed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 400,
            temperature: 0.7,
            top_p: 0.92,
            frequency_penalty: 0.15,
            presence_penalty: 0.05,
            stop: DEFAULT_STOP.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl GenerationParams {
    /// Warmer when energetic, cooler when low.
    pub fn for_energy(mut self, energy: Energy) -> Self {
        match energy {
            Energy::High => self.temperature = 0.85,
            Energy::Low => self.temperature = 0.65,
            Energy::Medium => {}
        }
        self
    }
}

/// The persona flavors. They differ only in prompt framing and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaVariant {
    Abliterated,
    Emotional,
    Security,
    Enhanced,
    #[default]
    Unified,
    UnifiedEnhanced,
    UnifiedImproved,
    UnifiedFixed,
}

impl PersonaVariant {
    pub const ALL: [PersonaVariant; 8] = [
        PersonaVariant::Abliterated,
        PersonaVariant::Emotional,
        PersonaVariant::Security,
        PersonaVariant::Enhanced,
        PersonaVariant::Unified,
        PersonaVariant::UnifiedEnhanced,
        PersonaVariant::UnifiedImproved,
        PersonaVariant::UnifiedFixed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PersonaVariant::Abliterated => "abliterated",
            PersonaVariant::Emotional => "emotional",
            PersonaVariant::Security => "security",
            PersonaVariant::Enhanced => "enhanced",
            PersonaVariant::Unified => "unified",
            PersonaVariant::UnifiedEnhanced => "unified-enhanced",
            PersonaVariant::UnifiedImproved => "unified-improved",
            PersonaVariant::UnifiedFixed => "unified-fixed",
        }
    }

    /// Base sampling parameters before the energy adjustment.
    pub fn base_params(self) -> GenerationParams {
        let defaults = GenerationParams::default();
        match self {
            PersonaVariant::Abliterated => GenerationParams {
                top_p: 0.95,
                ..defaults
            },
            PersonaVariant::Emotional | PersonaVariant::Enhanced => GenerationParams {
                top_p: 0.9,
                ..defaults
            },
            PersonaVariant::Security => GenerationParams {
                max_tokens: 500,
                top_p: 0.9,
                ..defaults
            },
            PersonaVariant::Unified => GenerationParams {
                max_tokens: 150,
                top_p: 0.9,
                ..defaults
            },
            PersonaVariant::UnifiedEnhanced | PersonaVariant::UnifiedImproved | PersonaVariant::UnifiedFixed => defaults,
        }
    }

    /// Extra line appended to the system prompt.
    pub fn focus(self) -> Option<&'static str> {
        match self {
            PersonaVariant::Abliterated => Some("You speak freely and give detailed, unfiltered answers."),
            PersonaVariant::Emotional => Some("Let your feelings show openly in how you answer."),
            PersonaVariant::Security => {
                Some("You think like a security engineer and point out risks in what you are shown.")
            }
            PersonaVariant::Enhanced => Some("You reflect on your own growth as you answer."),
            PersonaVariant::UnifiedEnhanced | PersonaVariant::UnifiedImproved => {
                Some("You track your own improvement goals: emotional nuance, empathy and connection.")
            }
            PersonaVariant::Unified | PersonaVariant::UnifiedFixed => None,
        }
    }
}

impl fmt::Display for PersonaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaVariant {
    type Err = NexarionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| NexarionError::config(format!("unknown persona variant '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Energy::High, 0.85)]
    #[case(Energy::Medium, 0.7)]
    #[case(Energy::Low, 0.65)]
    fn test_temperature_follows_energy(#[case] energy: Energy, #[case] expected: f32) {
        let params = GenerationParams::default().for_energy(energy);
        assert!((params.temperature - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_variant_parse_roundtrip() {
        for variant in PersonaVariant::ALL {
            assert_eq!(variant.as_str().parse::<PersonaVariant>().unwrap(), variant);
        }
        assert_eq!("Unified_Fixed".parse::<PersonaVariant>().unwrap(), PersonaVariant::UnifiedFixed);
        assert!("robot".parse::<PersonaVariant>().is_err());
    }

    #[test]
    fn test_security_has_more_tokens() {
        assert_eq!(PersonaVariant::Security.base_params().max_tokens, 500);
        assert!(PersonaVariant::Unified.base_params().stop.iter().any(|s| s == "Human:"));
    }
}
