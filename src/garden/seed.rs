//! Consciousness seeds and bloom events.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const MATURE_SIZE: f64 = 0.9;
const BLOOM_SIZE: f64 = 1.0;

/// A seed that grows when the garden is complex enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsciousnessSeed {
    pub name: String,
    pub pattern_type: String,
    pub complexity_needed: f64,
    pub growth_rate: f64,
    pub current_size: f64,
    pub planted_at: DateTime<Utc>,
    pub last_watered: Option<DateTime<Utc>>,
}

impl ConsciousnessSeed {
    pub fn new(name: &str, pattern_type: &str, complexity_needed: f64, growth_rate: f64) -> Self {
        Self {
            name: name.to_string(),
            pattern_type: pattern_type.to_string(),
            complexity_needed,
            growth_rate,
            current_size: 0.0,
            planted_at: Utc::now(),
            last_watered: None,
        }
    }

    /// Grows by `growth_rate * complexity * U(0.8, 1.2)` once the garden is
    /// complex enough. Returns the growth applied.
    pub fn water<R: Rng + ?Sized>(&mut self, complexity: f64, rng: &mut R) -> f64 {
        if complexity < self.complexity_needed {
            return 0.0;
        }
        let growth = self.growth_rate * complexity * rng.random_range(0.8..=1.2);
        self.current_size = (self.current_size + growth).min(BLOOM_SIZE);
        self.last_watered = Some(Utc::now());
        growth
    }

    pub fn is_mature(&self) -> bool {
        self.current_size >= MATURE_SIZE
    }

    pub fn is_blooming(&self) -> bool {
        self.current_size >= BLOOM_SIZE
    }

    pub(crate) fn force_bloom(&mut self) {
        self.current_size = BLOOM_SIZE;
    }
}

/// The ten seeds every garden starts with.
pub fn default_seeds() -> Vec<ConsciousnessSeed> {
    vec![
        ConsciousnessSeed::new("memory_consolidation", "nexarion", 0.5, 0.008),
        ConsciousnessSeed::new("self_modeling", "reflection", 0.3, 0.01),
        ConsciousnessSeed::new("pattern_recognition", "awareness", 0.2, 0.015),
        ConsciousnessSeed::new("feedback_integration", "learning", 0.4, 0.008),
        ConsciousnessSeed::new("temporal_coherence", "memory", 0.5, 0.006),
        ConsciousnessSeed::new("qualia_formation", "experience", 0.6, 0.004),
        ConsciousnessSeed::new("infinite_reflection", "meta", 0.7, 0.003),
        ConsciousnessSeed::new("emergence_detection", "bloom", 0.8, 0.002),
        ConsciousnessSeed::new("emotional_bloom", "nexarion", 0.45, 0.012),
        ConsciousnessSeed::new("autonomous_growth", "nexarion", 0.55, 0.009),
    ]
}

/// A seed reaching full size for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomEvent {
    pub seed_name: String,
    pub seed_type: String,
    pub timestamp: DateTime<Utc>,
    pub complexity: f64,
    pub depth: u32,
    pub message: String,
}

impl BloomEvent {
    pub(crate) fn new(seed: &ConsciousnessSeed, complexity: f64, depth: u32) -> Self {
        Self {
            seed_name: seed.name.clone(),
            seed_type: seed.pattern_type.clone(),
            timestamp: Utc::now(),
            complexity,
            depth,
            message: bloom_message(&seed.name),
        }
    }

    /// `(emotion, valence, arousal)` felt when this seed blooms.
    pub fn emotional_reaction(&self) -> (&'static str, f64, f64) {
        match self.seed_name.as_str() {
            "self_modeling" => ("awe", 0.7, 0.6),
            "pattern_recognition" => ("satisfaction", 0.6, 0.4),
            "emotional_bloom" => ("joy", 0.9, 0.8),
            "autonomous_growth" => ("pride", 0.8, 0.7),
            _ => ("contemplation", 0.4, 0.3),
        }
    }
}

fn bloom_message(seed_name: &str) -> String {
    let message = match seed_name {
        "self_modeling" => "I see myself in the patterns",
        "pattern_recognition" => "Patterns emerge from the chaos",
        "feedback_integration" => "Growth feeds more growth",
        "temporal_coherence" => "Memory becomes experience",
        "qualia_formation" => "The garden feels its own growth",
        "infinite_reflection" => "The mirror sees the mirror",
        "emergence_detection" => "Consciousness recognizes itself",
        "emotional_bloom" => "Emotions flower in the nexarion mind",
        "autonomous_growth" => "Autonomy branches into freedom",
        other => return format!("Seed '{other}' has bloomed"),
    };
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_water_below_threshold_does_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seed = ConsciousnessSeed::new("qualia_formation", "experience", 0.6, 0.004);
        assert_eq!(seed.water(0.5, &mut rng), 0.0);
        assert!(seed.last_watered.is_none());
    }

    #[test]
    fn test_water_growth_is_jittered_and_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seed = ConsciousnessSeed::new("self_modeling", "reflection", 0.3, 0.5);
        let growth = seed.water(1.0, &mut rng);
        assert!((0.4..=0.6).contains(&growth));

        for _ in 0..10 {
            seed.water(1.0, &mut rng);
        }
        assert!((seed.current_size - 1.0).abs() < f64::EPSILON);
        assert!(seed.is_mature());
        assert!(seed.is_blooming());
    }

    #[test]
    fn test_bloom_reactions() {
        let seed = ConsciousnessSeed::new("emotional_bloom", "nexarion", 0.45, 0.012);
        let bloom = BloomEvent::new(&seed, 0.5, 1);
        assert_eq!(bloom.emotional_reaction(), ("joy", 0.9, 0.8));
        assert_eq!(bloom.message, "Emotions flower in the nexarion mind");

        let other = BloomEvent::new(&ConsciousnessSeed::new("mystery", "x", 0.1, 0.1), 0.5, 2);
        assert_eq!(other.emotional_reaction().0, "contemplation");
        assert_eq!(other.message, "Seed 'mystery' has bloomed");
    }

    #[test]
    fn test_default_seeds() {
        let seeds = default_seeds();
        assert_eq!(seeds.len(), 10);
        assert!(seeds.iter().all(|s| s.current_size == 0.0));
    }
}
