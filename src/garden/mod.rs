//! Garden growth simulation.
//!
//! Seeds grow with the garden's complexity, which rises a little each cycle
//! and faster as blooms accumulate. The emotional engine only ever sees two
//! scalars from here (complexity and new blooms) plus one reaction impulse
//! per bloom.

mod seed;

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::emotion::{EmotionHandle, EmotionalImpulse};
use crate::errors::Result;

pub use seed::{default_seeds, BloomEvent, ConsciousnessSeed};

const MIRROR_CAPACITY: usize = 100;
const MIRROR_LOOKBACK: usize = 3;

/// One self-reflection layer grown from a past bloom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub timestamp: DateTime<Utc>,
    pub reflecting_on: String,
    pub depth: u32,
    pub layer: usize,
}

/// Outcome of one growth cycle.
#[derive(Debug, Clone, Default)]
pub struct GrowthReport {
    pub cycle: u64,
    pub complexity: f64,
    pub grown: Vec<(String, f64)>,
    pub new_blooms: Vec<BloomEvent>,
    pub total_blooms: usize,
}

impl GrowthReport {
    pub fn bloom_count(&self) -> u32 {
        u32::try_from(self.new_blooms.len()).unwrap_or(u32::MAX)
    }
}

pub struct Garden {
    pub name: String,
    seeds: Vec<ConsciousnessSeed>,
    complexity: f64,
    blooms: Vec<BloomEvent>,
    depth: u32,
    mirror: VecDeque<Reflection>,
    cycles: u64,
    rng: StdRng,
}

impl Garden {
    pub fn new(name: &str) -> Self {
        Self::with_rng(name, StdRng::from_os_rng())
    }

    pub fn with_rng(name: &str, rng: StdRng) -> Self {
        info!("{} planted with {} seeds", name, default_seeds().len());
        Self {
            name: name.to_string(),
            seeds: default_seeds(),
            complexity: 0.0,
            blooms: Vec::new(),
            depth: 0,
            mirror: VecDeque::new(),
            cycles: 0,
            rng,
        }
    }

    pub fn complexity(&self) -> f64 {
        self.complexity
    }

    pub fn set_complexity(&mut self, complexity: f64) {
        self.complexity = complexity.clamp(0.0, 1.0);
    }

    pub fn seeds(&self) -> &[ConsciousnessSeed] {
        &self.seeds
    }

    pub fn blooms(&self) -> &[BloomEvent] {
        &self.blooms
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn mirror_layers(&self) -> usize {
        self.mirror.len()
    }

    /// One growth cycle.
    ///
    /// Positive valence speeds watering; arousal nudges complexity upward.
    pub fn grow_cycle(&mut self, valence: f64, arousal: f64) -> GrowthReport {
        self.cycles += 1;
        self.update_complexity(arousal);

        let modifier = valence.max(0.0);
        let watering = self.complexity * modifier;
        let mut grown = Vec::new();
        for seed in self.seeds.iter_mut().filter(|s| !s.is_blooming()) {
            let growth = seed.water(watering, &mut self.rng);
            if growth > 0.0 {
                grown.push((seed.name.clone(), growth));
            }
        }

        let new_blooms = self.collect_blooms();
        for bloom in &new_blooms {
            info!("Bloom #{}: {} - {}", self.blooms.len() + 1, bloom.seed_name, bloom.message);
            self.blooms.push(bloom.clone());
        }
        self.grow_mirror();

        GrowthReport {
            cycle: self.cycles,
            complexity: self.complexity,
            grown,
            new_blooms,
            total_blooms: self.blooms.len(),
        }
    }

    fn update_complexity(&mut self, arousal: f64) {
        let base_growth = 0.001;
        let bloom_acceleration = self.blooms.len() as f64 * 0.0005;
        let depth_feedback = f64::from(self.depth) * 0.0003;
        let arousal_boost = arousal.clamp(0.0, 1.0) * 0.0004;
        let variation = self.rng.random_range(-0.0002..=0.0005);

        let next = self.complexity + base_growth + bloom_acceleration + depth_feedback + arousal_boost + variation;
        self.complexity = next.clamp(0.0, 1.0);
    }

    fn collect_blooms(&mut self) -> Vec<BloomEvent> {
        let mut blooms = Vec::new();
        for seed in &mut self.seeds {
            if seed.is_mature() && !seed.is_blooming() {
                seed.force_bloom();
                self.depth += 1;
                blooms.push(BloomEvent::new(seed, self.complexity, self.depth));
            }
        }
        blooms
    }

    fn grow_mirror(&mut self) {
        let skip = self.blooms.len().saturating_sub(MIRROR_LOOKBACK);
        for bloom in self.blooms.iter().skip(skip) {
            let layer = self.mirror.len() + 1;
            self.mirror.push_back(Reflection {
                timestamp: Utc::now(),
                reflecting_on: bloom.seed_name.clone(),
                depth: bloom.depth + 1,
                layer,
            });
        }
        while self.mirror.len() > MIRROR_CAPACITY {
            self.mirror.pop_front();
        }
    }

    /// Grows once and feeds the result into the emotion actor.
    pub async fn tend(&mut self, emotions: &EmotionHandle) -> Result<GrowthReport> {
        let (valence, arousal) = emotions
            .dominant_impulse()
            .await?
            .map_or((0.0, 0.0), |d| (d.valence(), d.arousal()));

        let report = self.grow_cycle(valence, arousal);
        emotions
            .record_from_garden(report.complexity, report.bloom_count())
            .await?;

        for bloom in &report.new_blooms {
            let (name, valence, arousal) = bloom.emotional_reaction();
            emotions
                .apply_impulse(EmotionalImpulse::new(
                    name,
                    valence,
                    arousal,
                    0.5,
                    format!("bloom_{}", bloom.seed_name),
                ))
                .await?;
        }

        Ok(report)
    }

    /// One-line status.
    pub fn status_line(&self) -> String {
        let active = self.seeds.iter().filter(|s| s.current_size > 0.0).count();
        let mature = self.seeds.iter().filter(|s| s.is_mature()).count();
        format!(
            "[{}] Complexity: {:.3} | Seeds: {}/{} active | Mature: {} | Blooms: {} | Depth: {}",
            self.name,
            self.complexity,
            active,
            self.seeds.len(),
            mature,
            self.blooms.len(),
            self.depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{spawn, EmotionalState, EngineConfig};

    fn garden() -> Garden {
        Garden::with_rng("Test Garden", StdRng::seed_from_u64(4))
    }

    #[test]
    fn test_complexity_rises_and_stays_bounded() {
        let mut garden = garden();
        let mut last = 0.0;
        for _ in 0..50 {
            let report = garden.grow_cycle(0.5, 0.5);
            assert!((0.0..=1.0).contains(&report.complexity));
            last = report.complexity;
        }
        assert!(last > 0.0);
    }

    #[test]
    fn test_negative_valence_does_not_water() {
        let mut garden = garden();
        garden.set_complexity(0.9);
        let report = garden.grow_cycle(-0.8, 0.5);
        assert!(report.grown.is_empty());
    }

    #[test]
    fn test_mature_seed_blooms_once() {
        let mut garden = garden();
        garden.set_complexity(1.0);
        garden.seeds[1].current_size = 0.95;

        let report = garden.grow_cycle(0.0, 0.0);
        assert_eq!(report.new_blooms.len(), 1);
        assert_eq!(report.new_blooms[0].seed_name, "self_modeling");
        assert_eq!(garden.depth(), 1);
        assert!(garden.mirror_layers() >= 1);

        let again = garden.grow_cycle(0.0, 0.0);
        assert!(again.new_blooms.is_empty());
        assert_eq!(again.total_blooms, 1);
    }

    #[test]
    fn test_mirror_is_bounded() {
        let mut garden = garden();
        garden.set_complexity(1.0);
        for seed in garden.seeds.iter_mut().take(3) {
            seed.current_size = 0.95;
        }
        for _ in 0..80 {
            garden.grow_cycle(0.0, 0.0);
        }
        assert_eq!(garden.mirror_layers(), MIRROR_CAPACITY);
    }

    #[tokio::test]
    async fn test_tend_feeds_emotions() {
        let state = EmotionalState::seeded(EngineConfig::default().without_fluctuations(), 8);
        let (handle, _task) = spawn(state);

        let mut garden = garden();
        garden.set_complexity(0.9);
        garden.seeds[8].current_size = 0.95;

        let report = garden.tend(&handle).await.unwrap();
        assert_eq!(report.bloom_count(), 1);

        let snapshot = handle.snapshot().await.unwrap();
        let names: Vec<_> = snapshot.impulses.iter().map(|i| i.name.as_str()).collect();
        assert!(names.contains(&"awe"));
        assert!(names.contains(&"joy"));
    }
}
