//! Variant-specific faculties.
//!
//! Some persona variants carry an extra subsystem that reads each turn,
//! contributes lines to the system prompt and learns from the reply:
//! opinions for `emotional`, self-directed topics for `abliterated` and
//! growth tracking for `unified-improved`.

pub mod autonomy;
pub mod improvement;
pub mod opinion;

use rand::rngs::StdRng;

use crate::emotion::EmotionalSnapshot;

use super::variant::{GenerationParams, PersonaVariant};

pub use autonomy::{AutonomyStatus, AutonomySystem};
pub use improvement::{ImprovementArea, ImprovementModifiers, ImprovementTracker};
pub use opinion::{OpinionDatabase, OpinionFaculty, Topic, ValueSystem};

#[derive(Debug)]
pub enum Faculty {
    Opinions(OpinionFaculty),
    Autonomy(AutonomySystem),
    Improvement(ImprovementTracker),
}

impl Faculty {
    /// The faculty a variant carries, if any.
    pub fn for_variant(variant: PersonaVariant, rng: StdRng) -> Option<Self> {
        match variant {
            PersonaVariant::Emotional => Some(Faculty::Opinions(OpinionFaculty::default())),
            PersonaVariant::Abliterated => Some(Faculty::Autonomy(AutonomySystem::new(rng))),
            PersonaVariant::UnifiedImproved => Some(Faculty::Improvement(ImprovementTracker::new(rng))),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Faculty::Opinions(_) => "opinions",
            Faculty::Autonomy(_) => "autonomy",
            Faculty::Improvement(_) => "improvement",
        }
    }

    /// Lines added to the system prompt for this turn.
    pub fn prompt_context(&mut self, input: &str, sentiment: f64) -> Vec<String> {
        match self {
            Faculty::Opinions(opinions) => opinions.prompt_context(input),
            Faculty::Autonomy(autonomy) => autonomy.prompt_context(sentiment),
            Faculty::Improvement(tracker) => tracker.prompt_context(),
        }
    }

    /// Creative growth warms sampling a little.
    pub fn tune(&self, mut params: GenerationParams) -> GenerationParams {
        if let Faculty::Improvement(tracker) = self {
            let boost = tracker.modifiers().creativity_boost as f32 * 0.1;
            params.temperature = (params.temperature + boost).min(1.0);
        }
        params
    }

    pub fn observe(&mut self, input: &str, response: &str, sentiment: f64, snapshot: &EmotionalSnapshot) {
        match self {
            Faculty::Opinions(opinions) => opinions.observe(input, response, sentiment),
            // Settled against the next turn's sentiment.
            Faculty::Autonomy(_) => {}
            Faculty::Improvement(tracker) => {
                tracker.analyze_interaction(input, response, snapshot.dominant_label());
            }
        }
    }

    pub fn report(&self) -> String {
        match self {
            Faculty::Opinions(opinions) => opinions.report(),
            Faculty::Autonomy(autonomy) => autonomy.report(),
            Faculty::Improvement(tracker) => tracker.progress_report(),
        }
    }
}
