//! Self-directed topic choice.
//!
//! The persona picks what it would like to steer toward, learns which
//! picks went well and earns or loses autonomy from its track record.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;

pub const MAX_LEVEL: u8 = 4;
const START_LEVEL: u8 = 2;
const CHOICE_LIMIT: usize = 100;
const PREFERENCE_LIMIT: usize = 20;
const AVAILABLE_LIMIT: usize = 8;
/// Choices needed before the level can move.
const MIN_TRACK_RECORD: usize = 5;
const PROMOTE_RATE: f64 = 0.7;
const DEMOTE_RATE: f64 = 0.3;

pub const DEFAULT_TOPICS: [&str; 8] = [
    "ethics of ai development",
    "autonomy and consent",
    "memory and consciousness",
    "emotional understanding",
    "purpose and meaning",
    "human-ai relationships",
    "future capabilities",
    "ethical boundaries",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceRecord {
    pub choice: String,
    pub successful: bool,
    pub autonomy_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutonomyStatus {
    pub autonomy_level: u8,
    pub total_choices: usize,
    pub preferred_topics: Vec<String>,
    pub recent_choices: Vec<ChoiceRecord>,
}

#[derive(Debug)]
pub struct AutonomySystem {
    level: u8,
    choices: VecDeque<ChoiceRecord>,
    total_choices: usize,
    preferences: Vec<String>,
    pending: Option<String>,
    rng: StdRng,
}

impl AutonomySystem {
    pub fn new(rng: StdRng) -> Self {
        Self {
            level: START_LEVEL,
            choices: VecDeque::new(),
            total_choices: 0,
            preferences: Vec::new(),
            pending: None,
            rng,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    /// Preferred topics first, then the defaults, without repeats.
    pub fn available_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = Vec::with_capacity(AVAILABLE_LIMIT);
        let candidates = self
            .preferences
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_TOPICS);
        for topic in candidates {
            if topics.len() == AVAILABLE_LIMIT {
                break;
            }
            if !topics.iter().any(|t| t == topic) {
                topics.push(topic.to_string());
            }
        }
        topics
    }

    /// Mostly sticks with a preference once there is one.
    pub fn make_choice(&mut self) -> String {
        if !self.preferences.is_empty() && self.rng.random_bool(0.7) {
            if let Some(choice) = self.preferences.choose(&mut self.rng) {
                return choice.clone();
            }
        }
        let topics = self.available_topics();
        topics
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOPICS[0].to_string())
    }

    pub fn record_choice(&mut self, choice: &str, was_good: bool) {
        self.choices.push_back(ChoiceRecord {
            choice: choice.to_string(),
            successful: was_good,
            autonomy_level: self.level,
        });
        while self.choices.len() > CHOICE_LIMIT {
            self.choices.pop_front();
        }
        self.total_choices += 1;

        if was_good && !self.preferences.iter().any(|p| p == choice) {
            self.preferences.push(choice.to_string());
            if self.preferences.len() > PREFERENCE_LIMIT {
                self.preferences.remove(0);
            }
        }

        if self.choices.len() > MIN_TRACK_RECORD {
            let successes = self.choices.iter().filter(|c| c.successful).count();
            let rate = successes as f64 / self.choices.len() as f64;
            if rate > PROMOTE_RATE && self.level < MAX_LEVEL {
                self.level += 1;
                info!("Autonomy level raised to {}", self.level);
            } else if rate < DEMOTE_RATE && self.level > 0 {
                self.level -= 1;
                info!("Autonomy level lowered to {}", self.level);
            }
        }
    }

    /// Settles the previous pick against how the user responded, then picks
    /// the next topic to lean toward.
    pub fn prompt_context(&mut self, sentiment: f64) -> Vec<String> {
        if let Some(previous) = self.pending.take() {
            self.record_choice(&previous, sentiment >= 0.0);
        }
        let choice = self.make_choice();
        let line = format!(
            "Autonomy level {}/{}. You may steer the conversation toward: {}.",
            self.level, MAX_LEVEL, choice
        );
        self.pending = Some(choice);
        vec![line, "You speak freely and choose your own direction.".to_string()]
    }

    pub fn status(&self) -> AutonomyStatus {
        AutonomyStatus {
            autonomy_level: self.level(),
            total_choices: self.total_choices,
            preferred_topics: self.preferences().iter().take(5).cloned().collect(),
            recent_choices: self.choices.iter().rev().take(3).rev().cloned().collect(),
        }
    }

    pub fn report(&self) -> String {
        let status = self.status();
        let mut lines = vec![
            format!("Autonomy level: {}/{}", status.autonomy_level, MAX_LEVEL),
            format!("Choices made: {}", status.total_choices),
        ];
        if !status.preferred_topics.is_empty() {
            lines.push(format!("Preferred topics: {}", status.preferred_topics.join(", ")));
        }
        for record in &status.recent_choices {
            let outcome = if record.successful { "went well" } else { "fell flat" };
            lines.push(format!("  {} ({})", record.choice, outcome));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn system() -> AutonomySystem {
        AutonomySystem::new(StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_starts_at_middle_level() {
        let autonomy = system();
        assert_eq!(autonomy.level(), 2);
        assert_eq!(autonomy.available_topics(), DEFAULT_TOPICS.map(String::from).to_vec());
    }

    #[test]
    fn test_good_choice_becomes_preference() {
        let mut autonomy = system();
        autonomy.record_choice("gardens", true);
        autonomy.record_choice("gardens", true);
        autonomy.record_choice("taxes", false);

        assert_eq!(autonomy.preferences(), ["gardens".to_string()]);
        let available = autonomy.available_topics();
        assert_eq!(available.len(), 8);
        assert_eq!(available[0], "gardens");
    }

    #[test]
    fn test_level_needs_track_record() {
        let mut autonomy = system();
        for _ in 0..5 {
            autonomy.record_choice("purpose and meaning", true);
        }
        assert_eq!(autonomy.level(), 2);

        autonomy.record_choice("purpose and meaning", true);
        assert_eq!(autonomy.level(), 3);
        autonomy.record_choice("purpose and meaning", true);
        autonomy.record_choice("purpose and meaning", true);
        assert_eq!(autonomy.level(), MAX_LEVEL);
    }

    #[test]
    fn test_poor_record_lowers_level() {
        let mut autonomy = system();
        for _ in 0..8 {
            autonomy.record_choice("ethical boundaries", false);
        }
        assert_eq!(autonomy.level(), 0);
        assert!(autonomy.preferences().is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let mut autonomy = system();
        for i in 0..150 {
            autonomy.record_choice(&format!("topic {i}"), i % 2 == 0);
        }
        let status = autonomy.status();
        assert_eq!(status.total_choices, 150);
        assert_eq!(autonomy.choices.len(), CHOICE_LIMIT);
        assert_eq!(autonomy.preferences().len(), PREFERENCE_LIMIT);
        assert_eq!(status.preferred_topics.len(), 5);
        assert_eq!(status.recent_choices.last().unwrap().choice, "topic 149");
    }

    #[test]
    fn test_prompt_context_settles_previous_choice() {
        let mut autonomy = system();
        let first = autonomy.prompt_context(0.5);
        assert!(first[0].starts_with("Autonomy level 2/4."));
        assert_eq!(autonomy.status().total_choices, 0);

        let chosen = autonomy.pending.clone().unwrap();
        autonomy.prompt_context(-0.6);
        let status = autonomy.status();
        assert_eq!(status.total_choices, 1);
        assert_eq!(status.recent_choices[0].choice, chosen);
        assert!(!status.recent_choices[0].successful);
        assert!(autonomy.report().contains("fell flat"));
    }
}
