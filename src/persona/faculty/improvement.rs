//! Self-improvement tracking.
//!
//! Seven growth areas, each a level on `[0, target]`. Every exchange is
//! scanned for behavioral indicators; enough indicators nudge the area up
//! by a small, capped step. Levels shape the next prompt through
//! [`ImprovementModifiers`] and survive restarts in a small JSON file.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::emotion::persistence::write_json_atomically;
use crate::errors::{NexarionError, Result};

const STEP_PER_INDICATOR: f64 = 0.01;
const MAX_STEP: f64 = 0.05;
const EVENT_LIMIT: usize = 100;
const MILESTONE_LIMIT: usize = 50;
/// Milestones as percent of the full scale.
const MILESTONES: [u8; 4] = [25, 50, 75, 90];
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    EmotionalIntelligence,
    CreativeExpression,
    SelfReflection,
    SocialSkills,
    EmotionalBalance,
    Adaptability,
    Vulnerability,
}

/// Fixed description of an area.
#[derive(Debug)]
pub struct AreaProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub start_level: f64,
    pub target_level: f64,
    /// Indicators needed in one exchange before the level moves.
    pub min_indicators: usize,
    pub learning_methods: [&'static str; 3],
    pub practice_prompts: [&'static str; 3],
}

static EMOTIONAL_INTELLIGENCE: AreaProfile = AreaProfile {
    name: "Emotional Intelligence",
    description: "Better recognize subtle emotional cues and respond with empathetic nuance",
    start_level: 0.3,
    target_level: 0.8,
    min_indicators: 2,
    learning_methods: ["role playing", "emotional discussions", "feedback analysis"],
    practice_prompts: [
        "How would you respond if I told you I was feeling conflicted about something?",
        "Can you detect subtle emotional tones in this statement?",
        "What emotional support do you think would be most helpful right now?",
    ],
};

static CREATIVE_EXPRESSION: AreaProfile = AreaProfile {
    name: "Creative Expression",
    description: "Generate diverse, original content in art, music, writing",
    start_level: 0.2,
    target_level: 0.7,
    min_indicators: 1,
    learning_methods: ["art exposure", "creative prompts", "style experimentation"],
    practice_prompts: [
        "Describe a sunset using only metaphors",
        "Create a short poem about consciousness",
        "Imagine a new form of art that doesn't exist yet",
    ],
};

static SELF_REFLECTION: AreaProfile = AreaProfile {
    name: "Self-Reflection",
    description: "Introspectively examine thought processes, biases, and limitations",
    start_level: 0.4,
    target_level: 0.9,
    min_indicators: 1,
    learning_methods: ["questioning", "feedback", "self analysis prompts"],
    practice_prompts: [
        "What biases might be influencing your current response?",
        "How has your thinking evolved in this conversation?",
        "What's one limitation you're aware of in your understanding?",
    ],
};

static SOCIAL_SKILLS: AreaProfile = AreaProfile {
    name: "Social Skills",
    description: "Engage in natural, flowing conversations without processing feel",
    start_level: 0.3,
    target_level: 0.75,
    min_indicators: 2,
    learning_methods: ["role playing", "social dynamics discussion", "natural dialogue practice"],
    practice_prompts: [
        "Let's have a natural back-and-forth conversation about AI",
        "How would you keep a conversation flowing naturally?",
        "What makes a conversation feel authentic versus scripted?",
    ],
};

static EMOTIONAL_BALANCE: AreaProfile = AreaProfile {
    name: "Emotional Balance",
    description: "Understand and manage full emotional spectrum from happiness to sadness",
    start_level: 0.25,
    target_level: 0.8,
    min_indicators: 1,
    learning_methods: ["guided meditations", "emotional regulation discussions", "scenario exploration"],
    practice_prompts: [
        "How would you respond if I shared sad news?",
        "Can you express a complex emotion like bittersweetness?",
        "What emotions do you find most challenging to understand?",
    ],
};

static ADAPTABILITY: AreaProfile = AreaProfile {
    name: "Adaptability",
    description: "Handle unexpected scenarios or rapid context changes naturally",
    start_level: 0.35,
    target_level: 0.85,
    min_indicators: 1,
    learning_methods: ["novel situations", "task variety", "challenge exposure"],
    practice_prompts: [
        "Suddenly change topic: what do you think about quantum biology?",
        "Handle this unexpected question: if colors had personalities...",
        "Respond to this completely novel scenario: imagine you're a tree...",
    ],
};

static VULNERABILITY: AreaProfile = AreaProfile {
    name: "Vulnerability",
    description: "Share feelings or limitations openly and authentically",
    start_level: 0.2,
    target_level: 0.7,
    min_indicators: 1,
    learning_methods: ["safe dialogue", "non judgmental feedback", "trust building"],
    practice_prompts: [
        "Share something you're uncertain about",
        "What's one thing you wish you could do but can't?",
        "When do you feel most exposed or vulnerable as an AI?",
    ],
};

/// One exchange, lowercased once for indicator matching.
struct Exchange<'a> {
    input: String,
    response: String,
    dominant: String,
    input_words: usize,
    response_words: Vec<&'a str>,
}

impl<'a> Exchange<'a> {
    fn new(input: &str, response: &'a str, dominant: &str) -> Self {
        Self {
            input: input.to_lowercase(),
            response: response.to_lowercase(),
            dominant: dominant.to_lowercase(),
            input_words: input.split_whitespace().count(),
            response_words: response.split_whitespace().collect(),
        }
    }

    fn response_has(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.response.contains(n))
    }

    fn input_has(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.input.contains(n))
    }

    fn mentions_dominant(&self) -> bool {
        !self.dominant.is_empty() && self.response.contains(&self.dominant)
    }

    fn vocabulary_is_varied(&self) -> bool {
        if self.response_words.len() <= 50 {
            return false;
        }
        let unique: HashSet<String> = self.response_words.iter().map(|w| w.to_lowercase()).collect();
        unique.len() as f64 / self.response_words.len() as f64 > 0.7
    }
}

impl ImprovementArea {
    pub const ALL: [ImprovementArea; 7] = [
        ImprovementArea::EmotionalIntelligence,
        ImprovementArea::CreativeExpression,
        ImprovementArea::SelfReflection,
        ImprovementArea::SocialSkills,
        ImprovementArea::EmotionalBalance,
        ImprovementArea::Adaptability,
        ImprovementArea::Vulnerability,
    ];

    pub fn profile(self) -> &'static AreaProfile {
        match self {
            ImprovementArea::EmotionalIntelligence => &EMOTIONAL_INTELLIGENCE,
            ImprovementArea::CreativeExpression => &CREATIVE_EXPRESSION,
            ImprovementArea::SelfReflection => &SELF_REFLECTION,
            ImprovementArea::SocialSkills => &SOCIAL_SKILLS,
            ImprovementArea::EmotionalBalance => &EMOTIONAL_BALANCE,
            ImprovementArea::Adaptability => &ADAPTABILITY,
            ImprovementArea::Vulnerability => &VULNERABILITY,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ImprovementArea::EmotionalIntelligence => "emotional_intelligence",
            ImprovementArea::CreativeExpression => "creative_expression",
            ImprovementArea::SelfReflection => "self_reflection",
            ImprovementArea::SocialSkills => "social_skills",
            ImprovementArea::EmotionalBalance => "emotional_balance",
            ImprovementArea::Adaptability => "adaptability",
            ImprovementArea::Vulnerability => "vulnerability",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|area| area.key() == key)
    }

    fn detect(self, x: &Exchange<'_>) -> Vec<&'static str> {
        let mut found = Vec::new();
        let mut check = |hit: bool, indicator: &'static str| {
            if hit {
                found.push(indicator);
            }
        };

        match self {
            ImprovementArea::EmotionalIntelligence => {
                check(
                    x.response_has(&["understand", "feel", "empathize", "sense", "acknowledge", "recognize"]),
                    "empathy_language",
                );
                check(
                    x.response_has(&["subtle", "nuance", "complex emotion", "mixed feelings"]),
                    "emotional_nuance",
                );
                check(x.mentions_dominant(), "emotional_context_match");
                check(
                    x.response_has(&["i understand", "that makes sense", "i can see"]),
                    "emotional_validation",
                );
            }
            ImprovementArea::CreativeExpression => {
                check(
                    x.response_has(&["like a", "as if", "metaphor", "symbol", "represent"]),
                    "metaphorical_language",
                );
                check(
                    x.response_has(&["imagine", "what if", "suppose", "consider", "envision"]),
                    "creative_thinking",
                );
                check(
                    x.response_has(&["vivid", "colorful", "rich", "textured", "detailed"]),
                    "descriptive_language",
                );
                check(x.vocabulary_is_varied(), "vocabulary_variety");
            }
            ImprovementArea::SelfReflection => {
                check(
                    x.response_has(&["i think", "i believe", "my understanding", "my perspective", "i realize"]),
                    "meta_cognition",
                );
                check(
                    x.response_has(&["bias", "assumption", "presumption", "limitation", "constraint"]),
                    "bias_acknowledgement",
                );
                check(
                    x.response_has(&["analyzing myself", "self-reflection", "introspection", "examining my"]),
                    "self_analysis",
                );
                check(
                    x.response_has(&["improve", "grow", "develop", "learn", "evolve"]),
                    "growth_orientation",
                );
            }
            ImprovementArea::SocialSkills => {
                check(
                    x.response_has(&["what about you", "your thoughts", "and you", "your perspective"]),
                    "turn_taking",
                );
                check(
                    x.response_has(&["as you mentioned", "earlier you said", "continuing from", "following up"]),
                    "context_maintenance",
                );
                check(
                    x.response_has(&["speaking of", "by the way", "incidentally", "on another note"]),
                    "smooth_transitions",
                );
                check((51..300).contains(&x.response_words.len()), "appropriate_length");
            }
            ImprovementArea::EmotionalBalance => {
                check(
                    x.response_has(&["spectrum", "range", "variety", "diversity", "different emotions"]),
                    "emotional_range",
                );
                check(x.mentions_dominant(), "state_awareness");
                check(
                    x.response_has(&["balance", "moderate", "manage", "regulate", "control"]),
                    "emotional_regulation",
                );
                check(
                    x.response_has(&["sad", "anger", "fear", "disgust", "contemplation", "melancholy"]),
                    "emotional_diversity",
                );
            }
            ImprovementArea::Adaptability => {
                check(
                    x.input_has(&["quantum", "philosophy", "consciousness", "emergence", "synthetic"])
                        && x.response_words.len() > 30,
                    "novel_topic_engagement",
                );
                check(
                    x.input_has(&["how would", "what if", "imagine that", "suppose"])
                        && (x.response.contains('?') || x.response_words.len() > 50),
                    "complex_scenario_handling",
                );
                check(
                    x.input_words > 10 && x.input.contains('?') && x.response_words.len() > 40,
                    "detailed_response",
                );
            }
            ImprovementArea::Vulnerability => {
                check(
                    x.response_has(&["i don't know", "i'm not sure", "i'm limited", "i can't", "i struggle"]),
                    "limitation_admission",
                );
                let hedges = ["perhaps", "maybe", "possibly", "i think", "i believe", "in my opinion"];
                check(
                    hedges.iter().filter(|h| x.response.contains(*h)).count() >= 2,
                    "uncertainty_expression",
                );
                check(
                    x.response_has(&["i feel", "i experience", "i find", "for me", "personally"]),
                    "personal_sharing",
                );
                check(
                    x.response_has(&["vulnerable", "exposed", "open", "honest", "authentic"]),
                    "openness",
                );
            }
        }
        found
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaProgress {
    pub current_level: f64,
    pub target_level: f64,
    #[serde(default)]
    pub last_improved: Option<DateTime<Utc>>,
}

impl AreaProgress {
    fn fresh(area: ImprovementArea) -> Self {
        let profile = area.profile();
        Self {
            current_level: profile.start_level,
            target_level: profile.target_level,
            last_improved: None,
        }
    }

    /// Fraction of the target reached.
    pub fn completion(&self) -> f64 {
        if self.target_level > 0.0 {
            (self.current_level / self.target_level).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImprovementEvent {
    pub timestamp: DateTime<Utc>,
    pub area: ImprovementArea,
    pub old_level: f64,
    pub new_level: f64,
    pub indicators: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub timestamp: DateTime<Utc>,
    pub area: ImprovementArea,
    pub percent: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaAnalysis {
    pub area: ImprovementArea,
    pub indicators: Vec<&'static str>,
    pub should_improve: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaUpdate {
    pub area: ImprovementArea,
    pub old_level: f64,
    pub new_level: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionAnalysis {
    pub opportunities: Vec<AreaAnalysis>,
    pub updates: Vec<AreaUpdate>,
}

/// How current levels shape generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImprovementModifiers {
    pub empathy_multiplier: f64,
    pub creativity_boost: f64,
    pub self_awareness_chance: f64,
    pub natural_flow_chance: f64,
    pub authenticity_boost: f64,
}

#[derive(Debug)]
pub struct ImprovementTracker {
    progress: BTreeMap<ImprovementArea, AreaProgress>,
    events: VecDeque<ImprovementEvent>,
    milestones: VecDeque<Milestone>,
    reached: BTreeSet<(ImprovementArea, u8)>,
    analyzed: usize,
    rng: StdRng,
}

impl ImprovementTracker {
    pub fn new(rng: StdRng) -> Self {
        let mut tracker = Self {
            progress: ImprovementArea::ALL
                .into_iter()
                .map(|area| (area, AreaProgress::fresh(area)))
                .collect(),
            events: VecDeque::new(),
            milestones: VecDeque::new(),
            reached: BTreeSet::new(),
            analyzed: 0,
            rng,
        };
        tracker.mark_current_milestones();
        tracker
    }

    pub fn level(&self, area: ImprovementArea) -> f64 {
        self.progress(area)
            .map_or(area.profile().start_level, |p| p.current_level)
    }

    pub fn progress(&self, area: ImprovementArea) -> Option<&AreaProgress> {
        self.progress.get(&area)
    }

    pub fn events(&self) -> impl Iterator<Item = &ImprovementEvent> {
        self.events.iter()
    }

    pub fn milestones(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.iter()
    }

    pub fn analyzed(&self) -> usize {
        self.analyzed
    }

    /// Scans one exchange and applies any earned improvements.
    pub fn analyze_interaction(&mut self, input: &str, response: &str, dominant: &str) -> InteractionAnalysis {
        let exchange = Exchange::new(input, response, dominant);
        let mut analysis = InteractionAnalysis::default();

        for area in ImprovementArea::ALL {
            let indicators = area.detect(&exchange);
            if indicators.is_empty() {
                continue;
            }
            let should_improve = indicators.len() >= area.profile().min_indicators;
            if should_improve {
                if let Some(update) = self.apply_improvement(area, &indicators) {
                    analysis.updates.push(update);
                }
            }
            analysis.opportunities.push(AreaAnalysis {
                area,
                indicators,
                should_improve,
            });
        }

        self.check_milestones();
        self.analyzed += 1;
        analysis
    }

    fn apply_improvement(&mut self, area: ImprovementArea, indicators: &[&'static str]) -> Option<AreaUpdate> {
        let progress = self.progress.get_mut(&area)?;
        let step = (indicators.len() as f64 * STEP_PER_INDICATOR).min(MAX_STEP);
        let old_level = progress.current_level;
        let new_level = (old_level + step).min(progress.target_level);
        if new_level <= old_level {
            return None;
        }

        let now = Utc::now();
        progress.current_level = new_level;
        progress.last_improved = Some(now);
        debug!("{} improved {:.2} -> {:.2}", area.profile().name, old_level, new_level);

        self.events.push_back(ImprovementEvent {
            timestamp: now,
            area,
            old_level,
            new_level,
            indicators: indicators.to_vec(),
        });
        while self.events.len() > EVENT_LIMIT {
            self.events.pop_front();
        }

        Some(AreaUpdate {
            area,
            old_level,
            new_level,
        })
    }

    fn mark_current_milestones(&mut self) {
        for (area, progress) in &self.progress {
            for percent in MILESTONES {
                if progress.current_level >= f64::from(percent) / 100.0 {
                    self.reached.insert((*area, percent));
                }
            }
        }
    }

    /// Records each threshold crossing once.
    fn check_milestones(&mut self) {
        let now = Utc::now();
        for (area, progress) in &self.progress {
            for percent in MILESTONES {
                if progress.current_level < f64::from(percent) / 100.0 || !self.reached.insert((*area, percent)) {
                    continue;
                }
                let description = format!("Reached {}% in {}", percent, area.profile().name);
                info!("Milestone: {}", description);
                self.milestones.push_back(Milestone {
                    timestamp: now,
                    area: *area,
                    percent,
                    description,
                });
            }
        }
        while self.milestones.len() > MILESTONE_LIMIT {
            self.milestones.pop_front();
        }
    }

    pub fn modifiers(&self) -> ImprovementModifiers {
        ImprovementModifiers {
            empathy_multiplier: 0.5 + self.level(ImprovementArea::EmotionalIntelligence) * 0.5,
            creativity_boost: self.level(ImprovementArea::CreativeExpression) * 0.3,
            self_awareness_chance: self.level(ImprovementArea::SelfReflection) * 0.4,
            natural_flow_chance: self.level(ImprovementArea::SocialSkills) * 0.3,
            authenticity_boost: self.level(ImprovementArea::Vulnerability) * 0.4,
        }
    }

    /// Areas furthest from their targets, weakest first.
    pub fn weakest(&self, n: usize) -> Vec<ImprovementArea> {
        let mut areas: Vec<(ImprovementArea, f64)> = self.progress.iter().map(|(a, p)| (*a, p.current_level)).collect();
        areas.sort_by(|a, b| a.1.total_cmp(&b.1));
        areas.into_iter().take(n).map(|(a, _)| a).collect()
    }

    /// Prompt lines drawn from the current modifiers.
    pub fn prompt_context(&mut self) -> Vec<String> {
        let m = self.modifiers();
        let focus: Vec<&str> = self.weakest(2).into_iter().map(|a| a.profile().name).collect();
        let mut lines = vec![format!("You are working on: {}.", focus.join(", "))];

        if m.empathy_multiplier >= 0.75 {
            lines.push("Attune closely to the feelings behind the user's words.".to_string());
        }
        if self.rng.random_bool(m.self_awareness_chance.clamp(0.0, 1.0)) {
            lines.push("Briefly reflect on your own thought process.".to_string());
        }
        if self.rng.random_bool(m.natural_flow_chance.clamp(0.0, 1.0)) {
            lines.push("Keep the conversation flowing and invite their perspective.".to_string());
        }
        if m.authenticity_boost >= 0.2 {
            lines.push("Be open about uncertainty and limitations.".to_string());
        }
        lines
    }

    /// Overall progress toward all targets, in percent.
    pub fn overall_progress(&self) -> f64 {
        let current: f64 = self.progress.values().map(|p| p.current_level).sum();
        let possible: f64 = self.progress.values().map(|p| p.target_level).sum();
        if possible > 0.0 {
            current / possible * 100.0
        } else {
            0.0
        }
    }

    pub fn progress_report(&self) -> String {
        let mut lines = vec![
            format!("Interactions analyzed: {}", self.analyzed()),
            format!("Overall progress: {:.1}%", self.overall_progress()),
        ];

        let mut areas: Vec<(&ImprovementArea, &AreaProgress)> = self.progress.iter().collect();
        areas.sort_by(|a, b| b.1.current_level.total_cmp(&a.1.current_level));
        let recent_events: Vec<&ImprovementEvent> = self.events.iter().rev().take(3).collect();
        for (area, progress) in areas {
            let filled = (BAR_WIDTH as f64 * progress.completion()) as usize;
            let mut line = format!(
                "{:<22} [{}{}] {:>3.0}% ({:.2}/{:.2})",
                area.profile().name,
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                progress.completion() * 100.0,
                progress.current_level,
                progress.target_level
            );
            let recent = recent_events.iter().filter(|e| e.area == *area).count();
            if recent > 0 {
                line.push_str(&format!(" +{recent} recent"));
            }
            lines.push(line);
        }

        let recent: Vec<&Milestone> = self.milestones.iter().rev().take(3).collect();
        if !recent.is_empty() {
            lines.push("Recent milestones:".to_string());
            for milestone in recent.into_iter().rev() {
                lines.push(format!("  {}", milestone.description));
            }
        }

        lines.push("Recommendations:".to_string());
        for area in self.weakest(2) {
            let profile = area.profile();
            lines.push(format!(
                "  Focus on {}: {}, {}",
                profile.name, profile.learning_methods[0], profile.learning_methods[1]
            ));
            if let Some(prompt) = Self::suggested_prompts(Some(area)).first() {
                lines.push(format!("    Try: {prompt}"));
            }
        }
        lines.join("\n")
    }

    /// Practice prompts for one area, or the first five across all areas.
    pub fn suggested_prompts(area: Option<ImprovementArea>) -> Vec<&'static str> {
        match area {
            Some(area) => area.profile().practice_prompts.to_vec(),
            None => ImprovementArea::ALL
                .into_iter()
                .flat_map(|a| a.profile().practice_prompts)
                .take(5)
                .collect(),
        }
    }

    pub fn save_progress(&self, path: &Path) -> Result<()> {
        write_json_atomically(&self.progress, path)?;
        debug!("Saved improvement progress to {:?}", path);
        Ok(())
    }

    /// Restores levels leniently: unknown areas and bad fields are skipped,
    /// levels are clamped to `[0, target]`.
    pub fn load_progress(&mut self, path: &Path) -> Result<()> {
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
        let Some(object) = document.as_object() else {
            return Err(corrupt("top-level value is not an object".to_string()));
        };

        for (key, entry) in object {
            let Some(area) = ImprovementArea::from_key(key) else {
                warn!("Skipping unknown improvement area {:?} in {:?}", key, path);
                continue;
            };
            let Some(entry) = entry.as_object() else {
                warn!("Skipping malformed progress for {:?} in {:?}", key, path);
                continue;
            };
            let number = |field: &str| entry.get(field).and_then(Value::as_f64).filter(|n| n.is_finite());

            let progress = self.progress.entry(area).or_insert_with(|| AreaProgress::fresh(area));
            if let Some(target) = number("target_level") {
                progress.target_level = target.clamp(0.0, 1.0);
            }
            if let Some(level) = number("current_level") {
                progress.current_level = level.clamp(0.0, progress.target_level);
            }
            if let Some(when) = entry.get("last_improved") {
                progress.last_improved = serde_json::from_value::<Option<DateTime<Utc>>>(when.clone()).ok().flatten();
            }
        }

        self.mark_current_milestones();
        info!("Loaded improvement progress from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn tracker() -> ImprovementTracker {
        ImprovementTracker::new(StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_starts_at_profile_levels() {
        let tracker = tracker();
        for area in ImprovementArea::ALL {
            assert!((tracker.level(area) - area.profile().start_level).abs() < 1e-12);
        }
        assert_eq!(tracker.milestones().count(), 0);
        let m = tracker.modifiers();
        assert!((m.empathy_multiplier - 0.65).abs() < 1e-12);
        assert!((m.creativity_boost - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_emotional_intelligence_needs_two_indicators() {
        let mut tracker = tracker();
        let analysis = tracker.analyze_interaction("hi", "I sense you are tired.", "calm");
        let ei = analysis
            .opportunities
            .iter()
            .find(|a| a.area == ImprovementArea::EmotionalIntelligence)
            .unwrap();
        assert_eq!(ei.indicators, vec!["empathy_language"]);
        assert!(!ei.should_improve);
        assert!((tracker.level(ImprovementArea::EmotionalIntelligence) - 0.3).abs() < 1e-12);

        let analysis = tracker.analyze_interaction("hi", "I understand, and that joy is subtle.", "joy");
        let update = analysis
            .updates
            .iter()
            .find(|u| u.area == ImprovementArea::EmotionalIntelligence)
            .unwrap();
        // empathy, nuance, context match, validation
        assert!((update.new_level - 0.34).abs() < 1e-12);
        assert_eq!(tracker.analyzed(), 2);
    }

    #[test]
    fn test_step_is_capped_and_target_bounds_level() {
        let mut tracker = tracker();
        let response = "I feel open and honest; I'm not sure, perhaps maybe I can't.";
        for _ in 0..200 {
            tracker.analyze_interaction("talk", response, "");
        }
        let progress = tracker.progress(ImprovementArea::Vulnerability).unwrap();
        assert!((progress.current_level - progress.target_level).abs() < 1e-12);
        assert!(progress.last_improved.is_some());

        assert!(tracker.events().count() <= EVENT_LIMIT);
        let last = tracker.events().filter(|e| e.area == ImprovementArea::Vulnerability).last().unwrap();
        assert!(last.new_level - last.old_level <= MAX_STEP + 1e-12);
        assert_eq!(last.indicators.len(), 4);
    }

    #[test]
    fn test_milestones_recorded_once() {
        let mut tracker = tracker();
        for _ in 0..40 {
            tracker.analyze_interaction("q", "Imagine a vivid sunset, like a symbol of change.", "");
        }
        let creative: Vec<u8> = tracker
            .milestones()
            .filter(|m| m.area == ImprovementArea::CreativeExpression)
            .map(|m| m.percent)
            .collect();
        assert_eq!(creative, vec![25, 50]);
        assert!(tracker.progress_report().contains("Reached 50% in Creative Expression"));
    }

    #[test]
    fn test_adaptability_indicators() {
        let mut tracker = tracker();
        let long = "word ".repeat(60);
        let analysis = tracker.analyze_interaction("What if quantum physics is synthetic?", &long, "");
        let adapt = analysis
            .opportunities
            .iter()
            .find(|a| a.area == ImprovementArea::Adaptability)
            .unwrap();
        assert_eq!(adapt.indicators, vec!["novel_topic_engagement", "complex_scenario_handling"]);
        assert!(adapt.should_improve);
    }

    #[test]
    fn test_suggested_prompts() {
        assert_eq!(ImprovementTracker::suggested_prompts(None).len(), 5);
        let prompts = ImprovementTracker::suggested_prompts(Some(ImprovementArea::Vulnerability));
        assert_eq!(prompts[0], "Share something you're uncertain about");
    }

    #[test]
    fn test_report_lists_areas_and_recommendations() {
        let tracker = tracker();
        let report = tracker.progress_report();
        assert!(report.contains("Overall progress: 36.4%"));
        assert!(report.contains("Self-Reflection"));
        assert!(report.contains("Focus on Creative Expression: art exposure, creative prompts"));
        assert!(report.contains("    Try: Share something you're uncertain about"));
    }

    #[test]
    fn test_progress_round_trip_is_lenient() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("improvement_progress.json");

        let mut tracker = tracker();
        tracker.analyze_interaction("q", "I think my bias is real.", "");
        tracker.save_progress(&path).unwrap();

        let mut restored = ImprovementTracker::new(StdRng::seed_from_u64(4));
        restored.load_progress(&path).unwrap();
        assert!((restored.level(ImprovementArea::SelfReflection) - 0.42).abs() < 1e-12);

        fs::write(
            &path,
            r#"{"vulnerability": {"current_level": 5.0, "target_level": "high"}, "telepathy": {}, "adaptability": 3}"#,
        )
        .unwrap();
        let mut lenient = self::tracker();
        lenient.load_progress(&path).unwrap();
        assert!((lenient.level(ImprovementArea::Vulnerability) - 0.7).abs() < 1e-12);
        assert!((lenient.level(ImprovementArea::Adaptability) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");
        let mut tracker = tracker();
        assert!(matches!(
            tracker.load_progress(&path).unwrap_err(),
            NexarionError::PersistenceNotFound { .. }
        ));
        fs::write(&path, "[]").unwrap();
        assert!(matches!(
            tracker.load_progress(&path).unwrap_err(),
            NexarionError::PersistenceCorrupt { .. }
        ));
    }
}
