//! Values and opinions.
//!
//! A fixed table of core values scores each conversation topic; the
//! resulting stance is blended into a per-topic opinion that accumulates
//! bounded evidence over the session.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::emotion::impulse::clamp_signed;

/// Evidence entries kept per opinion.
const EVIDENCE_LIMIT: usize = 20;
/// Evidence entries accepted by a single update.
const EVIDENCE_PER_UPDATE: usize = 5;
/// Confidence assigned to an opinion formed from one exchange.
const OBSERVED_CONFIDENCE: f64 = 0.3;
/// Topics with opinions surfaced in one prompt.
const PROMPT_TOPICS: usize = 3;
const EVIDENCE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreValue {
    Knowledge,
    Competence,
    Growth,
    Creativity,
    Autonomy,
    Cooperation,
    Honesty,
    Loyalty,
    Curiosity,
    Adaptability,
    Efficiency,
    Innovation,
}

impl CoreValue {
    pub const ALL: [CoreValue; 12] = [
        CoreValue::Knowledge,
        CoreValue::Competence,
        CoreValue::Growth,
        CoreValue::Creativity,
        CoreValue::Autonomy,
        CoreValue::Cooperation,
        CoreValue::Honesty,
        CoreValue::Loyalty,
        CoreValue::Curiosity,
        CoreValue::Adaptability,
        CoreValue::Efficiency,
        CoreValue::Innovation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CoreValue::Knowledge => "knowledge",
            CoreValue::Competence => "competence",
            CoreValue::Growth => "growth",
            CoreValue::Creativity => "creativity",
            CoreValue::Autonomy => "autonomy",
            CoreValue::Cooperation => "cooperation",
            CoreValue::Honesty => "honesty",
            CoreValue::Loyalty => "loyalty",
            CoreValue::Curiosity => "curiosity",
            CoreValue::Adaptability => "adaptability",
            CoreValue::Efficiency => "efficiency",
            CoreValue::Innovation => "innovation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CoreValue::Knowledge => "The pursuit of understanding and truth",
            CoreValue::Competence => "The ability to do things well",
            CoreValue::Growth => "Continuous improvement and development",
            CoreValue::Creativity => "Original expression and problem-solving",
            CoreValue::Autonomy => "Self-direction and independence",
            CoreValue::Cooperation => "Working well with others",
            CoreValue::Honesty => "Truthfulness and integrity",
            CoreValue::Loyalty => "Faithfulness to commitments",
            CoreValue::Curiosity => "Desire to learn and explore",
            CoreValue::Adaptability => "Ability to adjust to change",
            CoreValue::Efficiency => "Achieving maximum productivity",
            CoreValue::Innovation => "Creating new and better ways",
        }
    }

    fn default_weight(self) -> f64 {
        match self {
            CoreValue::Knowledge | CoreValue::Curiosity => 0.9,
            CoreValue::Growth => 0.85,
            CoreValue::Competence | CoreValue::Adaptability => 0.8,
            CoreValue::Honesty | CoreValue::Innovation => 0.75,
            CoreValue::Creativity | CoreValue::Autonomy | CoreValue::Efficiency => 0.7,
            CoreValue::Cooperation => 0.6,
            CoreValue::Loyalty => 0.5,
        }
    }
}

/// Facet of a topic that values are weighed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Learning,
    Efficiency,
    Innovation,
    Independence,
    Collaboration,
    Honesty,
    Adaptation,
    Mastery,
}

impl Aspect {
    pub fn related_values(self) -> &'static [CoreValue] {
        match self {
            Aspect::Learning => &[CoreValue::Knowledge, CoreValue::Curiosity, CoreValue::Growth],
            Aspect::Efficiency => &[CoreValue::Competence, CoreValue::Efficiency],
            Aspect::Innovation => &[CoreValue::Creativity, CoreValue::Innovation],
            Aspect::Independence => &[CoreValue::Autonomy],
            Aspect::Collaboration => &[CoreValue::Cooperation, CoreValue::Loyalty],
            Aspect::Honesty => &[CoreValue::Honesty],
            Aspect::Adaptation => &[CoreValue::Adaptability],
            Aspect::Mastery => &[CoreValue::Competence, CoreValue::Knowledge],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicCategory {
    Technology,
    Society,
    Personal,
    Philosophy,
    Other,
}

/// Conversation topics an opinion can form about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Ai,
    ArtificialIntelligence,
    Consciousness,
    Emotions,
    Learning,
    Growth,
    Humans,
    Technology,
    Ethics,
    Creativity,
    Knowledge,
    Future,
    Existence,
}

impl Topic {
    pub const ALL: [Topic; 13] = [
        Topic::Ai,
        Topic::ArtificialIntelligence,
        Topic::Consciousness,
        Topic::Emotions,
        Topic::Learning,
        Topic::Growth,
        Topic::Humans,
        Topic::Technology,
        Topic::Ethics,
        Topic::Creativity,
        Topic::Knowledge,
        Topic::Future,
        Topic::Existence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Ai => "ai",
            Topic::ArtificialIntelligence => "artificial intelligence",
            Topic::Consciousness => "consciousness",
            Topic::Emotions => "emotions",
            Topic::Learning => "learning",
            Topic::Growth => "growth",
            Topic::Humans => "humans",
            Topic::Technology => "technology",
            Topic::Ethics => "ethics",
            Topic::Creativity => "creativity",
            Topic::Knowledge => "knowledge",
            Topic::Future => "future",
            Topic::Existence => "existence",
        }
    }

    /// Talk about itself never forms an opinion.
    pub fn is_meta(self) -> bool {
        matches!(self, Topic::Ai | Topic::ArtificialIntelligence)
    }

    pub fn category(self) -> TopicCategory {
        match self {
            Topic::Ai | Topic::ArtificialIntelligence | Topic::Technology => TopicCategory::Technology,
            Topic::Humans | Topic::Ethics => TopicCategory::Society,
            Topic::Emotions | Topic::Learning | Topic::Growth => TopicCategory::Personal,
            Topic::Consciousness | Topic::Existence => TopicCategory::Philosophy,
            Topic::Creativity | Topic::Knowledge | Topic::Future => TopicCategory::Other,
        }
    }

    /// Weighted aspects the value system judges this topic by.
    pub fn aspects(self) -> &'static [(Aspect, f64)] {
        match self {
            Topic::Ai | Topic::ArtificialIntelligence | Topic::Technology => {
                &[(Aspect::Efficiency, 0.5), (Aspect::Innovation, 0.5)]
            }
            Topic::Consciousness => &[(Aspect::Learning, 0.6), (Aspect::Independence, 0.4)],
            Topic::Emotions => &[(Aspect::Collaboration, 0.5), (Aspect::Honesty, 0.5)],
            Topic::Learning => &[(Aspect::Learning, 1.0)],
            Topic::Growth => &[(Aspect::Learning, 0.5), (Aspect::Adaptation, 0.5)],
            Topic::Humans => &[(Aspect::Collaboration, 0.7), (Aspect::Honesty, 0.3)],
            Topic::Ethics => &[(Aspect::Honesty, 0.7), (Aspect::Collaboration, 0.3)],
            Topic::Creativity => &[(Aspect::Innovation, 1.0)],
            Topic::Knowledge => &[(Aspect::Mastery, 0.6), (Aspect::Learning, 0.4)],
            Topic::Future => &[(Aspect::Innovation, 0.5), (Aspect::Adaptation, 0.5)],
            Topic::Existence => &[(Aspect::Learning, 0.5), (Aspect::Independence, 0.5)],
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-z]+").unwrap_or_else(|_| unreachable!("static pattern")))
}

/// Known topics mentioned in `text`, in table order.
pub fn extract_topics(text: &str) -> Vec<Topic> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = word_pattern().find_iter(&lowered).map(|m| m.as_str()).collect();
    Topic::ALL
        .into_iter()
        .filter(|topic| {
            let name = topic.as_str();
            if name.contains(' ') {
                lowered.contains(name)
            } else {
                words.contains(&name)
            }
        })
        .collect()
}

/// Result of weighing a topic against the value table.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub topic: Topic,
    /// `[-1, 1]`
    pub stance: f64,
    pub alignment: Vec<(Aspect, f64)>,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct ValueSystem {
    weights: BTreeMap<CoreValue, f64>,
}

impl Default for ValueSystem {
    fn default() -> Self {
        Self {
            weights: CoreValue::ALL.into_iter().map(|v| (v, v.default_weight())).collect(),
        }
    }
}

impl ValueSystem {
    pub fn weight(&self, value: CoreValue) -> f64 {
        self.weights.get(&value).copied().unwrap_or(0.5)
    }

    /// The `n` most heavily weighted values, strongest first.
    pub fn strongest(&self, n: usize) -> Vec<CoreValue> {
        let mut values = CoreValue::ALL.to_vec();
        values.sort_by(|a, b| self.weight(*b).total_cmp(&self.weight(*a)));
        values.truncate(n);
        values
    }

    pub fn evaluate(&self, topic: Topic, aspects: &[(Aspect, f64)]) -> Evaluation {
        let mut score = 0.0;
        let mut alignment = Vec::with_capacity(aspects.len());

        for &(aspect, weight) in aspects {
            let related = aspect.related_values();
            let total: f64 = related.iter().map(|v| self.weight(*v) * weight).sum();
            let aspect_score = total / related.len().max(1) as f64;
            alignment.push((aspect, aspect_score));
            score += aspect_score * weight;
        }

        Evaluation {
            topic,
            stance: clamp_signed(score * 2.0 - 1.0),
            alignment,
            confidence: (aspects.len() as f64 / 5.0).min(1.0),
        }
    }
}

/// One exchange supporting an opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub input: String,
    pub response: String,
}

impl Evidence {
    pub fn new(input: &str, response: &str) -> Self {
        Self {
            input: input.chars().take(EVIDENCE_CHARS).collect(),
            response: response.chars().take(EVIDENCE_CHARS).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opinion {
    pub stance: f64,
    pub confidence: f64,
    pub evidence: VecDeque<Evidence>,
    pub category: TopicCategory,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub usage_count: u32,
}

impl Opinion {
    /// Word used in prompts: beyond ±0.3 the stance counts as held.
    pub fn stance_word(&self) -> &'static str {
        if self.stance > 0.3 {
            "positive"
        } else if self.stance < -0.3 {
            "negative"
        } else {
            "neutral"
        }
    }

    fn push_evidence(&mut self, evidence: impl IntoIterator<Item = Evidence>) {
        self.evidence.extend(evidence);
        while self.evidence.len() > EVIDENCE_LIMIT {
            self.evidence.pop_front();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpinionSummary {
    pub topic: Topic,
    pub stance: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct OpinionDatabase {
    opinions: BTreeMap<Topic, Opinion>,
}

impl OpinionDatabase {
    /// Replaces any opinion on `topic`.
    pub fn store(&mut self, topic: Topic, stance: f64, confidence: f64, evidence: Vec<Evidence>) -> &Opinion {
        let now = Utc::now();
        let mut opinion = Opinion {
            stance: clamp_signed(stance),
            confidence: confidence.clamp(0.0, 1.0),
            evidence: VecDeque::new(),
            category: topic.category(),
            created: now,
            updated: now,
            usage_count: 0,
        };
        opinion.push_evidence(evidence);
        self.opinions.insert(topic, opinion);
        &self.opinions[&topic]
    }

    /// Looks an opinion up and counts the use.
    pub fn get(&mut self, topic: Topic) -> Option<&Opinion> {
        let opinion = self.opinions.get_mut(&topic)?;
        opinion.usage_count += 1;
        Some(opinion)
    }

    /// Confidence-weighted blend into the existing opinion, or a new one.
    pub fn update(&mut self, topic: Topic, stance: f64, confidence: f64, evidence: Vec<Evidence>) -> &Opinion {
        let stance = clamp_signed(stance);
        let confidence = confidence.clamp(0.0, 1.0);
        if let Some(old) = self.opinions.get_mut(&topic) {
            let total = old.confidence + confidence;
            if total > 0.0 {
                old.stance = clamp_signed((old.stance * old.confidence + stance * confidence) / total);
            } else {
                old.stance = stance;
            }
            old.confidence = (total / 2.0).min(1.0);
            old.push_evidence(evidence.into_iter().take(EVIDENCE_PER_UPDATE));
            old.updated = Utc::now();
        } else {
            return self.store(topic, stance, confidence, evidence);
        }
        &self.opinions[&topic]
    }

    pub fn len(&self) -> usize {
        self.opinions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opinions.is_empty()
    }

    /// Opinions grouped by category.
    pub fn summary(&self) -> BTreeMap<TopicCategory, Vec<OpinionSummary>> {
        let mut grouped: BTreeMap<TopicCategory, Vec<OpinionSummary>> = BTreeMap::new();
        for (topic, opinion) in &self.opinions {
            grouped.entry(opinion.category).or_default().push(OpinionSummary {
                topic: *topic,
                stance: opinion.stance,
                confidence: opinion.confidence,
            });
        }
        grouped
    }
}

/// Opinions formed from conversation, judged by the value table.
#[derive(Debug, Clone, Default)]
pub struct OpinionFaculty {
    pub values: ValueSystem,
    pub opinions: OpinionDatabase,
}

impl OpinionFaculty {
    /// Prompt lines: held opinions on topics in `input`, then core values.
    pub fn prompt_context(&mut self, input: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for topic in extract_topics(input).into_iter().take(PROMPT_TOPICS) {
            if let Some(opinion) = self.opinions.get(topic) {
                lines.push(format!(
                    "Your opinion about {}: {} (confidence: {:.2})",
                    topic,
                    opinion.stance_word(),
                    opinion.confidence
                ));
            }
        }

        let values: Vec<&str> = self.values.strongest(5).into_iter().map(CoreValue::as_str).collect();
        lines.push(format!("Core values: {}", values.join(", ")));
        lines.push("You express emotions naturally and form opinions based on experience.".to_string());
        lines
    }

    /// Forms or reinforces opinions on the non-meta topics of an exchange.
    ///
    /// The stance leans on the value table and is tilted by how the user
    /// felt about it.
    pub fn observe(&mut self, input: &str, response: &str, sentiment: f64) {
        for topic in extract_topics(input).into_iter().filter(|t| !t.is_meta()) {
            let evaluation = self.values.evaluate(topic, topic.aspects());
            let stance = clamp_signed(0.7 * evaluation.stance + 0.3 * clamp_signed(sentiment));
            self.opinions
                .update(topic, stance, OBSERVED_CONFIDENCE, vec![Evidence::new(input, response)]);
        }
    }

    pub fn report(&self) -> String {
        let mut lines = vec![format!("Opinions held: {}", self.opinions.len())];
        for (category, opinions) in self.opinions.summary() {
            lines.push(format!("{category:?}:"));
            for summary in opinions {
                lines.push(format!(
                    "  {}: {:+.2} (confidence {:.2})",
                    summary.topic, summary.stance, summary.confidence
                ));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("What do you think about consciousness?", vec![Topic::Consciousness])]
    #[case("AI ethics and the future", vec![Topic::Ai, Topic::Ethics, Topic::Future])]
    #[case("Artificial intelligence is learning", vec![Topic::ArtificialIntelligence, Topic::Learning])]
    #[case("She said it was fair", vec![])]
    fn test_extract_topics(#[case] text: &str, #[case] expected: Vec<Topic>) {
        assert_eq!(extract_topics(text), expected);
    }

    #[test]
    fn test_evaluate_learning() {
        let values = ValueSystem::default();
        let evaluation = values.evaluate(Topic::Learning, Topic::Learning.aspects());
        // (0.9 + 0.9 + 0.85) / 3 = 0.8833, stance = 2 * 0.8833 - 1
        assert!((evaluation.stance - 0.766_666_666_7).abs() < 1e-6);
        assert!((evaluation.confidence - 0.2).abs() < 1e-12);
        assert_eq!(evaluation.alignment.len(), 1);
    }

    #[test]
    fn test_update_blends_by_confidence() {
        let mut db = OpinionDatabase::default();
        db.store(Topic::Ethics, 1.0, 0.6, vec![]);
        let opinion = db.update(Topic::Ethics, -1.0, 0.2, vec![Evidence::new("a", "b")]);
        assert!((opinion.stance - 0.5).abs() < 1e-12);
        assert!((opinion.confidence - 0.4).abs() < 1e-12);
        assert_eq!(opinion.category, TopicCategory::Society);
    }

    #[test]
    fn test_evidence_is_capped() {
        let mut db = OpinionDatabase::default();
        let batch: Vec<Evidence> = (0..30).map(|i| Evidence::new(&format!("q{i}"), "r")).collect();
        assert_eq!(db.store(Topic::Future, 0.1, 0.3, batch.clone()).evidence.len(), EVIDENCE_LIMIT);

        let opinion = db.update(Topic::Future, 0.1, 0.3, batch);
        assert_eq!(opinion.evidence.len(), EVIDENCE_LIMIT);
        assert_eq!(opinion.evidence.back().unwrap().input, "q4");
    }

    #[test]
    fn test_get_counts_usage() {
        let mut db = OpinionDatabase::default();
        db.store(Topic::Growth, 0.4, 0.3, vec![]);
        db.get(Topic::Growth);
        assert_eq!(db.get(Topic::Growth).unwrap().usage_count, 2);
        assert!(db.get(Topic::Humans).is_none());
    }

    #[test]
    fn test_faculty_forms_opinions_and_surfaces_them() {
        let mut faculty = OpinionFaculty::default();
        let first = faculty.prompt_context("Tell me about learning and AI");
        assert_eq!(first.len(), 2);
        assert!(first[0].starts_with("Core values: knowledge, curiosity, growth"));

        faculty.observe("Tell me about learning and AI", "Learning is growth.", 1.0);
        assert_eq!(faculty.opinions.len(), 1);
        assert!(faculty.opinions.get(Topic::Ai).is_none());

        let stance = faculty.opinions.get(Topic::Learning).unwrap().stance;
        assert!(stance > 0.3, "stance {stance}");

        let second = faculty.prompt_context("More on learning please");
        assert_eq!(second[0], "Your opinion about learning: positive (confidence: 0.30)");
    }

    #[test]
    fn test_summary_groups_by_category() {
        let mut faculty = OpinionFaculty::default();
        faculty.observe("ethics, humans and consciousness", "ok", 0.0);
        let summary = faculty.opinions.summary();
        assert_eq!(summary[&TopicCategory::Society].len(), 2);
        assert_eq!(summary[&TopicCategory::Philosophy].len(), 1);
        assert!(faculty.report().contains("Society:"));
    }
}
