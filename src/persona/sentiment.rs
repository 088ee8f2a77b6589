//! Keyword sentiment heuristic.
//!
//! Counts lexicon hits, flips polarity after a negator, and squashes the
//! balance into `[-1, 1]`. Good enough to steer the interaction classifier.

use std::sync::OnceLock;

use regex::Regex;

const POSITIVE: &[&str] = &[
    "love", "like", "great", "good", "wonderful", "amazing", "awesome", "thanks", "thank", "beautiful",
    "happy", "glad", "excellent", "fantastic", "nice", "brilliant", "fascinating", "enjoy", "curious",
    "appreciate", "cool", "perfect", "kind", "fun",
];

const NEGATIVE: &[&str] = &[
    "hate", "bad", "terrible", "awful", "stupid", "wrong", "useless", "angry", "sad", "annoying",
    "boring", "horrible", "worst", "dumb", "broken", "fail", "failed", "liar", "shut", "disappointed",
    "idiot", "ugly", "pathetic", "scared",
];

const NEGATORS: &[&str] = &["not", "no", "never", "dont", "don't", "isnt", "isn't", "cant", "can't", "without"];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-z']+").unwrap_or_else(|_| unreachable!("static pattern")))
}

/// Sentiment in `[-1, 1]`; zero when nothing in the lexicon matched.
pub fn score(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let mut positive = 0.0_f64;
    let mut negative = 0.0_f64;
    let mut negate = false;

    for word in word_pattern().find_iter(&lowered).map(|m| m.as_str()) {
        if NEGATORS.contains(&word) {
            negate = true;
            continue;
        }

        let polarity = if POSITIVE.contains(&word) {
            1.0
        } else if NEGATIVE.contains(&word) {
            -1.0
        } else {
            continue;
        };

        let polarity = if negate { -polarity } else { polarity };
        negate = false;
        if polarity > 0.0 {
            positive += 1.0;
        } else {
            negative += 1.0;
        }
    }

    let hits = positive + negative;
    if hits == 0.0 {
        return 0.0;
    }
    // One strong word should already clear the 0.3 classifier threshold
    let balance = (positive - negative) / hits;
    let confidence = (hits / 2.0).clamp(0.5, 1.0);
    (balance * confidence).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("What time is it?", 0.0)]
    #[case("I love this, thank you!", 1.0)]
    #[case("This is terrible and stupid", -1.0)]
    #[case("great", 0.5)]
    #[case("not good", -0.5)]
    #[case("good but broken", 0.0)]
    fn test_score(#[case] text: &str, #[case] expected: f64) {
        assert!((score(text) - expected).abs() < 1e-9, "{text}: {}", score(text));
    }

    #[test]
    fn test_score_is_bounded() {
        let text = "love ".repeat(50);
        assert!(score(&text) <= 1.0);
    }
}
