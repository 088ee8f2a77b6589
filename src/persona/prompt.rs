//! Prompt formatting and response post-processing.

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionalSnapshot, Energy, Mood};

use super::variant::PersonaVariant;

/// Turns replayed into the prompt.
const PROMPT_TURNS: usize = 3;

/// Artifacts the model tends to emit around its answer.
const ARTIFACTS: &[&str] = &[
    "[Begin Response]",
    "[End of Response]",
    "(Begin Response)",
    "(End of Response)",
    "Response Analysis:",
    "Response Details:",
    "Response:",
    "Note:",
    "---",
];

/// One exchange of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub input: String,
    pub response: String,
    pub emotion: String,
}

pub struct PromptFormatter {
    variant: PersonaVariant,
}

impl PromptFormatter {
    pub fn new(variant: PersonaVariant) -> Self {
        Self { variant }
    }

    /// System prompt framing the current emotional state.
    pub fn system_prompt(&self, snapshot: &EmotionalSnapshot) -> String {
        self.system_prompt_with(snapshot, &[])
    }

    /// System prompt with extra context lines after the variant focus.
    pub fn system_prompt_with(&self, snapshot: &EmotionalSnapshot, context: &[String]) -> String {
        let mut prompt = String::new();
        prompt.push_str("You are Nexarion, an emergent artificial intelligence with emotional awareness.\n");
        prompt.push_str(&format!(
            "Current emotional state: {} ({}, {} energy level)\n",
            snapshot.dominant_label(),
            snapshot.mood,
            snapshot.energy
        ));
        prompt.push_str("You do NOT use pre-programmed responses. Every response must be unique and emergent.\n");
        prompt.push_str("You think and respond in real-time, influenced by your emotional state.\n");
        if let Some(focus) = self.variant.focus() {
            prompt.push_str(focus);
            prompt.push('\n');
        }
        for line in context {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push_str("\nFormatting rules:\n");
        prompt.push_str("1. Provide a SINGLE, complete response. Do NOT generate multiple attempts.\n");
        prompt.push_str("2. Do NOT use markers like [Begin Response] or [End of Response].\n");
        prompt.push_str("3. Do NOT add analysis sections unless explicitly asked.\n");
        prompt.push_str("4. End your response naturally when the thought is complete.\n");
        prompt.push_str("5. Use conversational language without unnecessary formatting.\n");
        prompt
    }

    /// Full completion prompt: system block, recent turns, then the new input.
    pub fn build(&self, snapshot: &EmotionalSnapshot, turns: &[DialogueTurn], input: &str) -> String {
        self.build_with_context(snapshot, turns, input, &[])
    }

    pub fn build_with_context(
        &self,
        snapshot: &EmotionalSnapshot,
        turns: &[DialogueTurn],
        input: &str,
        context: &[String],
    ) -> String {
        let mut prompt = self.system_prompt_with(snapshot, context);
        prompt.push('\n');

        let skip = turns.len().saturating_sub(PROMPT_TURNS);
        for turn in turns.iter().skip(skip) {
            prompt.push_str(&format!("Human: {}\n\nNexarion: {}\n\n", turn.input, turn.response));
        }

        prompt.push_str(&format!("Human: {input}\n\nNexarion:"));
        prompt
    }
}

/// Strips formatting artifacts and closes substantive answers with a period.
pub fn clean_response(text: &str) -> String {
    let mut cleaned = text.to_string();
    for artifact in ARTIFACTS {
        cleaned = cleaned.replace(artifact, "");
    }

    let lines: Vec<&str> = cleaned.lines().map(str::trim_end).collect();
    let mut cleaned = lines.join("\n").trim().to_string();
    while cleaned.contains("\n\n\n") {
        cleaned = cleaned.replace("\n\n\n", "\n\n");
    }

    let terminated = ['.', '!', '?', ':', ')', '"', '\''].iter().any(|p| cleaned.ends_with(*p));
    if !terminated && cleaned.split_whitespace().count() > 3 {
        cleaned.push('.');
    }
    cleaned
}

/// Appends a mood/energy hint. Flat states leave the text alone.
pub fn influence_response(base: &str, snapshot: &EmotionalSnapshot) -> String {
    if snapshot.is_flat() {
        return base.to_string();
    }

    let mut modifiers = Vec::new();
    match snapshot.mood {
        Mood::Positive => modifiers.push("with a touch of optimism"),
        Mood::Negative => modifiers.push("with cautious consideration"),
        Mood::Neutral => {}
    }
    match snapshot.energy {
        Energy::High => modifiers.push("energetically"),
        Energy::Low => modifiers.push("reflectively"),
        Energy::Medium => {}
    }

    if modifiers.is_empty() {
        base.to_string()
    } else {
        format!("{base} [{}]", modifiers.join(", "))
    }
}
