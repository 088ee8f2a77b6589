//! Persona layer.
//!
//! Wraps a completion backend with the emotion actor: every user turn is
//! scored, fed to the engine, rendered into a prompt from the resulting
//! snapshot and answered. State is autosaved every few turns.

mod backend;
pub mod faculty;
mod prompt;
pub mod sentiment;
mod variant;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::emotion::{EmotionHandle, EmotionalSnapshot, InteractionKind};
use crate::errors::{NexarionError, Result};

pub use backend::{EchoBackend, LlmBackend};
pub use faculty::Faculty;
pub use prompt::{clean_response, influence_response, DialogueTurn, PromptFormatter};
pub use variant::{GenerationParams, PersonaVariant, DEFAULT_STOP};

/// Turns kept in the conversation history.
const HISTORY_LIMIT: usize = 50;
/// Characters of each response kept in history.
const STORED_RESPONSE_CHARS: usize = 100;
const SAVE_TIMEOUT: Duration = Duration::from_secs(5);
/// Improvement progress lives next to the emotional state file.
const PROGRESS_FILE: &str = "improvement_progress.json";

/// Result of one user turn.
#[derive(Debug, Clone)]
pub struct InteractionOutcome {
    pub response: String,
    pub sentiment: f64,
    pub snapshot: EmotionalSnapshot,
    pub conversation_count: usize,
}

pub struct Persona {
    variant: PersonaVariant,
    formatter: PromptFormatter,
    backend: Arc<dyn LlmBackend>,
    emotions: EmotionHandle,
    faculty: Option<Faculty>,
    history: VecDeque<DialogueTurn>,
    state_file: Option<PathBuf>,
    autosave_every: usize,
    interactions: usize,
}

impl Persona {
    pub fn new(variant: PersonaVariant, backend: Arc<dyn LlmBackend>, emotions: EmotionHandle) -> Self {
        Self {
            variant,
            formatter: PromptFormatter::new(variant),
            backend,
            emotions,
            faculty: Faculty::for_variant(variant, StdRng::from_os_rng()),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            state_file: None,
            autosave_every: 5,
            interactions: 0,
        }
    }

    /// Enables autosave to `path` every `every` turns (0 disables).
    pub fn with_autosave(mut self, path: impl Into<PathBuf>, every: usize) -> Self {
        self.state_file = Some(path.into());
        self.autosave_every = every;
        self.restore_faculty();
        self
    }

    /// Replaces the variant's default faculty.
    pub fn with_faculty(mut self, faculty: Option<Faculty>) -> Self {
        self.faculty = faculty;
        self.restore_faculty();
        self
    }

    fn progress_path(&self) -> Option<PathBuf> {
        self.state_file.as_deref().map(|p| p.with_file_name(PROGRESS_FILE))
    }

    fn restore_faculty(&mut self) {
        let Some(path) = self.progress_path() else {
            return;
        };
        if let Some(Faculty::Improvement(tracker)) = self.faculty.as_mut() {
            match tracker.load_progress(&path) {
                Ok(()) => {}
                Err(NexarionError::PersistenceNotFound { .. }) => {
                    debug!("No improvement progress at {:?}, starting fresh", path);
                }
                Err(e) => warn!("{}; starting improvement tracking fresh", e),
            }
        }
    }

    pub fn variant(&self) -> PersonaVariant {
        self.variant
    }

    pub fn emotions(&self) -> &EmotionHandle {
        &self.emotions
    }

    pub fn history(&self) -> impl Iterator<Item = &DialogueTurn> {
        self.history.iter()
    }

    pub fn interactions(&self) -> usize {
        self.interactions
    }

    pub fn faculty(&self) -> Option<&Faculty> {
        self.faculty.as_ref()
    }

    pub fn faculty_report(&self) -> Option<String> {
        self.faculty.as_ref().map(Faculty::report)
    }

    /// Handles one user turn end to end.
    pub async fn process_interaction(&mut self, input: &str) -> Result<InteractionOutcome> {
        let sentiment = sentiment::score(input);
        self.emotions
            .record_from_interaction(InteractionKind::Query, sentiment)
            .await?;
        let snapshot = self.emotions.snapshot().await?;

        let turns: Vec<DialogueTurn> = self.history.iter().cloned().collect();
        let context = match self.faculty.as_mut() {
            Some(faculty) => {
                let lines = faculty.prompt_context(input, sentiment);
                debug!("Faculty {} added {} prompt lines", faculty.name(), lines.len());
                lines
            }
            None => Vec::new(),
        };
        let prompt = self.formatter.build_with_context(&snapshot, &turns, input, &context);
        let mut params = self.variant.base_params().for_energy(snapshot.energy);
        if let Some(faculty) = &self.faculty {
            params = faculty.tune(params);
        }
        debug!(
            "Completing with {} (temperature {:.2}, {} prompt chars)",
            self.backend.name(),
            params.temperature,
            prompt.len()
        );

        let response = match self.backend.complete(&prompt, &params).await {
            Ok(text) => clean_response(&text),
            Err(e) => {
                warn!("Backend {} failed: {}", self.backend.name(), e);
                String::new()
            }
        };
        let response = if response.is_empty() {
            influence_response(
                &format!("I'm contemplating '{}' through emergent cognition.", input.trim()),
                &snapshot,
            )
        } else {
            response
        };

        if let Some(faculty) = self.faculty.as_mut() {
            faculty.observe(input, &response, sentiment, &snapshot);
        }
        self.remember(input, &response, snapshot.dominant_label());
        self.interactions += 1;

        if self.autosave_every > 0 && self.interactions % self.autosave_every == 0 {
            if let Err(e) = self.save().await {
                warn!("Autosave failed, continuing with in-memory state: {}", e);
            }
        }

        Ok(InteractionOutcome {
            response,
            sentiment,
            snapshot,
            conversation_count: self.history.len(),
        })
    }

    fn remember(&mut self, input: &str, response: &str, emotion: &str) {
        self.history.push_back(DialogueTurn {
            input: input.to_string(),
            response: response.chars().take(STORED_RESPONSE_CHARS).collect(),
            emotion: emotion.to_string(),
        });
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    /// Saves to the configured state file, bounded by a timeout, along
    /// with any faculty progress.
    pub async fn save(&self) -> Result<()> {
        let Some(path) = self.state_file.clone() else {
            return Ok(());
        };
        match tokio::time::timeout(SAVE_TIMEOUT, self.emotions.save(path.clone())).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(NexarionError::PersistenceWriteFailure {
                    path,
                    message: Arc::new(format!("timed out after {}s", SAVE_TIMEOUT.as_secs())),
                })
            }
        }
        self.save_faculty()
    }

    fn save_faculty(&self) -> Result<()> {
        match (&self.faculty, self.progress_path()) {
            (Some(Faculty::Improvement(tracker)), Some(path)) => tracker.save_progress(&path),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{spawn, EmotionalState, EngineConfig, Mood};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
            Err(NexarionError::backend("model not loaded"))
        }
    }

    struct RecordingBackend {
        reply: String,
        prompts: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn empty_handle() -> EmotionHandle {
        let state = EmotionalState::empty(EngineConfig::default().without_fluctuations(), StdRng::seed_from_u64(5));
        spawn(state).0
    }

    #[tokio::test]
    async fn test_negative_input_turns_defensive() {
        let mut persona = Persona::new(PersonaVariant::Unified, Arc::new(EchoBackend), empty_handle());
        let outcome = persona.process_interaction("this is terrible and stupid").await.unwrap();

        assert!(outcome.sentiment <= -0.3);
        assert_eq!(outcome.snapshot.dominant_name.as_deref(), Some("defensive"));
        assert_eq!(outcome.snapshot.mood, Mood::Negative);
        assert!(outcome.response.contains("this is terrible and stupid"));
        assert_eq!(outcome.conversation_count, 1);
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let mut persona = Persona::new(PersonaVariant::Emotional, Arc::new(FailingBackend), empty_handle());
        let outcome = persona.process_interaction("I love gardens").await.unwrap();
        assert!(outcome.response.starts_with("I'm contemplating 'I love gardens'"));
        assert!(outcome.response.ends_with("[with a touch of optimism]"));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let mut persona = Persona::new(PersonaVariant::Unified, Arc::new(EchoBackend), empty_handle());
        for i in 0..60 {
            persona.process_interaction(&format!("message {i}")).await.unwrap();
        }
        assert_eq!(persona.history().count(), HISTORY_LIMIT);
        assert_eq!(persona.history().next().unwrap().input, "message 10");
    }

    #[tokio::test]
    async fn test_autosave_every_n_turns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        let mut persona = Persona::new(PersonaVariant::Unified, Arc::new(EchoBackend), empty_handle())
            .with_autosave(&path, 2);

        persona.process_interaction("hello").await.unwrap();
        assert!(!path.exists());
        persona.process_interaction("hello again").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_emotional_variant_forms_and_recalls_opinions() {
        let backend = RecordingBackend::new("Learning keeps me curious.");
        let mut persona = Persona::new(PersonaVariant::Emotional, backend.clone(), empty_handle());

        persona.process_interaction("learning is wonderful").await.unwrap();
        assert!(backend.last_prompt().contains("Core values: knowledge"));
        assert!(!backend.last_prompt().contains("Your opinion about"));

        persona.process_interaction("tell me more about learning").await.unwrap();
        assert!(backend.last_prompt().contains("Your opinion about learning: positive"));

        let Some(Faculty::Opinions(opinions)) = persona.faculty() else {
            panic!("emotional persona carries opinions");
        };
        assert_eq!(opinions.opinions.len(), 1);
        assert!(persona.faculty_report().unwrap().contains("learning"));
    }

    #[tokio::test]
    async fn test_abliterated_variant_settles_topic_choices() {
        let backend = RecordingBackend::new("Let's go somewhere new.");
        let mut persona = Persona::new(PersonaVariant::Abliterated, backend.clone(), empty_handle())
            .with_faculty(Faculty::for_variant(PersonaVariant::Abliterated, StdRng::seed_from_u64(21)));

        persona.process_interaction("hello").await.unwrap();
        assert!(backend.last_prompt().contains("Autonomy level 2/4."));
        persona.process_interaction("that was great, thank you").await.unwrap();

        let Some(Faculty::Autonomy(autonomy)) = persona.faculty() else {
            panic!("abliterated persona carries autonomy");
        };
        let status = autonomy.status();
        assert_eq!(status.total_choices, 1);
        assert!(status.recent_choices[0].successful);
        assert_eq!(status.preferred_topics.len(), 1);
    }

    #[tokio::test]
    async fn test_improved_variant_tracks_and_persists_progress() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        let backend = RecordingBackend::new("I think my bias shapes this answer.");
        let mut persona = Persona::new(PersonaVariant::UnifiedImproved, backend.clone(), empty_handle())
            .with_faculty(Faculty::for_variant(PersonaVariant::UnifiedImproved, StdRng::seed_from_u64(22)))
            .with_autosave(&path, 1);

        persona.process_interaction("what shapes your answers?").await.unwrap();
        assert!(backend.last_prompt().contains("You are working on: Creative Expression, Vulnerability."));
        assert!(temp.path().join(PROGRESS_FILE).exists());

        let restored = Persona::new(PersonaVariant::UnifiedImproved, backend, empty_handle()).with_autosave(&path, 1);
        let Some(Faculty::Improvement(tracker)) = restored.faculty() else {
            panic!("improved persona carries an improvement tracker");
        };
        assert!((tracker.level(faculty::ImprovementArea::SelfReflection) - 0.42).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_plain_variant_has_no_faculty() {
        let persona = Persona::new(PersonaVariant::Unified, Arc::new(EchoBackend), empty_handle());
        assert!(persona.faculty().is_none());
        assert!(persona.faculty_report().is_none());
    }
}
