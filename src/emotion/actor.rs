//! Single-owner emotion actor.
//!
//! One tokio task owns the `EmotionalState` and processes commands from a
//! channel in arrival order, so the decay ticker and the interactive loop
//! never mutate the state concurrently.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{NexarionError, Result};

use super::engine::{CycleReport, EmotionalState, InteractionKind};
use super::impulse::EmotionalImpulse;
use super::persistence::PersistedState;
use super::snapshot::EmotionalSnapshot;

const MAILBOX_SIZE: usize = 64;

enum Command {
    Stimulus {
        name: String,
        valence: f64,
        arousal: f64,
        source: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Impulse {
        impulse: EmotionalImpulse,
        reply: oneshot::Sender<()>,
    },
    Decay {
        reply: oneshot::Sender<CycleReport>,
    },
    Garden {
        complexity: f64,
        bloom_count: u32,
        reply: oneshot::Sender<()>,
    },
    Interaction {
        kind: InteractionKind,
        sentiment: f64,
        reply: oneshot::Sender<()>,
    },
    Dominant {
        reply: oneshot::Sender<Option<EmotionalImpulse>>,
    },
    Snapshot {
        reply: oneshot::Sender<EmotionalSnapshot>,
    },
    Save {
        path: PathBuf,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Cloneable handle to the emotion actor.
#[derive(Clone)]
pub struct EmotionHandle {
    tx: mpsc::Sender<Command>,
}

/// Starts the actor. The join handle yields the final state once every
/// handle has been dropped.
pub fn spawn(state: EmotionalState) -> (EmotionHandle, JoinHandle<EmotionalState>) {
    let (tx, rx) = mpsc::channel(MAILBOX_SIZE);
    let task = tokio::spawn(run(state, rx));
    (EmotionHandle { tx }, task)
}

async fn run(mut state: EmotionalState, mut rx: mpsc::Receiver<Command>) -> EmotionalState {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Stimulus {
                name,
                valence,
                arousal,
                source,
                reply,
            } => {
                let _ = reply.send(state.apply_stimulus(&name, valence, arousal, &source));
            }
            Command::Impulse { impulse, reply } => {
                state.apply_impulse(impulse);
                let _ = reply.send(());
            }
            Command::Decay { reply } => {
                let _ = reply.send(state.decay_cycle());
            }
            Command::Garden {
                complexity,
                bloom_count,
                reply,
            } => {
                state.record_from_garden(complexity, bloom_count);
                let _ = reply.send(());
            }
            Command::Interaction {
                kind,
                sentiment,
                reply,
            } => {
                state.record_from_interaction(kind, sentiment);
                let _ = reply.send(());
            }
            Command::Dominant { reply } => {
                let _ = reply.send(state.dominant_impulse().cloned());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(state.snapshot());
            }
            Command::Save { path, reply } => {
                // Captured before the write so later commands see no gap
                let persisted = PersistedState::capture(&state);
                let result = tokio::task::spawn_blocking(move || persisted.write_to(&path))
                    .await
                    .unwrap_or_else(|e| Err(NexarionError::IoError(std::io::Error::other(e.to_string()))));
                let _ = reply.send(result);
            }
        }
    }

    debug!("Emotion actor stopped");
    state
}

impl EmotionHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| NexarionError::ActorClosed)?;
        rx.await.map_err(|_| NexarionError::ActorClosed)
    }

    pub async fn apply_stimulus(&self, name: &str, valence: f64, arousal: f64, source: &str) -> Result<()> {
        let name = name.to_string();
        let source = source.to_string();
        self.request(|reply| Command::Stimulus {
            name,
            valence,
            arousal,
            source,
            reply,
        })
        .await?
    }

    pub async fn apply_impulse(&self, impulse: EmotionalImpulse) -> Result<()> {
        self.request(|reply| Command::Impulse { impulse, reply }).await
    }

    pub async fn decay_cycle(&self) -> Result<CycleReport> {
        self.request(|reply| Command::Decay { reply }).await
    }

    pub async fn record_from_garden(&self, complexity: f64, bloom_count: u32) -> Result<()> {
        self.request(|reply| Command::Garden {
            complexity,
            bloom_count,
            reply,
        })
        .await
    }

    pub async fn record_from_interaction(&self, kind: InteractionKind, sentiment: f64) -> Result<()> {
        self.request(|reply| Command::Interaction {
            kind,
            sentiment,
            reply,
        })
        .await
    }

    pub async fn dominant_impulse(&self) -> Result<Option<EmotionalImpulse>> {
        self.request(|reply| Command::Dominant { reply }).await
    }

    pub async fn snapshot(&self) -> Result<EmotionalSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn save(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.request(|reply| Command::Save { path, reply }).await?
    }

    /// Runs `decay_cycle` every `period` until the actor stops.
    pub fn spawn_decay_ticker(&self, period: Duration) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                match handle.decay_cycle().await {
                    Ok(report) => {
                        if !report.expired.is_empty() {
                            debug!("Expired impulses: {:?}", report.expired);
                        }
                    }
                    Err(e) => {
                        warn!("Decay ticker stopping: {}", e);
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::engine::EngineConfig;
    use crate::emotion::snapshot::Mood;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn quiet_empty() -> EmotionalState {
        EmotionalState::empty(EngineConfig::default().without_fluctuations(), StdRng::seed_from_u64(1))
    }

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let (handle, task) = spawn(quiet_empty());

        handle.record_from_interaction(InteractionKind::Query, -0.5).await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.mood, Mood::Negative);
        assert_eq!(snapshot.dominant_name.as_deref(), Some("defensive"));

        handle.apply_stimulus("joy", 0.9, 0.9, "test").await.unwrap();
        let dominant = handle.dominant_impulse().await.unwrap().unwrap();
        assert_eq!(dominant.name(), "joy");

        drop(handle);
        let state = task.await.unwrap();
        assert_eq!(state.impulses().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_stimulus_propagates() {
        let (handle, _task) = spawn(quiet_empty());
        let err = handle.apply_stimulus("", 0.5, 0.5, "test").await.unwrap_err();
        assert!(matches!(err, NexarionError::InvalidStimulus(_)));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let (handle, task) = spawn(quiet_empty());

        let mut joins = Vec::new();
        for i in 0..20 {
            let h = handle.clone();
            joins.push(tokio::spawn(async move {
                h.apply_stimulus("joy", 0.5, 0.5, &format!("caller_{i}")).await
            }));
        }
        for join in joins {
            join.await.unwrap().unwrap();
        }

        drop(handle);
        let state = task.await.unwrap();
        assert_eq!(state.impulses().len(), 1);
        let joy = state.impulse("joy").unwrap();
        assert!((joy.valence() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_save_through_actor() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        let (handle, _task) = spawn(EmotionalState::seeded(EngineConfig::default(), 3));

        handle.save(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_decay_ticker_fades_state() {
        let mut state = quiet_empty();
        state.apply_stimulus("joy", 0.8, 0.8, "test").unwrap();
        let (handle, _task) = spawn(state);

        let ticker = handle.spawn_decay_ticker(Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        ticker.abort();

        let snapshot = handle.snapshot().await.unwrap();
        let joy = &snapshot.impulses[0];
        assert!(joy.valence < 0.8);
        assert!(joy.valence > 0.6);
    }

    #[tokio::test]
    async fn test_closed_actor_reports_error() {
        let (handle, task) = spawn(quiet_empty());
        task.abort();
        let _ = task.await;
        let err = handle.snapshot().await.unwrap_err();
        assert!(matches!(err, NexarionError::ActorClosed));
    }
}
