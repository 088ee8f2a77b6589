#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]

//! # Nexarion
//!
//! Emotional state engine for an LLM chat persona.
//! Keeps a small, bounded set of decaying emotional impulses, a rolling
//! memory that biases mood, and a JSON snapshot that survives restarts.
//! A garden simulation and user interactions feed stimuli into one
//! actor-owned state.

pub mod config;
pub mod emotion;
pub mod errors;
pub mod garden;
pub mod persona;

pub use emotion::{spawn, EmotionHandle, EmotionalState, EmotionalSnapshot, EngineConfig};
pub use errors::{NexarionError, Result};
