//! Completion backend seam.
//!
//! The model runtime lives outside this crate; personas only need
//! `complete(prompt, params) -> text`.

use async_trait::async_trait;

use crate::errors::Result;

use super::variant::GenerationParams;

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Offline backend: reflects the last human line back.
#[derive(Debug, Clone, Default)]
pub struct EchoBackend;

#[async_trait]
impl LlmBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        let input = prompt
            .rsplit("Human: ")
            .next()
            .and_then(|tail| tail.split("\n\nNexarion:").next())
            .unwrap_or(prompt)
            .trim();
        Ok(format!("I'm contemplating '{input}' through emergent cognition."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_extracts_last_input() {
        let backend = EchoBackend;
        let prompt = "system\n\nHuman: first\n\nNexarion: reply\n\nHuman: what is a garden?\n\nNexarion:";
        let reply = backend.complete(prompt, &GenerationParams::default()).await.unwrap();
        assert_eq!(reply, "I'm contemplating 'what is a garden?' through emergent cognition.");
    }
}
