//! Mock provider for testing.

use super::{ContentPart, Generation, GenerationProvider, ProviderError};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A call observed by [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub model: String,
    pub parts: Vec<ContentPart>,
}

enum Behaviour {
    Reply(String),
    Fail(String),
}

/// Provider that answers every call the same way and remembers what it was
/// asked.
pub struct MockProvider {
    behaviour: Behaviour,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Succeed with `text` on every call.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            behaviour: Behaviour::Reply(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail on every call with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behaviour: Behaviour::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(
        &self,
        model: &str,
        parts: &[ContentPart],
    ) -> Result<Generation, ProviderError> {
        self.calls.lock().await.push(RecordedCall {
            model: model.to_string(),
            parts: parts.to_vec(),
        });

        match &self.behaviour {
            Behaviour::Reply(text) => Ok(Generation { text: text.clone() }),
            Behaviour::Fail(message) => Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let provider = MockProvider::replying("Hello!");

        provider
            .generate("model-a", &[ContentPart::text("one")])
            .await
            .unwrap();
        provider
            .generate("model-b", &[ContentPart::text("two")])
            .await
            .unwrap();

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, "model-a");
        assert_eq!(calls[1].parts, vec![ContentPart::text("two")]);
    }

    #[tokio::test]
    async fn failing_provider_returns_message() {
        let provider = MockProvider::failing("quota exhausted");
        let err = provider.generate("m", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 500, .. }));
        assert!(err.to_string().contains("quota exhausted"));
    }
}
