//! Generation provider abstraction and implementations.
//!
//! Handlers only see [`GenerationProvider`]; the Gemini client is wired in at
//! startup and tests substitute the mock.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Error fetching from Gemini API: [{status}] {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider answered but refused to produce text.
    #[error("{0}")]
    Blocked(String),

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// The message carried by the error, without the variant's prefix.
    pub fn detail(&self) -> &str {
        match self {
            ProviderError::NotConfigured(msg)
            | ProviderError::RateLimited(msg)
            | ProviderError::Blocked(msg)
            | ProviderError::InvalidResponse(msg)
            | ProviderError::Network(msg) => msg,
            ProviderError::Api { message, .. } => message,
        }
    }
}

/// A single unit of input sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Binary attachment, `data` holding the standard base64 encoding.
    InlineData { mime_type: String, data: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    /// Encode raw file bytes for transport.
    pub fn inline_data(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        ContentPart::InlineData {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }
}

/// Successful provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text from the given parts with `model`.
    async fn generate(
        &self,
        model: &str,
        parts: &[ContentPart],
    ) -> Result<Generation, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_data_is_base64_encoded() {
        let part = ContentPart::inline_data("image/png", b"hello");
        assert_eq!(
            part,
            ContentPart::InlineData {
                mime_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
            }
        );
    }

    #[test]
    fn detail_strips_the_variant_prefix() {
        let err = ProviderError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.detail(), "overloaded");
        assert_eq!(ProviderError::Network(String::new()).detail(), "");
    }

    #[test]
    fn blocked_error_displays_message_verbatim() {
        let err = ProviderError::Blocked("Candidate was blocked due to SAFETY".into());
        assert_eq!(err.to_string(), "Candidate was blocked due to SAFETY");
    }
}
