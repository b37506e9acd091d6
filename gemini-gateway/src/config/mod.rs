use crate::models::AttachmentKind;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Outbound calls to the provider are abandoned after this many seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Request body limit on the gateway routes (20MB).
const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub models: ModelConfig,
    pub uploads: UploadConfig,
}

#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl GeminiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"[redacted]")
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model for /generate-text (e.g., gemini-2.5-flash)
    pub text_model: String,
    pub image_model: String,
    pub document_model: String,
    pub audio_model: String,
}

impl ModelConfig {
    /// Model used by the given attachment endpoint.
    pub fn model_for(&self, kind: AttachmentKind) -> &str {
        match kind {
            AttachmentKind::Image => &self.image_model,
            AttachmentKind::Document => &self.document_model,
            AttachmentKind::Audio => &self.audio_model,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded files are staged in while a request is processed.
    pub dir: String,
    pub max_bytes: usize,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();

        Ok(GatewayConfig {
            gemini: GeminiSettings {
                api_key: get_env("GEMINI_API_KEY", None, is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_API_BASE), is_prod)?,
                request_timeout_secs: get_env_parsed(
                    "GEMINI_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                    is_prod,
                )?,
            },
            models: ModelConfig {
                text_model: get_env("GEMINI_TEXT_MODEL", Some("gemini-2.5-flash"), is_prod)?,
                image_model: get_env("GEMINI_IMAGE_MODEL", Some("gemini-1.5-flash"), is_prod)?,
                document_model: get_env(
                    "GEMINI_DOCUMENT_MODEL",
                    Some("gemini-1.5-flash"),
                    is_prod,
                )?,
                audio_model: get_env("GEMINI_AUDIO_MODEL", Some("gemini-1.5-flash"), is_prod)?,
            },
            uploads: UploadConfig {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
                max_bytes: get_env_parsed("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES, is_prod)?,
            },
            common,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-wide, so every env-dependent
    // assertion lives in this one test.
    #[test]
    fn load_reads_environment_with_defaults() {
        for key in [
            "ENVIRONMENT",
            "APP__ENVIRONMENT",
            "APP__PORT",
            "GEMINI_API_BASE",
            "GEMINI_TEXT_MODEL",
            "GEMINI_DOCUMENT_MODEL",
            "GEMINI_AUDIO_MODEL",
            "UPLOAD_DIR",
            "UPLOAD_MAX_BYTES",
        ] {
            std::env::remove_var(key);
        }
        std::env::remove_var("GEMINI_API_KEY");
        std::env::set_var("PORT", "4100");

        let err = GatewayConfig::load().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        std::env::set_var("GEMINI_API_KEY", "secret-key");
        std::env::set_var("GEMINI_IMAGE_MODEL", "gemini-image-override");
        std::env::set_var("GEMINI_REQUEST_TIMEOUT_SECS", "not-a-number");

        let config = GatewayConfig::load().unwrap();
        assert_eq!(config.common.port, 4100);
        assert!(!config.common.is_prod());
        assert_eq!(config.gemini.api_key, "secret-key");
        assert_eq!(config.gemini.api_base, DEFAULT_API_BASE);
        assert_eq!(config.gemini.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.models.text_model, "gemini-2.5-flash");
        assert_eq!(
            config.models.model_for(AttachmentKind::Image),
            "gemini-image-override"
        );
        assert_eq!(
            config.models.model_for(AttachmentKind::Audio),
            "gemini-1.5-flash"
        );
        assert_eq!(config.uploads.dir, "uploads");
        assert_eq!(config.uploads.max_bytes, 20 * 1024 * 1024);

        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
