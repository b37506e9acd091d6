#![allow(dead_code)]

use gemini_gateway::config::{
    GatewayConfig, GeminiSettings, ModelConfig, UploadConfig, DEFAULT_API_BASE,
};
use gemini_gateway::services::providers::mock::MockProvider;
use gemini_gateway::startup::Application;
use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub const TEXT_MODEL: &str = "text-model-test";
pub const IMAGE_MODEL: &str = "image-model-test";
pub const DOCUMENT_MODEL: &str = "document-model-test";
pub const AUDIO_MODEL: &str = "audio-model-test";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub provider: Arc<MockProvider>,
    pub client: reqwest::Client,
}

pub fn test_config(upload_dir: &str, max_bytes: usize) -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            environment: "test".to_string(),
        },
        gemini: GeminiSettings {
            api_key: "test-api-key".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 5,
        },
        models: ModelConfig {
            text_model: TEXT_MODEL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
            document_model: DOCUMENT_MODEL.to_string(),
            audio_model: AUDIO_MODEL.to_string(),
        },
        uploads: UploadConfig {
            dir: upload_dir.to_string(),
            max_bytes,
        },
    }
}

impl TestApp {
    pub async fn spawn(provider: MockProvider) -> Self {
        Self::spawn_with_limit(provider, 20 * 1024 * 1024).await
    }

    pub async fn spawn_with_limit(provider: MockProvider, max_bytes: usize) -> Self {
        let upload_dir = format!("target/test-uploads-{}", Uuid::new_v4());
        let provider = Arc::new(provider);

        let app = Application::build_with_provider(
            test_config(&upload_dir, max_bytes),
            provider.clone(),
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let uploads_dir = app.uploads_dir().to_path_buf();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to be ready by polling the health endpoint
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            uploads_dir,
            provider,
            client,
        }
    }

    pub async fn post_text(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/generate-text", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form(&self, route: &str, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, route))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Number of files currently staged.
    pub async fn staged_files(&self) -> usize {
        let mut entries = tokio::fs::read_dir(&self.uploads_dir)
            .await
            .expect("Uploads directory missing");
        let mut count = 0;
        while entries
            .next_entry()
            .await
            .expect("Failed to read uploads directory")
            .is_some()
        {
            count += 1;
        }
        count
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.uploads_dir).await;
    }
}

pub fn file_part(name: &str, bytes: Vec<u8>, mime: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap()
}
