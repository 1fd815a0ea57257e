use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::io::render_payload_csv;
use crate::models::{CreatedPersona, PersonaPayload};

use super::PersonaGenerator;

/// Configuration for the persona service client
#[derive(Debug, Clone)]
pub struct PersonaApiConfig {
    /// Base URL, e.g. "http://localhost:5000/api" (from PERSONA_API_URL)
    pub base_url: String,
    /// Optional bearer token (from PERSONA_API_TOKEN)
    pub token: Option<String>,
}

impl PersonaApiConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PERSONA_API_URL")
            .context("PERSONA_API_URL environment variable not set")?;

        Ok(Self::new(base_url, std::env::var("PERSONA_API_TOKEN").ok()))
    }

    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self { base_url, token }
    }

    /// Upload endpoint for transcript files
    pub fn upload_url(&self) -> String {
        format!("{}/transcript-upload", self.base_url.trim_end_matches('/'))
    }
}

/// HTTP client for the persona service
pub struct PersonaApiClient {
    client: Client,
    config: PersonaApiConfig,
}

impl PersonaApiClient {
    pub fn new(config: PersonaApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Upload one transcript as a single-row CSV file
    pub async fn upload_transcript(
        &self,
        payload: &PersonaPayload,
        index: usize,
    ) -> Result<Vec<CreatedPersona>> {
        let csv = render_payload_csv(payload)?;
        let file_name = format!("transcript_{}.csv", index + 1);
        debug!("Uploading {} ({} bytes)", file_name, csv.len());

        let part = Part::text(csv)
            .file_name(file_name)
            .mime_str("text/csv")
            .context("Failed to build multipart body")?;
        let form = Form::new().part("transcript", part);

        let mut request = self.client.post(self.config.upload_url()).multipart(form);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send transcript to persona service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Persona service error: {} - {}", status, body);
        }

        let body = response
            .text()
            .await
            .context("Failed to read persona service response")?;
        parse_upload_response(&body)
    }
}

#[async_trait]
impl PersonaGenerator for PersonaApiClient {
    async fn generate(&self, payload: &PersonaPayload, index: usize) -> Result<Vec<CreatedPersona>> {
        self.upload_transcript(payload, index).await
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    results: Vec<CreatedPersona>,
}

/// Extract created personas from the service's JSON body
pub fn parse_upload_response(body: &str) -> Result<Vec<CreatedPersona>> {
    let response: UploadResponse =
        serde_json::from_str(body).context("Failed to parse persona service response")?;
    Ok(response.results)
}
