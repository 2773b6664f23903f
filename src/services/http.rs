use super::contracts::{
    RefinementOutcome, RefinementRequest, RefinementService, StructuringOutcome,
    StructuringRequest, StructuringService, TranscriptionOutcome, TranscriptionService,
};
use crate::audio::AudioClip;
use crate::config::CollaboratorConfig;
use crate::error::{DictationError, DictationResult};
use crate::reconcile::{Candidate, CreateOutcome, EntityDirectory, EntityKind, NewEntity};
use anyhow::{Context, Result};
use base64::Engine as _;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct TranscriptionRequestBody {
    /// Base64-encoded WAV bytes
    audio: String,
    format: &'static str,
    duration_seconds: f64,
    sample_rate: u32,
    channels: u16,
}

/// HTTP client for the four collaborator services.
///
/// One shared reqwest client; endpoints and the bearer token come from
/// configuration. Failures are mapped into the pipeline error taxonomy at
/// this boundary.
pub struct HttpCollaborators {
    http: reqwest::Client,
    transcription_url: String,
    structuring_url: String,
    refinement_url: String,
    directory_url: String,
    api_key: Option<String>,
}

impl HttpCollaborators {
    pub fn new(config: &CollaboratorConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            transcription_url: config.transcription_url.clone(),
            structuring_url: config.structuring_url.clone(),
            refinement_url: config.refinement_url.clone(),
            directory_url: config.directory_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.post(url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        request
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        request
    }
}

/// Read an error body for diagnostics without failing the failure path
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    format!("{status}: {body}")
}

#[async_trait::async_trait]
impl TranscriptionService for HttpCollaborators {
    async fn transcribe(&self, clip: &AudioClip) -> DictationResult<TranscriptionOutcome> {
        let wav_bytes = clip
            .to_wav_bytes()
            .map_err(|e| DictationError::TranscriptionFailed(e.to_string()))?;

        let body = TranscriptionRequestBody {
            audio: base64::engine::general_purpose::STANDARD.encode(wav_bytes),
            format: "wav",
            duration_seconds: clip.duration_seconds,
            sample_rate: clip.sample_rate,
            channels: clip.channels,
        };

        debug!(
            "sending {:.1}s clip to transcription service",
            clip.duration_seconds
        );

        let response = self
            .post(&self.transcription_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DictationError::TranscriptionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DictationError::TranscriptionFailed(
                error_body(response).await,
            ));
        }

        response
            .json::<TranscriptionOutcome>()
            .await
            .map_err(|e| DictationError::TranscriptionFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl StructuringService for HttpCollaborators {
    async fn structure(&self, request: StructuringRequest) -> DictationResult<StructuringOutcome> {
        debug!(
            "sending transcript to structuring service (type: {})",
            request.session_type
        );

        let response = self
            .post(&self.structuring_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DictationError::StructuringFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DictationError::StructuringFailed(error_body(response).await));
        }

        response
            .json::<StructuringOutcome>()
            .await
            .map_err(|e| DictationError::StructuringFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RefinementService for HttpCollaborators {
    async fn refine(&self, request: RefinementRequest) -> DictationResult<RefinementOutcome> {
        let response = self
            .post(&self.refinement_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DictationError::RefinementFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DictationError::RefinementFailed(error_body(response).await));
        }

        response
            .json::<RefinementOutcome>()
            .await
            .map_err(|e| DictationError::RefinementFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl EntityDirectory for HttpCollaborators {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Candidate>> {
        let url = format!("{}/{}s", self.directory_url, kind);

        let response = self
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to list {kind} candidates"))?;

        if !response.status().is_success() {
            anyhow::bail!("listing {kind}s failed: {}", error_body(response).await);
        }

        response
            .json::<Vec<Candidate>>()
            .await
            .context("Failed to parse candidate list")
    }

    async fn create(&self, kind: EntityKind, entity: NewEntity) -> Result<CreateOutcome> {
        let url = format!("{}/{}s", self.directory_url, kind);

        let response = self
            .post(&url)
            .json(&entity)
            .send()
            .await
            .with_context(|| format!("Failed to create {kind}"))?;

        match response.status() {
            StatusCode::CONFLICT => Ok(CreateOutcome::Conflict),
            status if status.is_success() => {
                let created = response
                    .json::<Candidate>()
                    .await
                    .context("Failed to parse created entity")?;
                Ok(CreateOutcome::Created(created))
            }
            _ => anyhow::bail!("creating {kind} failed: {}", error_body(response).await),
        }
    }
}
