// Shared mock collaborators and fixtures for the integration tests.
#![allow(dead_code)]

use clinivoice::audio::{AudioClip, CaptureConfig, CaptureController, ScriptedBackend};
use clinivoice::draft::{Confidence, EncounterDraft, StructuredDraft};
use clinivoice::error::{DictationError, DictationResult};
use clinivoice::reconcile::{Candidate, CreateOutcome, EntityDirectory, EntityKind, NewEntity};
use clinivoice::services::{
    RefinementOutcome, RefinementRequest, RefinementService, StructuringOutcome,
    StructuringRequest, StructuringService, TranscriptionOutcome, TranscriptionService,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Capture controller over a scripted backend producing `seconds` of silence
pub fn silent_capture(seconds: f64) -> CaptureController {
    let config = CaptureConfig::default();
    let backend = ScriptedBackend::silence(config.sample_rate, config.channels, seconds);
    CaptureController::new(Box::new(backend), config)
}

/// A clip of the given length at the default capture format
pub fn clip_of(seconds: f64) -> AudioClip {
    let config = CaptureConfig::default();
    let count = (seconds * config.sample_rate as f64 * config.channels as f64) as usize;
    AudioClip::from_samples(vec![0i16; count], config.sample_rate, config.channels)
}

pub fn encounter_draft(chief_complaint: &str) -> StructuredDraft {
    StructuredDraft::Encounter(EncounterDraft {
        chief_complaint: Some(chief_complaint.to_string()),
        ..Default::default()
    })
}

pub struct MockTranscription {
    pub transcript: String,
    pub transcript_id: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockTranscription {
    pub fn returning(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            transcript_id: "tr-1".to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            transcript: String::new(),
            transcript_id: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TranscriptionService for MockTranscription {
    async fn transcribe(&self, _clip: &AudioClip) -> DictationResult<TranscriptionOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(DictationError::TranscriptionFailed(
                "mock transcription outage".to_string(),
            ));
        }

        Ok(TranscriptionOutcome {
            transcript: self.transcript.clone(),
            transcript_id: self.transcript_id.clone(),
        })
    }
}

pub struct MockStructuring {
    pub session_id: String,
    pub structured_data: StructuredDraft,
    pub confidence: Confidence,
    pub fields_extracted: Vec<String>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockStructuring {
    pub fn returning(
        session_id: &str,
        structured_data: StructuredDraft,
        fields_extracted: &[&str],
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            structured_data,
            confidence: Confidence::Medium,
            fields_extracted: fields_extracted.iter().map(|f| f.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            session_id: String::new(),
            structured_data: StructuredDraft::Encounter(EncounterDraft::default()),
            confidence: Confidence::Low,
            fields_extracted: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StructuringService for MockStructuring {
    async fn structure(&self, _request: StructuringRequest) -> DictationResult<StructuringOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(DictationError::StructuringFailed(
                "mock structuring outage".to_string(),
            ));
        }

        Ok(StructuringOutcome {
            session_id: self.session_id.clone(),
            structured_data: self.structured_data.clone(),
            confidence: self.confidence,
            fields_extracted: self.fields_extracted.clone(),
        })
    }
}

/// Refinement mock fed with a queue of scripted turn results
pub struct MockRefinement {
    script: Mutex<VecDeque<DictationResult<RefinementOutcome>>>,
    pub requests: Mutex<Vec<RefinementRequest>>,
}

impl MockRefinement {
    pub fn scripted(turns: Vec<DictationResult<RefinementOutcome>>) -> Self {
        Self {
            script: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl RefinementService for MockRefinement {
    async fn refine(&self, request: RefinementRequest) -> DictationResult<RefinementOutcome> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(DictationError::RefinementFailed(
                    "mock script exhausted".to_string(),
                ))
            })
    }
}

/// Directory mock: scripted create outcome plus a post-conflict collection
pub struct MockDirectory {
    pub refreshed: Vec<Candidate>,
    pub create_outcome: CreateOutcome,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl MockDirectory {
    pub fn creating(candidate: Candidate) -> Self {
        Self {
            refreshed: Vec::new(),
            create_outcome: CreateOutcome::Created(candidate),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn conflicting(refreshed: Vec<Candidate>) -> Self {
        Self {
            refreshed,
            create_outcome: CreateOutcome::Conflict,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EntityDirectory for MockDirectory {
    async fn list(&self, _kind: EntityKind) -> anyhow::Result<Vec<Candidate>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.refreshed.clone())
    }

    async fn create(&self, _kind: EntityKind, _entity: NewEntity) -> anyhow::Result<CreateOutcome> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.create_outcome.clone())
    }
}
