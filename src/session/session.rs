use crate::audio::{AudioClip, CaptureController};
use crate::draft::{partition_fields, Confidence, SessionKind, StructuredDraft};
use crate::error::{DictationError, DictationResult, ErrorKind};
use crate::services::{
    StructuringRequest, StructuringService, TranscriptionService,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Voice session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Recording,
    Transcribing,
    Structuring,
    DraftReady,
    Error,
}

/// Everything a consumer takes from a completed voice session: the payload
/// handed to the chat loop (or directly to a form) once the draft is ready.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub session_id: String,
    pub transcript: String,
    pub transcript_id: String,
    pub structured_data: StructuredDraft,
    pub fields_extracted: BTreeSet<String>,
    pub fields_empty: BTreeSet<String>,
    pub confidence: Confidence,
    pub audio_duration_seconds: f64,
}

/// Drives one recording-to-structured-draft cycle:
/// idle → recording → transcribing → structuring → draft_ready, with error
/// and reset transitions.
///
/// Invariants:
/// - `DraftReady` implies transcript, transcript id, session id and
///   structured data are all present.
/// - `Recording` implies no held audio artifact (the clip exists only after
///   stop).
/// - The clip is exclusively held until it is consumed by processing or
///   discarded.
pub struct VoiceSession {
    kind: SessionKind,
    status: SessionStatus,
    capture: CaptureController,

    clip: Option<AudioClip>,
    audio_duration_seconds: Option<f64>,

    transcript: Option<String>,
    transcript_id: Option<String>,

    /// Assigned by the structuring collaborator once structuring succeeds
    session_id: Option<String>,
    structured_data: Option<StructuredDraft>,
    fields_extracted: BTreeSet<String>,
    fields_empty: BTreeSet<String>,
    confidence: Option<Confidence>,

    last_error: Option<ErrorKind>,

    transcription: Arc<dyn TranscriptionService>,
    structuring: Arc<dyn StructuringService>,
}

impl VoiceSession {
    pub fn new(
        kind: SessionKind,
        capture: CaptureController,
        transcription: Arc<dyn TranscriptionService>,
        structuring: Arc<dyn StructuringService>,
    ) -> Self {
        Self {
            kind,
            status: SessionStatus::Idle,
            capture,
            clip: None,
            audio_duration_seconds: None,
            transcript: None,
            transcript_id: None,
            session_id: None,
            structured_data: None,
            fields_extracted: BTreeSet::new(),
            fields_empty: BTreeSet::new(),
            confidence: None,
            last_error: None,
            transcription,
            structuring,
        }
    }

    /// idle → recording. A previously held artifact is discarded (the user
    /// is re-recording).
    pub async fn start_recording(&mut self) -> DictationResult<()> {
        if self.status != SessionStatus::Idle {
            return Err(DictationError::InvalidState(
                "can only start recording from idle",
            ));
        }

        self.clip = None;

        if let Err(e) = self.capture.start().await {
            // Terminal for this attempt only: stay idle, retryable
            if let DictationError::Recording(recording_err) = &e {
                self.last_error = Some(ErrorKind::from(*recording_err));
            }
            return Err(e);
        }

        self.status = SessionStatus::Recording;
        Ok(())
    }

    /// recording → idle, holding the finalized artifact. Returns the
    /// measured duration.
    pub async fn stop_recording(&mut self) -> DictationResult<f64> {
        if self.status != SessionStatus::Recording {
            return Err(DictationError::InvalidState("no recording to stop"));
        }

        let clip = self.capture.stop().await?;
        let duration = clip.duration_seconds;
        self.clip = Some(clip);
        self.status = SessionStatus::Idle;

        Ok(duration)
    }

    /// Discard any in-progress capture and any held artifact. Never fails,
    /// from any state.
    pub async fn cancel_recording(&mut self) {
        self.capture.cancel().await;
        self.clip = None;

        if self.status == SessionStatus::Recording {
            self.status = SessionStatus::Idle;
        }
    }

    /// Attach an externally sourced clip (e.g. an uploaded file) as the
    /// artifact to process, in place of a local capture.
    pub fn load_clip(&mut self, clip: AudioClip) -> DictationResult<()> {
        if self.status != SessionStatus::Idle {
            return Err(DictationError::InvalidState(
                "can only load a clip while idle",
            ));
        }

        self.clip = Some(clip);
        Ok(())
    }

    /// idle (with artifact) → transcribing → structuring → draft_ready.
    ///
    /// The artifact is consumed. Collaborator failures land the session in
    /// the error state with the corresponding error kind; `reset` makes it
    /// usable again.
    pub async fn process_recording(&mut self) -> DictationResult<()> {
        if self.status != SessionStatus::Idle {
            return Err(DictationError::InvalidState(
                "processing requires an idle session holding an artifact",
            ));
        }

        let clip = self.clip.take().ok_or(DictationError::InvalidState(
            "no audio artifact to process",
        ))?;
        self.audio_duration_seconds = Some(clip.duration_seconds);

        self.status = SessionStatus::Transcribing;

        let outcome = match self.transcription.transcribe(&clip).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("transcription failed: {}", e);
                self.status = SessionStatus::Error;
                self.last_error = Some(ErrorKind::TranscriptionFailed);
                return Err(e);
            }
        };

        info!(
            "transcription complete ({} chars), structuring as {}",
            outcome.transcript.len(),
            self.kind
        );

        self.transcript = Some(outcome.transcript.clone());
        self.transcript_id = Some(outcome.transcript_id);
        self.status = SessionStatus::Structuring;

        let request = StructuringRequest {
            transcript: outcome.transcript,
            session_type: self.kind,
            prior_structured_data: None,
            context: None,
        };

        let structured = match self.structuring.structure(request).await {
            Ok(structured) => structured,
            Err(e) => {
                warn!("structuring failed: {}", e);
                self.status = SessionStatus::Error;
                self.last_error = Some(ErrorKind::StructuringFailed);
                return Err(e);
            }
        };

        let (extracted, empty) = partition_fields(self.kind, &structured.fields_extracted);

        info!(
            "draft ready: session {} extracted {} of {} fields",
            structured.session_id,
            extracted.len(),
            self.kind.declared_fields().len()
        );

        self.session_id = Some(structured.session_id);
        self.structured_data = Some(structured.structured_data);
        self.confidence = Some(structured.confidence);
        self.fields_extracted = extracted;
        self.fields_empty = empty;
        self.last_error = None;
        self.status = SessionStatus::DraftReady;

        Ok(())
    }

    /// error | draft_ready → idle. Clears artifact, transcript, draft and
    /// error so the user can redo the dictation.
    pub async fn reset(&mut self) {
        self.capture.cancel().await;

        self.clip = None;
        self.audio_duration_seconds = None;
        self.transcript = None;
        self.transcript_id = None;
        self.session_id = None;
        self.structured_data = None;
        self.fields_extracted.clear();
        self.fields_empty.clear();
        self.confidence = None;
        self.last_error = None;
        self.status = SessionStatus::Idle;
    }

    /// The completed draft payload, present exactly when the session is in
    /// `DraftReady`.
    pub fn draft(&self) -> Option<SessionDraft> {
        if self.status != SessionStatus::DraftReady {
            return None;
        }

        Some(SessionDraft {
            session_id: self.session_id.clone()?,
            transcript: self.transcript.clone()?,
            transcript_id: self.transcript_id.clone()?,
            structured_data: self.structured_data.clone()?,
            fields_extracted: self.fields_extracted.clone(),
            fields_empty: self.fields_empty.clone(),
            confidence: self.confidence?,
            audio_duration_seconds: self.audio_duration_seconds.unwrap_or(0.0),
        })
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn structured_data(&self) -> Option<&StructuredDraft> {
        self.structured_data.as_ref()
    }

    pub fn fields_extracted(&self) -> &BTreeSet<String> {
        &self.fields_extracted
    }

    pub fn fields_empty(&self) -> &BTreeSet<String> {
        &self.fields_empty
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn has_artifact(&self) -> bool {
        self.clip.is_some()
    }

    /// Live recording duration for UI display
    pub fn elapsed_seconds(&self) -> f64 {
        self.capture.elapsed_seconds()
    }
}
