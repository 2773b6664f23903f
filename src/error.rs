use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Microphone-level failures. Terminal for the attempt only: the capture
/// controller returns to idle and a new start may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("audio device unavailable")]
    DeviceUnavailable,
}

/// Pipeline error taxonomy. Collaborator failures are caught at the session
/// boundary and mapped into these variants; none propagate as panics.
#[derive(Debug, Error)]
pub enum DictationError {
    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("structuring failed: {0}")]
    StructuringFailed(String),

    #[error("refinement failed: {0}")]
    RefinementFailed(String),

    #[error("entity creation conflict: {0}")]
    ReconciliationConflict(String),

    #[error("another turn is already in flight")]
    TurnInFlight,

    #[error("no structured data to confirm")]
    NothingToConfirm,

    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DictationResult<T> = Result<T, DictationError>;

/// Coarse error tag stored on a voice session after a failed attempt.
/// The session decides the tag at the boundary where the failure happened,
/// regardless of the underlying transport cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    DeviceUnavailable,
    TranscriptionFailed,
    StructuringFailed,
    RefinementFailed,
}

impl From<RecordingError> for ErrorKind {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::PermissionDenied => ErrorKind::PermissionDenied,
            RecordingError::DeviceUnavailable => ErrorKind::DeviceUnavailable,
        }
    }
}
