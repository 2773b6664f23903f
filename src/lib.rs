pub mod audio;
pub mod chat;
pub mod config;
pub mod draft;
pub mod error;
pub mod http;
pub mod reconcile;
pub mod services;
pub mod session;

pub use audio::{
    AudioBackend, AudioClip, AudioFrame, CaptureConfig, CaptureController, CaptureState,
    ScriptedBackend,
};
pub use chat::{ChatMessage, ChatSession, MessageRole};
pub use config::Config;
pub use draft::{
    merge_drafts, partition_fields, BatchDraft, BatchEntry, Confidence, SessionKind,
    StructuredDraft,
};
pub use error::{DictationError, DictationResult, ErrorKind, RecordingError};
pub use http::{create_router, AppState};
pub use reconcile::{
    entity_mentions, match_first, Candidate, CreateOutcome, EntityDirectory, EntityKind,
    EntityRef, NewEntity, Reconciler,
};
pub use services::{
    ContextCollections, HttpCollaborators, RefinementAction, RefinementOutcome,
    RefinementRequest, RefinementService, StructuringOutcome, StructuringRequest,
    StructuringService, TranscriptionOutcome, TranscriptionService,
};
pub use session::{CompletionGuard, SessionDraft, SessionStatus, VoiceSession};
