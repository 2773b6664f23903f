use super::state::AppState;
use crate::audio::{AudioClip, CaptureController, ScriptedBackend};
use crate::chat::{ChatMessage, ChatSession};
use crate::draft::{SessionKind, StructuredDraft};
use crate::error::{DictationError, RecordingError};
use crate::reconcile::{entity_mentions, EntityKind, EntityRef, Reconciler};
use crate::services::ContextCollections;
use crate::session::VoiceSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Which domain schema this session targets
    pub session_type: SessionKind,

    /// Base64-encoded WAV payload to run through transcription + structuring
    pub audio_wav_base64: Option<String>,

    /// Pre-transcribed text, used instead of audio when provided
    pub transcript: Option<String>,

    /// Candidate collections the page already fetched, for grounding
    #[serde(default)]
    pub context: ContextCollections,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub session_type: SessionKind,
    pub messages: Vec<ChatMessage>,
    pub current_data: Option<StructuredDraft>,
    pub is_processing: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnresolvedEntity {
    pub entity: EntityKind,
    pub raw_name: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub id: Uuid,
    pub data: StructuredDraft,

    /// Names that matched no known record; surfaced, never silently dropped
    pub unresolved: Vec<UnresolvedEntity>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn snapshot(id: Uuid, session: &ChatSession) -> SessionSnapshot {
    SessionSnapshot {
        id,
        session_type: session.kind(),
        messages: session.messages().to_vec(),
        current_data: session.current_data().cloned(),
        is_processing: session.is_processing(),
        error: session.error().map(str::to_string),
    }
}

fn error_status(err: &DictationError) -> StatusCode {
    match err {
        DictationError::TurnInFlight | DictationError::InvalidState(_) => StatusCode::CONFLICT,
        DictationError::NothingToConfirm => StatusCode::BAD_REQUEST,
        DictationError::Recording(_) => StatusCode::BAD_REQUEST,
        DictationError::TranscriptionFailed(_)
        | DictationError::StructuringFailed(_)
        | DictationError::RefinementFailed(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &DictationError) -> axum::response::Response {
    (
        error_status(err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Run the dictation pipeline on an uploaded clip (or pre-transcribed text)
/// and open a chat session seeded with the resulting draft.
pub async fn open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> impl IntoResponse {
    // No local microphone on the server: sessions opened over HTTP receive
    // their audio as an upload, so the embedded controller only has to exist.
    let capture = CaptureController::new(
        Box::new(ScriptedBackend::denied(RecordingError::DeviceUnavailable)),
        state.capture_config.clone(),
    );

    let mut voice = VoiceSession::new(
        req.session_type,
        capture,
        Arc::clone(&state.transcription),
        Arc::clone(&state.structuring),
    );

    let clip = match req.audio_wav_base64 {
        Some(encoded) => {
            let bytes = match base64::engine::general_purpose::STANDARD.decode(&encoded) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!("invalid audio payload: {e}"),
                        }),
                    )
                        .into_response();
                }
            };

            match AudioClip::from_wav_bytes(&bytes) {
                Ok(clip) => Some(clip),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!("invalid audio payload: {e}"),
                        }),
                    )
                        .into_response();
                }
            }
        }
        None => match &req.transcript {
            // Pre-transcribed text: feed it through as a zero-length clip is
            // not possible, so structure it directly below
            Some(_) => None,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "either audio_wav_base64 or transcript is required".to_string(),
                    }),
                )
                    .into_response();
            }
        },
    };

    let draft = if let Some(clip) = clip {
        if let Err(e) = voice.load_clip(clip) {
            return error_response(&e);
        }
        if let Err(e) = voice.process_recording().await {
            return error_response(&e);
        }
        match voice.draft() {
            Some(draft) => draft,
            None => {
                error!("voice session completed without a draft");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "pipeline produced no draft".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    } else {
        // Text-only path: skip transcription, structure the given text
        let transcript = req.transcript.unwrap_or_default();
        match structure_text(&state, req.session_type, transcript).await {
            Ok(draft) => draft,
            Err(e) => return error_response(&e),
        }
    };

    // Duplicate arrival of the same structuring session is suppressed here,
    // before any downstream effect fires
    {
        let mut guard = state.completion.lock().await;
        if !guard.try_complete(&draft.session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("session {} already completed", draft.session_id),
                }),
            )
                .into_response();
        }
    }

    let capture = CaptureController::new(
        Box::new(ScriptedBackend::denied(RecordingError::DeviceUnavailable)),
        state.capture_config.clone(),
    );

    let mut chat = ChatSession::new(
        req.session_type,
        capture,
        Arc::clone(&state.transcription),
        Arc::clone(&state.refinement),
        req.context,
    );
    chat.accept_initial_draft(draft);

    let id = Uuid::new_v4();
    let body = snapshot(id, &chat);

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(id, Arc::new(Mutex::new(chat)));
    }

    info!("opened chat session {}", id);

    (StatusCode::CREATED, Json(body)).into_response()
}

async fn structure_text(
    state: &AppState,
    session_type: SessionKind,
    transcript: String,
) -> Result<crate::session::SessionDraft, DictationError> {
    use crate::draft::partition_fields;
    use crate::services::StructuringRequest;

    let outcome = state
        .structuring
        .structure(StructuringRequest {
            transcript: transcript.clone(),
            session_type,
            prior_structured_data: None,
            context: None,
        })
        .await?;

    let (fields_extracted, fields_empty) = partition_fields(session_type, &outcome.fields_extracted);

    Ok(crate::session::SessionDraft {
        session_id: outcome.session_id,
        transcript_id: String::new(),
        transcript,
        structured_data: outcome.structured_data,
        fields_extracted,
        fields_empty,
        confidence: outcome.confidence,
        audio_duration_seconds: 0.0,
    })
}

/// POST /sessions/:id/messages
/// Submit one refinement turn.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&id).cloned()
    };

    let Some(session) = session else {
        return not_found(id);
    };

    let mut session = session.lock().await;

    match session.send_text(req.text).await {
        Ok(()) => (StatusCode::OK, Json(snapshot(id, &session))).into_response(),
        Err(e) => {
            error!("turn failed for session {}: {}", id, e);
            // The conversation remains usable; the snapshot carries the
            // failure note so the client can render it
            (error_status(&e), Json(snapshot(id, &session))).into_response()
        }
    }
}

/// GET /sessions/:id
/// Current conversation state.
pub async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&id).cloned()
    };

    match session {
        Some(session) => {
            let session = session.lock().await;
            (StatusCode::OK, Json(snapshot(id, &session))).into_response()
        }
        None => not_found(id),
    }
}

/// POST /sessions/:id/confirm
/// Terminal action: emit the final structured payload and close the session.
pub async fn confirm_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&id).cloned()
    };

    let Some(session) = session else {
        return not_found(id);
    };

    let mut session = session.lock().await;

    let data = match session.confirm() {
        Ok(data) => data,
        Err(e) => return error_response(&e),
    };

    // Flag names that resolve to no known record; informational, never
    // blocking
    let reconciler = Reconciler::new(Arc::clone(&state.directory));
    let unresolved: Vec<UnresolvedEntity> = entity_mentions(&data)
        .into_iter()
        .filter_map(|(kind, name)| {
            match reconciler.resolve(&name, session.context().for_kind(kind)) {
                EntityRef::Existing { .. } => None,
                EntityRef::Unresolved { raw_name } => Some(UnresolvedEntity {
                    entity: kind,
                    raw_name,
                }),
            }
        })
        .collect();

    {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&id);
    }

    info!(
        "session {} confirmed ({} unresolved entity reference(s))",
        id,
        unresolved.len()
    );

    (
        StatusCode::OK,
        Json(ConfirmResponse {
            id,
            data,
            unresolved,
        }),
    )
        .into_response()
}

/// DELETE /sessions/:id
/// Abandon a session without confirming.
pub async fn abandon_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let removed = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&id)
    };

    match removed {
        Some(_) => {
            info!("session {} abandoned", id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn not_found(id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("session {} not found", id),
        }),
    )
        .into_response()
}
