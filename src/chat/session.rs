use super::message::{ChatMessage, MessageRole};
use crate::audio::CaptureController;
use crate::draft::{append_entries, merge_drafts, SessionKind, StructuredDraft};
use crate::error::{DictationError, DictationResult};
use crate::services::{
    ContextCollections, HistoryTurn, RefinementAction, RefinementOutcome, RefinementRequest,
    RefinementService, TranscriptionService,
};
use crate::session::SessionDraft;
use std::sync::Arc;
use tracing::{info, warn};

/// Conversational refinement loop.
///
/// Accepts a heterogeneous stream of turns (an initial voice-session draft,
/// free-text messages, further voice messages) and converges to one
/// confirmed structured payload. One turn in flight at a time per session;
/// independent sessions share nothing.
pub struct ChatSession {
    kind: SessionKind,
    messages: Vec<ChatMessage>,
    current_data: Option<StructuredDraft>,

    /// Cooperative single-flight flag. `&mut self` already serializes direct
    /// callers; this covers holders that observe `is_processing()` across an
    /// await and must not submit another turn meanwhile.
    is_processing: bool,
    error: Option<String>,
    confirmed: bool,

    capture: CaptureController,
    transcription: Arc<dyn TranscriptionService>,
    refinement: Arc<dyn RefinementService>,
    context: ContextCollections,
}

impl ChatSession {
    pub fn new(
        kind: SessionKind,
        capture: CaptureController,
        transcription: Arc<dyn TranscriptionService>,
        refinement: Arc<dyn RefinementService>,
        context: ContextCollections,
    ) -> Self {
        Self {
            kind,
            messages: Vec::new(),
            current_data: None,
            is_processing: false,
            error: None,
            confirmed: false,
            capture,
            transcription,
            refinement,
            context,
        }
    }

    /// Seed the conversation from a completed voice session: one
    /// voice-marked user turn plus one assistant turn carrying the draft.
    pub fn accept_initial_draft(&mut self, draft: SessionDraft) {
        let user_message =
            ChatMessage::voice_user(draft.transcript.clone(), draft.audio_duration_seconds);

        let summary = format!(
            "Captured {} of {} fields from the dictation",
            draft.fields_extracted.len(),
            draft.fields_extracted.len() + draft.fields_empty.len()
        );

        let assistant_message = ChatMessage::assistant(summary.clone())
            .with_draft(draft.structured_data.clone())
            .with_fields(draft.fields_extracted.iter().cloned().collect())
            .with_summary(summary);

        self.messages.push(user_message);
        self.messages.push(assistant_message);
        self.current_data = Some(draft.structured_data);
        self.error = None;

        info!("chat session seeded from voice session {}", draft.session_id);
    }

    /// Append a user turn, run it through the refinement collaborator, merge
    /// the result into the running draft.
    pub async fn send_text(&mut self, text: impl Into<String>) -> DictationResult<()> {
        self.send_turn(text.into(), false, None).await
    }

    async fn send_turn(
        &mut self,
        text: String,
        is_voice: bool,
        audio_duration_seconds: Option<f64>,
    ) -> DictationResult<()> {
        if self.confirmed {
            return Err(DictationError::InvalidState(
                "session already confirmed",
            ));
        }

        if self.is_processing {
            return Err(DictationError::TurnInFlight);
        }

        self.is_processing = true;

        // Appended before the call returns: submission order is display
        // order, and the UI shows the awaiting turn immediately.
        let user_message = if is_voice {
            ChatMessage::voice_user(text.clone(), audio_duration_seconds.unwrap_or(0.0))
        } else {
            ChatMessage::user(text.clone())
        };
        self.messages.push(user_message);

        let request = RefinementRequest {
            conversation_history: self.history(),
            new_user_text: text,
            current_structured_data: self.current_data.clone(),
            session_type: self.kind,
            context_collections: self.context.clone(),
        };

        let result = self.refinement.refine(request).await;
        self.is_processing = false;

        match result {
            Ok(outcome) => {
                self.apply_outcome(outcome)?;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                // The turn failed but the conversation stays usable: prior
                // data untouched, one system message describing the failure.
                warn!("refinement turn failed: {}", e);
                self.messages.push(ChatMessage::system(format!(
                    "That message could not be processed ({e}). Your data is unchanged; please try again."
                )));
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn apply_outcome(&mut self, outcome: RefinementOutcome) -> DictationResult<()> {
        let updated = match (&outcome.action, &outcome.updated_structured_data) {
            (RefinementAction::NoChange, _) | (_, None) => self.current_data.clone(),
            (RefinementAction::AppendEntries, Some(incoming)) => match &self.current_data {
                Some(prior) => Some(append_entries(prior, incoming)),
                None => Some(incoming.clone()),
            },
            (RefinementAction::RemoveFields, Some(incoming)) => Some(incoming.clone()),
            (_, Some(incoming)) => match &self.current_data {
                Some(prior) => Some(merge_drafts(prior, incoming)?),
                None => Some(incoming.clone()),
            },
        };

        let assistant_message = {
            let mut message = ChatMessage::assistant(outcome.assistant_reply)
                .with_fields(outcome.fields_extracted);
            if let Some(draft) = &updated {
                message = message.with_draft(draft.clone());
            }
            if let Some(summary) = summarize_action(outcome.action) {
                message = message.with_summary(summary);
            }
            message
        };

        self.messages.push(assistant_message);
        self.current_data = updated;

        Ok(())
    }

    /// Prior user/assistant turns as sent to the refinement collaborator.
    /// Local system notes (failure notices) are not part of the history.
    fn history(&self) -> Vec<HistoryTurn> {
        self.messages
            .iter()
            .filter(|message| message.role != MessageRole::System)
            .map(|message| HistoryTurn {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }

    /// Begin recording a voice message.
    pub async fn start_voice(&mut self) -> DictationResult<()> {
        if self.confirmed {
            return Err(DictationError::InvalidState(
                "session already confirmed",
            ));
        }

        if self.is_processing {
            return Err(DictationError::TurnInFlight);
        }

        self.capture.start().await
    }

    /// Finish recording: transcribe the clip and submit the transcript as a
    /// voice-marked turn.
    pub async fn stop_voice(&mut self) -> DictationResult<()> {
        if self.is_processing {
            return Err(DictationError::TurnInFlight);
        }

        let clip = self.capture.stop().await?;
        let duration = clip.duration_seconds;

        self.is_processing = true;
        let transcribed = self.transcription.transcribe(&clip).await;
        self.is_processing = false;

        match transcribed {
            Ok(outcome) => {
                self.send_turn(outcome.transcript, true, Some(duration))
                    .await
            }
            Err(e) => {
                warn!("voice message transcription failed: {}", e);
                self.messages.push(ChatMessage::system(format!(
                    "The voice message could not be transcribed ({e}). Please try again."
                )));
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Discard an in-progress voice message. Never fails.
    pub async fn cancel_voice(&mut self) {
        self.capture.cancel().await;
    }

    /// Terminal action: hand the running draft back to the consuming form.
    /// Further turns are refused once confirmed; `reset` reopens the session.
    ///
    /// Unresolved entity references do not block this; they are surfaced as
    /// warnings by the caller. Fails only when there is nothing to confirm.
    pub fn confirm(&mut self) -> DictationResult<StructuredDraft> {
        match &self.current_data {
            Some(data) => {
                self.confirmed = true;
                info!("chat session confirmed ({})", self.kind);
                Ok(data.clone())
            }
            None => {
                self.error = Some("no structured data to confirm".to_string());
                Err(DictationError::NothingToConfirm)
            }
        }
    }

    /// Back to the pre-conversation state. An already-confirmed payload
    /// handed to the consumer is unaffected.
    pub async fn reset(&mut self) {
        self.capture.cancel().await;
        self.messages.clear();
        self.current_data = None;
        self.error = None;
        self.is_processing = false;
        self.confirmed = false;
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn current_data(&self) -> Option<&StructuredDraft> {
        self.current_data.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn context(&self) -> &ContextCollections {
        &self.context
    }
}

fn summarize_action(action: RefinementAction) -> Option<String> {
    match action {
        RefinementAction::SetFields => Some("Set fields from your message".to_string()),
        RefinementAction::UpdateFields => Some("Updated fields".to_string()),
        RefinementAction::RemoveFields => Some("Removed fields".to_string()),
        RefinementAction::SetMetadata => Some("Updated details".to_string()),
        RefinementAction::AppendEntries => Some("Added entries".to_string()),
        RefinementAction::NoChange => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioClip, CaptureConfig, CaptureController, ScriptedBackend};
    use crate::error::RecordingError;
    use crate::services::TranscriptionOutcome;

    struct StubServices;

    #[async_trait::async_trait]
    impl TranscriptionService for StubServices {
        async fn transcribe(&self, _clip: &AudioClip) -> DictationResult<TranscriptionOutcome> {
            Err(DictationError::TranscriptionFailed("stub".to_string()))
        }
    }

    #[async_trait::async_trait]
    impl RefinementService for StubServices {
        async fn refine(&self, _request: RefinementRequest) -> DictationResult<RefinementOutcome> {
            Err(DictationError::RefinementFailed("stub".to_string()))
        }
    }

    fn stub_session() -> ChatSession {
        let capture = CaptureController::new(
            Box::new(ScriptedBackend::denied(RecordingError::DeviceUnavailable)),
            CaptureConfig::default(),
        );

        ChatSession::new(
            SessionKind::NewEncounter,
            capture,
            Arc::new(StubServices),
            Arc::new(StubServices),
            ContextCollections::default(),
        )
    }

    #[tokio::test]
    async fn test_in_flight_turn_blocks_new_submissions() {
        let mut session = stub_session();
        session.is_processing = true;

        let err = session
            .send_text("hola")
            .await
            .expect_err("must be rejected");
        assert!(matches!(err, DictationError::TurnInFlight));

        // Rejected before anything was appended
        assert!(session.messages().is_empty());

        let err = session.start_voice().await.expect_err("must be rejected");
        assert!(matches!(err, DictationError::TurnInFlight));
    }
}
