use crate::audio::AudioClip;
use crate::chat::MessageRole;
use crate::draft::{Confidence, SessionKind, StructuredDraft};
use crate::error::DictationResult;
use crate::reconcile::{Candidate, EntityKind};
use serde::{Deserialize, Serialize};

/// Result of one transcription call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionOutcome {
    pub transcript: String,
    pub transcript_id: String,
}

/// Transcription collaborator: audio artifact in, transcript out.
///
/// There is no cancellation once a call has been issued; the caller waits
/// for success or failure.
#[async_trait::async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> DictationResult<TranscriptionOutcome>;
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuringRequest {
    pub transcript: String,
    pub session_type: SessionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_structured_data: Option<StructuredDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuringOutcome {
    /// Opaque token assigned by the structuring collaborator
    pub session_id: String,
    pub structured_data: StructuredDraft,
    pub confidence: Confidence,
    pub fields_extracted: Vec<String>,
}

/// Structuring collaborator: transcript in, typed partially-populated draft
/// out. Decides batch-vs-single shape; the client never infers it.
#[async_trait::async_trait]
pub trait StructuringService: Send + Sync {
    async fn structure(&self, request: StructuringRequest) -> DictationResult<StructuringOutcome>;
}

/// One prior conversation turn, as sent to the refinement collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Candidate collections the consuming page already fetched, passed along so
/// the refinement model can ground entity mentions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextCollections {
    pub clients: Vec<Candidate>,
    pub suppliers: Vec<Candidate>,
    pub patients: Vec<Candidate>,
    pub products: Vec<Candidate>,
}

impl ContextCollections {
    pub fn for_kind(&self, kind: EntityKind) -> &[Candidate] {
        match kind {
            EntityKind::Client => &self.clients,
            EntityKind::Supplier => &self.suppliers,
            EntityKind::Patient => &self.patients,
            EntityKind::Product => &self.products,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinementRequest {
    pub conversation_history: Vec<HistoryTurn>,
    pub new_user_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_structured_data: Option<StructuredDraft>,
    pub session_type: SessionKind,
    pub context_collections: ContextCollections,
}

/// What a refinement turn did to the running draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementAction {
    SetFields,
    UpdateFields,
    RemoveFields,
    SetMetadata,
    /// Concatenate batch entries instead of replacing the list
    AppendEntries,
    NoChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementOutcome {
    /// Natural-language assistant reply to display
    pub assistant_reply: String,
    pub action: RefinementAction,
    #[serde(default)]
    pub updated_structured_data: Option<StructuredDraft>,
    #[serde(default)]
    pub fields_extracted: Vec<String>,
}

/// Refinement collaborator: one chat turn against the running draft.
#[async_trait::async_trait]
pub trait RefinementService: Send + Sync {
    async fn refine(&self, request: RefinementRequest) -> DictationResult<RefinementOutcome>;
}
