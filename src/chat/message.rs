use crate::draft::StructuredDraft;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One turn in a refinement conversation.
///
/// Messages are append-only and never mutated after creation; the draft a
/// message carries may be superseded by a later message's data, but the
/// message itself stays as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    /// Draft snapshot carried by assistant messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<StructuredDraft>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_extracted: Vec<String>,

    /// Human-readable description of what the turn changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_summary: Option<String>,

    /// Whether this user turn arrived as a voice message
    #[serde(default)]
    pub is_voice: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_duration_seconds: Option<f64>,
}

impl ChatMessage {
    fn base(role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
            structured_data: None,
            fields_extracted: Vec::new(),
            action_summary: None,
            is_voice: false,
            audio_duration_seconds: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::base(MessageRole::User, content.into())
    }

    pub fn voice_user(content: impl Into<String>, audio_duration_seconds: f64) -> Self {
        let mut message = Self::base(MessageRole::User, content.into());
        message.is_voice = true;
        message.audio_duration_seconds = Some(audio_duration_seconds);
        message
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::base(MessageRole::Assistant, content.into())
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::base(MessageRole::System, content.into())
    }

    pub fn with_draft(mut self, draft: StructuredDraft) -> Self {
        self.structured_data = Some(draft);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields_extracted = fields;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.action_summary = Some(summary.into());
        self
    }
}
