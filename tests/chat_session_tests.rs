// Tests for the conversational refinement loop: seeding, merge semantics per
// turn, failure handling, voice turns and confirmation.

mod common;

use clinivoice::chat::{ChatSession, MessageRole};
use clinivoice::draft::{
    Confidence, EncounterDraft, LedgerEntryDraft, SessionKind, StructuredDraft,
};
use clinivoice::error::DictationError;
use clinivoice::services::{ContextCollections, RefinementAction, RefinementOutcome};
use clinivoice::session::SessionDraft;
use common::{silent_capture, MockRefinement, MockTranscription};
use std::collections::BTreeSet;
use std::sync::Arc;

fn seeded_session(refinement: Arc<MockRefinement>) -> ChatSession {
    let transcription = Arc::new(MockTranscription::returning("agrega diagnóstico migraña"));

    let mut session = ChatSession::new(
        SessionKind::NewEncounter,
        silent_capture(1.5),
        transcription,
        refinement,
        ContextCollections::default(),
    );

    session.accept_initial_draft(SessionDraft {
        session_id: "sess-1".to_string(),
        transcript: "paciente con dolor de cabeza".to_string(),
        transcript_id: "tr-1".to_string(),
        structured_data: StructuredDraft::Encounter(EncounterDraft {
            chief_complaint: Some("dolor de cabeza".to_string()),
            ..Default::default()
        }),
        fields_extracted: BTreeSet::from(["chief_complaint".to_string()]),
        fields_empty: BTreeSet::from(["diagnosis".to_string()]),
        confidence: Confidence::Medium,
        audio_duration_seconds: 3.2,
    });

    session
}

fn update_turn(reply: &str, draft: StructuredDraft) -> RefinementOutcome {
    RefinementOutcome {
        assistant_reply: reply.to_string(),
        action: RefinementAction::UpdateFields,
        updated_structured_data: Some(draft),
        fields_extracted: Vec::new(),
    }
}

#[tokio::test]
async fn test_initial_draft_seeds_user_and_assistant_turns() {
    let refinement = Arc::new(MockRefinement::scripted(vec![]));
    let session = seeded_session(refinement);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);

    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "paciente con dolor de cabeza");
    assert!(messages[0].is_voice);
    assert_eq!(messages[0].audio_duration_seconds, Some(3.2));

    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert!(messages[1].structured_data.is_some());

    assert!(session.current_data().is_some());
}

#[tokio::test]
async fn test_turn_merges_present_fields_and_keeps_absent_ones() {
    let refinement = Arc::new(MockRefinement::scripted(vec![Ok(update_turn(
        "Agregué el diagnóstico.",
        StructuredDraft::Encounter(EncounterDraft {
            diagnosis: Some("migraña".to_string()),
            ..Default::default()
        }),
    ))]));

    let mut session = seeded_session(Arc::clone(&refinement));

    session
        .send_text("el diagnóstico es migraña")
        .await
        .expect("turn should succeed");

    let Some(StructuredDraft::Encounter(encounter)) = session.current_data() else {
        panic!("expected encounter draft");
    };

    // New field set, prior field untouched
    assert_eq!(encounter.diagnosis.as_deref(), Some("migraña"));
    assert_eq!(encounter.chief_complaint.as_deref(), Some("dolor de cabeza"));

    // user turn + assistant reply appended in submission order
    let messages = session.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].role, MessageRole::User);
    assert_eq!(messages[3].role, MessageRole::Assistant);
    assert_eq!(messages[3].content, "Agregué el diagnóstico.");
    assert!(!session.is_processing());
}

#[tokio::test]
async fn test_failed_turn_leaves_data_untouched_and_adds_system_note() {
    let refinement = Arc::new(MockRefinement::scripted(vec![Err(
        DictationError::RefinementFailed("mock outage".to_string()),
    )]));

    let mut session = seeded_session(refinement);
    let before = session.current_data().cloned();

    let err = session
        .send_text("cambia algo")
        .await
        .expect_err("turn should fail");
    assert!(matches!(err, DictationError::RefinementFailed(_)));

    // Data untouched, exactly one system note after the user turn
    assert_eq!(session.current_data().cloned(), before);
    let messages = session.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].role, MessageRole::User);
    assert_eq!(messages[3].role, MessageRole::System);
    assert!(session.error().is_some());
    assert!(!session.is_processing());
}

#[tokio::test]
async fn test_conversation_usable_after_failed_turn() {
    let refinement = Arc::new(MockRefinement::scripted(vec![
        Err(DictationError::RefinementFailed("mock outage".to_string())),
        Ok(update_turn(
            "Listo.",
            StructuredDraft::Encounter(EncounterDraft {
                diagnosis: Some("migraña".to_string()),
                ..Default::default()
            }),
        )),
    ]));

    let mut session = seeded_session(refinement);

    let _ = session.send_text("cambia algo").await;
    session
        .send_text("cambia algo")
        .await
        .expect("retry should succeed");

    let Some(StructuredDraft::Encounter(encounter)) = session.current_data() else {
        panic!("expected encounter draft");
    };
    assert_eq!(encounter.diagnosis.as_deref(), Some("migraña"));
    assert!(session.error().is_none());
}

#[tokio::test]
async fn test_history_sent_to_refinement_excludes_system_notes() {
    let refinement = Arc::new(MockRefinement::scripted(vec![
        Err(DictationError::RefinementFailed("mock outage".to_string())),
        Ok(update_turn(
            "Listo.",
            StructuredDraft::Encounter(EncounterDraft::default()),
        )),
    ]));

    let mut session = seeded_session(Arc::clone(&refinement));

    let _ = session.send_text("primero").await;
    let _ = session.send_text("segundo").await;

    let requests = refinement.requests.lock().expect("requests lock");
    let history = &requests[1].conversation_history;
    assert!(history
        .iter()
        .all(|turn| turn.role != MessageRole::System));
}

#[tokio::test]
async fn test_append_action_concatenates_batch_entries() {
    let prior_entry = LedgerEntryDraft {
        description: Some("compra de insumos".to_string()),
        amount: Some(120.0),
        ..Default::default()
    };
    let new_entry = LedgerEntryDraft {
        description: Some("pago de renta".to_string()),
        amount: Some(800.0),
        ..Default::default()
    };

    let refinement = Arc::new(MockRefinement::scripted(vec![Ok(RefinementOutcome {
        assistant_reply: "Agregué otro movimiento.".to_string(),
        action: RefinementAction::AppendEntries,
        updated_structured_data: Some(StructuredDraft::LedgerBatch(
            clinivoice::draft::BatchDraft::new(vec![new_entry.clone()]),
        )),
        fields_extracted: Vec::new(),
    })]));

    let transcription = Arc::new(MockTranscription::returning(""));
    let mut session = ChatSession::new(
        SessionKind::LedgerEntry,
        silent_capture(1.0),
        transcription,
        refinement,
        ContextCollections::default(),
    );

    session.accept_initial_draft(SessionDraft {
        session_id: "sess-9".to_string(),
        transcript: "registra una compra de insumos".to_string(),
        transcript_id: "tr-9".to_string(),
        structured_data: StructuredDraft::LedgerBatch(clinivoice::draft::BatchDraft::new(vec![
            prior_entry.clone(),
        ])),
        fields_extracted: BTreeSet::new(),
        fields_empty: BTreeSet::new(),
        confidence: Confidence::High,
        audio_duration_seconds: 2.0,
    });

    session
        .send_text("agrega el pago de renta")
        .await
        .expect("turn should succeed");

    let Some(StructuredDraft::LedgerBatch(batch)) = session.current_data() else {
        panic!("expected ledger batch");
    };
    assert_eq!(batch.total_count(), 2);
    assert_eq!(batch.entries[0], prior_entry);
    assert_eq!(batch.entries[1], new_entry);
}

#[tokio::test]
async fn test_voice_turn_transcribes_and_marks_message() {
    let refinement = Arc::new(MockRefinement::scripted(vec![Ok(update_turn(
        "Anotado.",
        StructuredDraft::Encounter(EncounterDraft {
            diagnosis: Some("migraña".to_string()),
            ..Default::default()
        }),
    ))]));

    let mut session = seeded_session(refinement);

    session.start_voice().await.expect("start voice");
    assert!(session.is_recording());

    session.stop_voice().await.expect("voice turn");

    let messages = session.messages();
    let user_turn = &messages[2];
    assert_eq!(user_turn.role, MessageRole::User);
    assert_eq!(user_turn.content, "agrega diagnóstico migraña");
    assert!(user_turn.is_voice);
    assert!(user_turn.audio_duration_seconds.unwrap_or(0.0) > 1.0);
}

#[tokio::test]
async fn test_cancelled_voice_message_adds_nothing() {
    let refinement = Arc::new(MockRefinement::scripted(vec![]));
    let mut session = seeded_session(refinement);

    session.start_voice().await.expect("start voice");
    session.cancel_voice().await;

    assert!(!session.is_recording());
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test]
async fn test_confirm_returns_current_data_verbatim() {
    let refinement = Arc::new(MockRefinement::scripted(vec![]));
    let mut session = seeded_session(refinement);

    let expected = session.current_data().cloned().expect("data present");
    let confirmed = session.confirm().expect("confirm should succeed");

    assert_eq!(confirmed, expected);
    assert!(session.is_confirmed());
}

#[tokio::test]
async fn test_confirmed_session_refuses_further_turns() {
    let refinement = Arc::new(MockRefinement::scripted(vec![]));
    let mut session = seeded_session(refinement);

    session.confirm().expect("confirm should succeed");
    let messages_before = session.messages().len();

    let err = session
        .send_text("cambia el diagnóstico")
        .await
        .expect_err("turn after confirm should fail");
    assert!(matches!(err, DictationError::InvalidState(_)));
    assert_eq!(session.messages().len(), messages_before);

    let err = session.start_voice().await.expect_err("voice after confirm");
    assert!(matches!(err, DictationError::InvalidState(_)));

    // Reset reopens the session for a new conversation
    session.reset().await;
    assert!(!session.is_confirmed());
}

#[tokio::test]
async fn test_confirm_without_data_fails() {
    let refinement = Arc::new(MockRefinement::scripted(vec![]));
    let transcription = Arc::new(MockTranscription::returning(""));

    let mut session = ChatSession::new(
        SessionKind::NewEncounter,
        silent_capture(1.0),
        transcription,
        refinement,
        ContextCollections::default(),
    );

    let err = session.confirm().expect_err("confirm should fail");
    assert!(matches!(err, DictationError::NothingToConfirm));
    assert!(session.error().is_some());
}

#[tokio::test]
async fn test_reset_clears_conversation() {
    let refinement = Arc::new(MockRefinement::scripted(vec![]));
    let mut session = seeded_session(refinement);

    session.reset().await;

    assert!(session.messages().is_empty());
    assert!(session.current_data().is_none());
    assert!(session.error().is_none());
    assert!(!session.is_processing());
}
