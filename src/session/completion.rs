/// Duplicate-completion suppressor.
///
/// The consumer must act on `draft_ready` exactly once per structuring
/// session id, but delayed re-renders can deliver the same ready draft
/// again. The guard tracks the last session id that completed and
/// short-circuits repeats: an explicit idempotency key, checked before the
/// completion side effect runs, separate from the state machine itself.
#[derive(Debug, Default)]
pub struct CompletionGuard {
    last_completed: Option<String>,
}

impl CompletionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once per session id; repeats are suppressed.
    pub fn try_complete(&mut self, session_id: &str) -> bool {
        if self.last_completed.as_deref() == Some(session_id) {
            return false;
        }

        self.last_completed = Some(session_id.to_string());
        true
    }

    pub fn last_completed(&self) -> Option<&str> {
        self.last_completed.as_deref()
    }
}
