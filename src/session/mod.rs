pub mod completion;
pub mod session;

pub use completion::CompletionGuard;
pub use session::{SessionDraft, SessionStatus, VoiceSession};
