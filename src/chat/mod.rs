pub mod message;
pub mod session;

pub use message::{ChatMessage, MessageRole};
pub use session::ChatSession;
