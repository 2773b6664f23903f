use crate::audio::CaptureConfig;
use crate::chat::ChatSession;
use crate::reconcile::EntityDirectory;
use crate::services::{RefinementService, StructuringService, TranscriptionService};
use crate::session::CompletionGuard;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active chat sessions (session id → session)
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ChatSession>>>>>,

    /// Suppresses duplicate completion of the same structuring session
    pub completion: Arc<Mutex<CompletionGuard>>,

    /// Capture format from the `[audio]` config section, applied to the
    /// controller embedded in every session this server opens
    pub capture_config: CaptureConfig,

    pub transcription: Arc<dyn TranscriptionService>,
    pub structuring: Arc<dyn StructuringService>,
    pub refinement: Arc<dyn RefinementService>,
    pub directory: Arc<dyn EntityDirectory>,
}

impl AppState {
    pub fn new(
        capture_config: CaptureConfig,
        transcription: Arc<dyn TranscriptionService>,
        structuring: Arc<dyn StructuringService>,
        refinement: Arc<dyn RefinementService>,
        directory: Arc<dyn EntityDirectory>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            completion: Arc::new(Mutex::new(CompletionGuard::new())),
            capture_config,
            transcription,
            structuring,
            refinement,
            directory,
        }
    }
}
