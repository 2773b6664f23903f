pub mod contracts;
pub mod http;

pub use contracts::{
    ContextCollections, HistoryTurn, RefinementAction, RefinementOutcome, RefinementRequest,
    RefinementService, StructuringOutcome, StructuringRequest, StructuringService,
    TranscriptionOutcome, TranscriptionService,
};
pub use http::HttpCollaborators;
