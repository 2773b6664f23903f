pub mod directory;
pub mod mentions;
pub mod reconciler;

pub use directory::{Candidate, CreateOutcome, EntityDirectory, EntityKind, NewEntity};
pub use mentions::entity_mentions;
pub use reconciler::{match_first, EntityRef, Reconciler};
