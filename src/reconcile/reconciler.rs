use super::directory::{Candidate, CreateOutcome, EntityDirectory, EntityKind, NewEntity};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// A reconciled entity reference.
///
/// A name is never silently dropped: when no match and no creation
/// happened, the raw name is carried through as `Unresolved` and must
/// surface to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRef {
    Existing { id: u64 },
    Unresolved { raw_name: String },
}

impl EntityRef {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Existing { .. })
    }
}

/// Case-insensitive substring match of an extracted name against each
/// candidate's primary name and, if present, its secondary contact name.
///
/// First hit in original collection order wins; ties are deliberately not
/// disambiguated further.
pub fn match_first(name: &str, candidates: &[Candidate]) -> Option<u64> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    candidates
        .iter()
        .find(|candidate| {
            candidate.primary_name.to_lowercase().contains(&needle)
                || candidate
                    .secondary_name
                    .as_deref()
                    .is_some_and(|secondary| secondary.to_lowercase().contains(&needle))
        })
        .map(|candidate| candidate.id)
}

/// Resolves free-text entity names extracted by structuring into references
/// to existing records, or materializes new ones where the domain allows it.
///
/// Pure client-side matching over collections the consuming page already
/// fetched; the directory is only hit for creation and for the single
/// refetch after a creation conflict.
pub struct Reconciler {
    directory: Arc<dyn EntityDirectory>,
}

impl Reconciler {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Match-only resolution against an in-memory collection.
    pub fn resolve(&self, raw_name: &str, candidates: &[Candidate]) -> EntityRef {
        match match_first(raw_name, candidates) {
            Some(id) => EntityRef::Existing { id },
            None => EntityRef::Unresolved {
                raw_name: raw_name.to_string(),
            },
        }
    }

    /// Resolve a name, creating the entity when the domain allows it.
    ///
    /// On a creation conflict (another actor created the same entity first)
    /// the candidate collection is refetched and the match retried exactly
    /// once; a still-unmatched name comes back as `Unresolved` rather than
    /// an error.
    pub async fn resolve_or_create(
        &self,
        kind: EntityKind,
        raw_name: &str,
        candidates: &[Candidate],
        seed: NewEntity,
    ) -> Result<EntityRef> {
        if let Some(id) = match_first(raw_name, candidates) {
            return Ok(EntityRef::Existing { id });
        }

        if !kind.allows_auto_create() {
            return Ok(EntityRef::Unresolved {
                raw_name: raw_name.to_string(),
            });
        }

        info!("no {} match for '{}', creating", kind, raw_name);

        match self.directory.create(kind, seed).await? {
            CreateOutcome::Created(candidate) => Ok(EntityRef::Existing { id: candidate.id }),
            CreateOutcome::Conflict => {
                warn!(
                    "create conflict for {} '{}', refetching and retrying match once",
                    kind, raw_name
                );

                let refreshed = self.directory.list(kind).await?;

                match match_first(raw_name, &refreshed) {
                    Some(id) => Ok(EntityRef::Existing { id }),
                    None => Ok(EntityRef::Unresolved {
                        raw_name: raw_name.to_string(),
                    }),
                }
            }
        }
    }
}
