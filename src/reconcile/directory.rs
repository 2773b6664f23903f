use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Domain entity collections a free-text name can resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Supplier,
    Patient,
    Product,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Supplier => "supplier",
            Self::Patient => "patient",
            Self::Product => "product",
        }
    }

    /// Whether an unmatched name may be materialized as a new record.
    /// Currently only billing clients are auto-created (from patient data).
    pub fn allows_auto_create(&self) -> bool {
        matches!(self, Self::Client)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a candidate collection the consuming page already fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,

    /// Primary display name (business name, full name, product name)
    pub primary_name: String,

    /// Secondary contact-name field, when the record has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_name: Option<String>,
}

impl Candidate {
    pub fn new(id: u64, primary_name: impl Into<String>) -> Self {
        Self {
            id,
            primary_name: primary_name.into(),
            secondary_name: None,
        }
    }

    pub fn with_secondary(mut self, secondary_name: impl Into<String>) -> Self {
        self.secondary_name = Some(secondary_name.into());
        self
    }
}

/// Minimal derivable fields for creating an entity from extracted data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl NewEntity {
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: None,
            phone: None,
        }
    }
}

/// Result of a create request against the entity API
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// 201: the new entity
    Created(Candidate),
    /// 409: another actor created the same entity first
    Conflict,
}

/// Entity lookup/creation API boundary.
///
/// `list` re-fetches a candidate collection (used on conflict); `create`
/// issues the standard create request whose 201/409 split drives the
/// reconciler's retry path.
#[async_trait::async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Candidate>>;

    async fn create(&self, kind: EntityKind, entity: NewEntity) -> Result<CreateOutcome>;
}
