use super::batch::BatchDraft;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which domain schema a voice/chat session targets.
///
/// Decides both the draft variant the structuring service returns and the
/// form that ultimately consumes the confirmed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    NewPatient,
    NewEncounter,
    NewPrescription,
    ScheduleAppointments,
    LedgerEntry,
    CreateSale,
    CreatePurchase,
    CreateTask,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewPatient => "new_patient",
            Self::NewEncounter => "new_encounter",
            Self::NewPrescription => "new_prescription",
            Self::ScheduleAppointments => "schedule_appointments",
            Self::LedgerEntry => "ledger_entry",
            Self::CreateSale => "create_sale",
            Self::CreatePurchase => "create_purchase",
            Self::CreateTask => "create_task",
        }
    }

    /// Declared top-level field set for this kind's draft.
    ///
    /// Every declared field lands in exactly one of the extracted/empty sets
    /// reported on a session.
    pub fn declared_fields(&self) -> &'static [&'static str] {
        match self {
            Self::NewPatient => &[
                "full_name",
                "email",
                "phone",
                "birth_date",
                "gender",
                "address",
                "notes",
            ],
            Self::NewEncounter => &[
                "patient_name",
                "chief_complaint",
                "diagnosis",
                "treatment_plan",
                "weight_kg",
                "temperature_c",
                "notes",
            ],
            Self::NewPrescription => &["patient_name", "diagnosis", "medications", "notes"],
            Self::ScheduleAppointments => &["entries"],
            Self::LedgerEntry => &[
                "date",
                "description",
                "amount",
                "direction",
                "category",
                "counterparty_name",
            ],
            Self::CreateSale => &["client_name", "items", "payment_method", "notes"],
            Self::CreatePurchase => &["supplier_name", "items", "invoice_number", "notes"],
            Self::CreateTask => &["title", "description", "due_date", "priority", "assignee"],
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse quality signal reported by the structuring service, never locally
/// computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientDraft {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterDraft {
    pub patient_name: Option<String>,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub weight_kg: Option<f64>,
    pub temperature_c: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationDraft {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<u32>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrescriptionDraft {
    pub patient_name: Option<String>,
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationDraft>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentSlotDraft {
    pub date: Option<String>,
    pub time: Option<String>,
    pub patient_name: Option<String>,
    pub reason: Option<String>,
    pub duration_minutes: Option<u32>,
}

/// Ledger movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerDirection {
    Income,
    Expense,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerEntryDraft {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub direction: Option<LedgerDirection>,
    pub category: Option<String>,
    pub counterparty_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemDraft {
    pub product_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleDraft {
    pub client_name: Option<String>,
    pub items: Vec<LineItemDraft>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseDraft {
    pub supplier_name: Option<String>,
    pub items: Vec<LineItemDraft>,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
}

/// The structured payload a session converges on, tagged by session type.
///
/// Batch-vs-single shape is part of the wire tag: the structuring service
/// decides it, the client never infers it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StructuredDraft {
    Patient(PatientDraft),
    Encounter(EncounterDraft),
    Prescription(PrescriptionDraft),
    AppointmentSlots(BatchDraft<AppointmentSlotDraft>),
    LedgerEntry(LedgerEntryDraft),
    LedgerBatch(BatchDraft<LedgerEntryDraft>),
    Sale(SaleDraft),
    Purchase(PurchaseDraft),
    Task(TaskDraft),
    TaskBatch(BatchDraft<TaskDraft>),
}

impl StructuredDraft {
    /// Session type this draft belongs to (batch and single variants of the
    /// same domain map to the same kind).
    pub fn session_kind(&self) -> SessionKind {
        match self {
            Self::Patient(_) => SessionKind::NewPatient,
            Self::Encounter(_) => SessionKind::NewEncounter,
            Self::Prescription(_) => SessionKind::NewPrescription,
            Self::AppointmentSlots(_) => SessionKind::ScheduleAppointments,
            Self::LedgerEntry(_) | Self::LedgerBatch(_) => SessionKind::LedgerEntry,
            Self::Sale(_) => SessionKind::CreateSale,
            Self::Purchase(_) => SessionKind::CreatePurchase,
            Self::Task(_) | Self::TaskBatch(_) => SessionKind::CreateTask,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            Self::AppointmentSlots(_) | Self::LedgerBatch(_) | Self::TaskBatch(_)
        )
    }
}

/// Partition the declared field set of `kind` into (extracted, empty) given
/// the field names the structuring service reported as extracted.
///
/// Unknown names from the service are dropped; every declared field ends up
/// in exactly one of the two sets.
pub fn partition_fields(
    kind: SessionKind,
    extracted: &[String],
) -> (BTreeSet<String>, BTreeSet<String>) {
    let declared = kind.declared_fields();

    let extracted_set: BTreeSet<String> = declared
        .iter()
        .filter(|field| extracted.iter().any(|name| name == *field))
        .map(|field| field.to_string())
        .collect();

    let empty_set: BTreeSet<String> = declared
        .iter()
        .filter(|field| !extracted_set.contains(**field))
        .map(|field| field.to_string())
        .collect();

    (extracted_set, empty_set)
}
