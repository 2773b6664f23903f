pub mod batch;
pub mod merge;
pub mod types;

pub use batch::{BatchDraft, BatchEntry};
pub use merge::{append_entries, merge_drafts, merge_value};
pub use types::{
    partition_fields, AppointmentSlotDraft, Confidence, EncounterDraft, LedgerDirection,
    LedgerEntryDraft, LineItemDraft, MedicationDraft, PatientDraft, PrescriptionDraft,
    PurchaseDraft, SaleDraft, SessionKind, StructuredDraft, TaskDraft, TaskPriority,
};
