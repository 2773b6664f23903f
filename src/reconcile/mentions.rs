use super::directory::EntityKind;
use crate::draft::StructuredDraft;

/// Free-text entity names referenced inside a draft, paired with the
/// collection each should resolve against.
///
/// This is what the consuming page feeds to the [`super::Reconciler`] before
/// handing the confirmed payload to its form.
pub fn entity_mentions(draft: &StructuredDraft) -> Vec<(EntityKind, String)> {
    let mut mentions = Vec::new();

    let mut push = |kind: EntityKind, name: &Option<String>| {
        if let Some(name) = name {
            if !name.trim().is_empty() {
                mentions.push((kind, name.clone()));
            }
        }
    };

    match draft {
        StructuredDraft::Patient(_) | StructuredDraft::Task(_) | StructuredDraft::TaskBatch(_) => {}

        StructuredDraft::Encounter(encounter) => {
            push(EntityKind::Patient, &encounter.patient_name);
        }

        StructuredDraft::Prescription(prescription) => {
            push(EntityKind::Patient, &prescription.patient_name);
        }

        StructuredDraft::AppointmentSlots(batch) => {
            for slot in &batch.entries {
                push(EntityKind::Patient, &slot.patient_name);
            }
        }

        StructuredDraft::LedgerEntry(entry) => {
            push(EntityKind::Client, &entry.counterparty_name);
        }

        StructuredDraft::LedgerBatch(batch) => {
            for entry in &batch.entries {
                push(EntityKind::Client, &entry.counterparty_name);
            }
        }

        StructuredDraft::Sale(sale) => {
            push(EntityKind::Client, &sale.client_name);
            for item in &sale.items {
                push(EntityKind::Product, &item.product_name);
            }
        }

        StructuredDraft::Purchase(purchase) => {
            push(EntityKind::Supplier, &purchase.supplier_name);
            for item in &purchase.items {
                push(EntityKind::Product, &item.product_name);
            }
        }
    }

    mentions
}
