use super::types::StructuredDraft;
use crate::error::DictationResult;
use serde_json::Value;

/// Whether a refinement-supplied value counts as "present" for the merge
/// rule. Null, empty strings and empty arrays do not overwrite prior data.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Field-level overwrite-if-present merge over JSON maps.
///
/// Any field present in `incoming` replaces the prior value; absent fields
/// retain prior values. Nested objects merge recursively. Arrays are
/// replaced wholesale, never concatenated (appends are a separate, explicit
/// refinement action).
pub fn merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, incoming_field) in incoming_map {
                match (base_map.get_mut(key), incoming_field) {
                    (Some(base_field @ Value::Object(_)), Value::Object(_)) => {
                        merge_value(base_field, incoming_field);
                    }
                    _ => {
                        if is_present(incoming_field) {
                            base_map.insert(key.clone(), incoming_field.clone());
                        }
                    }
                }
            }
        }
        (base, incoming) => {
            if is_present(incoming) {
                *base = incoming.clone();
            }
        }
    }
}

/// Merge a refinement response draft into the running draft.
///
/// If the response switched the draft variant (including single ↔ batch
/// shape), the response is authoritative and replaces the prior draft
/// wholesale; otherwise fields merge per [`merge_value`].
pub fn merge_drafts(
    prior: &StructuredDraft,
    incoming: &StructuredDraft,
) -> DictationResult<StructuredDraft> {
    let mut base = serde_json::to_value(prior)?;
    let incoming_value = serde_json::to_value(incoming)?;

    if base.get("kind") != incoming_value.get("kind") {
        return Ok(incoming.clone());
    }

    merge_value(&mut base, &incoming_value);

    Ok(serde_json::from_value(base)?)
}

/// Concatenate batch entries from `incoming` onto `prior`.
///
/// Only meaningful when both sides are the same batch variant; any other
/// combination falls back to taking the incoming draft wholesale.
pub fn append_entries(prior: &StructuredDraft, incoming: &StructuredDraft) -> StructuredDraft {
    use StructuredDraft::*;

    match (prior.clone(), incoming.clone()) {
        (LedgerBatch(mut batch), LedgerBatch(more)) => {
            batch.extend(more.entries);
            LedgerBatch(batch)
        }
        (TaskBatch(mut batch), TaskBatch(more)) => {
            batch.extend(more.entries);
            TaskBatch(batch)
        }
        (AppointmentSlots(mut batch), AppointmentSlots(more)) => {
            batch.extend(more.entries);
            AppointmentSlots(batch)
        }
        (_, other) => other,
    }
}
