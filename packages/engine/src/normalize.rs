use field_core::{FieldTypeError, FieldTypeRegistry};
use serde_json::Value;

use crate::entity::field;
use crate::error::EngineError;

/// Normalize a raw value through the field's type before storage.
///
/// Repeater values get two passes: the repeater type validates the row
/// structure, then each cell is normalized through its child definition.
/// Fields whose type is no longer registered pass values through untouched;
/// a row must stay writable even after its custom type was uninstalled.
pub fn normalize_for_field(
    registry: &FieldTypeRegistry,
    field: &field::Model,
    children: &[field::Model],
    raw: &Value,
) -> Result<Value, EngineError> {
    let Some(field_type) = registry.get(&field.field_type) else {
        return Ok(raw.clone());
    };
    let normalized = field_type.normalize(raw, &field.config)?;

    if field.field_type != "repeater" || normalized.is_null() {
        return Ok(normalized);
    }

    let rows = normalized.as_array().cloned().unwrap_or_default();
    let mut out_rows = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        // Row objects are guaranteed by the repeater's own normalize.
        let mut cells = row.as_object().cloned().unwrap_or_default();
        for child in children {
            let Some(cell) = cells.get(&child.slug) else {
                continue;
            };
            let Some(child_type) = registry.get(&child.field_type) else {
                continue;
            };
            let normalized_cell =
                child_type
                    .normalize(cell, &child.config)
                    .map_err(|e| match e {
                        FieldTypeError::InvalidValue(msg) => FieldTypeError::InvalidValue(
                            format!("row {i}, cell '{}': {msg}", child.slug),
                        ),
                        other => other,
                    })?;
            cells.insert(child.slug.clone(), normalized_cell);
        }
        out_rows.push(Value::Object(cells));
    }
    Ok(Value::Array(out_rows))
}
