//! Offset computation and application.

use crate::domain::document::{CoordinateFields, Document, HasCoordinates};
use crate::domain::errors::DomainError;
use crate::domain::model::{CoordinateRecord, OffsetVector, Vec3};

/// Translation that moves `record` onto `reference`.
pub fn compute_offset(record: &CoordinateRecord, reference: Vec3) -> OffsetVector {
    let delta = reference - record.position;
    OffsetVector {
        delta,
        distance: delta.length(),
    }
}

/// Shift `record` by `delta` and write the new coordinates into its node in `document`.
///
/// `document` must be the document the record was extracted from.
pub fn apply_offset(
    record: &mut CoordinateRecord,
    document: &mut Document,
    delta: Vec3,
    fields: &CoordinateFields,
) -> Result<(), DomainError> {
    let nodes = document
        .coordinate_fields(record.node, fields)
        .ok_or_else(|| DomainError::UnresolvedRecord {
            name: record.name.clone(),
        })?;

    record.position += delta;
    for (node, value) in nodes.into_iter().zip(record.position.components()) {
        document.set_text(node, format_coordinate(value));
    }
    Ok(())
}

/// Shortest text that parses back to exactly `value`.
pub fn format_coordinate(value: f64) -> String {
    value.to_string()
}
