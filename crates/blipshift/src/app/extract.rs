//! Record extraction from parsed documents.

use std::collections::BTreeSet;

use crate::domain::document::{CoordinateFields, Document, HasCoordinates, NodeId};
use crate::domain::errors::DomainError;
use crate::domain::model::{CoordinateRecord, DocumentId, Vec3};
use crate::infra::config::Config;

/// Which fields make a node a record and which names are never extracted.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub fields: CoordinateFields,
    pub name_field: String,
    pub denylist: BTreeSet<String>,
}

impl ExtractionRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fields: config.extraction.fields(),
            name_field: config.extraction.name_field.clone(),
            denylist: config.extraction.denylist.iter().cloned().collect(),
        }
    }

    pub fn is_denied(&self, name: &str) -> bool {
        self.denylist.contains(name)
    }
}

/// Collect a record for every element with all three coordinate fields below it.
///
/// Elements below the root are visited depth-first in document order. The field lookup has no
/// depth limit, so a container and the element inside it that owns the fields both qualify.
/// Any unparsable field aborts the whole file.
pub fn extract(
    document: &Document,
    document_id: DocumentId,
    file: &str,
    rules: &ExtractionRules,
) -> Result<Vec<CoordinateRecord>, DomainError> {
    let mut records = Vec::new();

    let root = document.root();
    for node in document.elements().filter(|node| *node != root) {
        let Some(fields) = document.coordinate_fields(node, &rules.fields) else {
            continue;
        };

        let name = resolve_name(document, node, &rules.name_field);
        if rules.is_denied(&name) {
            tracing::trace!(%name, file, "skipping denylisted node");
            continue;
        }

        let position = read_position(document, fields, &rules.fields, file)?;
        records.push(CoordinateRecord {
            name,
            position,
            file: file.to_owned(),
            document: document_id,
            node,
        });
    }

    tracing::debug!(file, count = records.len(), "extracted records");
    Ok(records)
}

fn resolve_name(document: &Document, node: NodeId, name_field: &str) -> String {
    document
        .find_descendant(node, name_field)
        .and_then(|name| document.text(name))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| document.name(node))
        .unwrap_or_default()
        .to_owned()
}

pub(crate) fn read_position(
    document: &Document,
    fields: [NodeId; 3],
    names: &CoordinateFields,
    file: &str,
) -> Result<Vec3, DomainError> {
    let mut values = [0.0; 3];
    for ((value, field), name) in values.iter_mut().zip(fields).zip(names.names()) {
        let raw = document.text(field).unwrap_or_default();
        *value = raw.trim().parse().map_err(|_| DomainError::Parse {
            file: file.to_owned(),
            field: name.to_owned(),
            value: raw.to_owned(),
        })?;
    }
    Ok(Vec3::from(values))
}
