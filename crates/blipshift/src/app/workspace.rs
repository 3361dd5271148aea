//! Documents and records loaded for a single operation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::app::discovery::SourceFile;
use crate::app::extract::{self, ExtractionRules};
use crate::app::materialize;
use crate::app::offset;
use crate::domain::document::Document;
use crate::domain::errors::DomainError;
use crate::domain::model::{CoordinateRecord, DocumentId, OffsetVector, Vec3};
use crate::infra::xml;

/// A parsed source file owned by the working set.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub source: SourceFile,
    pub document: Document,
    modified: bool,
}

impl LoadedFile {
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// The documents selected for one operation together with every record extracted from them.
///
/// Records reference documents by [`DocumentId`]; the working set owns both, so an edit made
/// through any record lands in the single copy of its document.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    files: Vec<LoadedFile>,
    records: Vec<CoordinateRecord>,
    rules: ExtractionRules,
}

impl WorkingSet {
    /// Parse and extract every file, in the given order.
    pub fn load(sources: &[SourceFile], rules: ExtractionRules) -> Result<Self> {
        let mut documents = Vec::with_capacity(sources.len());
        for source in sources {
            let document = xml::read(&source.path)?;
            documents.push((source.clone(), document));
        }
        Ok(Self::from_documents(documents, rules)?)
    }

    /// Build a working set from already parsed documents.
    pub fn from_documents(
        documents: Vec<(SourceFile, Document)>,
        rules: ExtractionRules,
    ) -> Result<Self, DomainError> {
        let mut files = Vec::with_capacity(documents.len());
        let mut records = Vec::new();
        for (index, (source, document)) in documents.into_iter().enumerate() {
            records.extend(extract::extract(
                &document,
                DocumentId(index),
                &source.display_name,
                &rules,
            )?);
            files.push(LoadedFile {
                source,
                document,
                modified: false,
            });
        }

        tracing::debug!(
            files = files.len(),
            records = records.len(),
            "working set loaded"
        );
        Ok(Self {
            files,
            records,
            rules,
        })
    }

    pub fn records(&self) -> &[CoordinateRecord] {
        &self.records
    }

    pub fn files(&self) -> &[LoadedFile] {
        &self.files
    }

    /// File names that have at least one record, in order of first appearance.
    pub fn record_files(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.file.as_str()) {
                seen.push(record.file.as_str());
            }
        }
        seen
    }

    /// Indices of every record belonging to one of `files`.
    pub fn indices_for_files(&self, files: &[&str]) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| files.contains(&record.file.as_str()))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn compute_offset(&self, index: usize, reference: Vec3) -> Result<OffsetVector, DomainError> {
        let record = self.records.get(index).ok_or_else(|| missing_record(index))?;
        Ok(offset::compute_offset(record, reference))
    }

    /// Apply `delta` to each selected record once, in index order.
    pub fn apply_offset(&mut self, selection: &[usize], delta: Vec3) -> Result<(), DomainError> {
        if selection.is_empty() {
            return Err(DomainError::EmptySelection("records to offset"));
        }

        let unique: BTreeSet<usize> = selection.iter().copied().collect();
        for index in unique {
            let record = self
                .records
                .get_mut(index)
                .ok_or_else(|| missing_record(index))?;
            let file = &mut self.files[record.document.index()];
            offset::apply_offset(record, &mut file.document, delta, &self.rules.fields)?;
            file.modified = true;
        }
        Ok(())
    }

    /// Write each modified document once to its suffixed path and return the written paths.
    pub fn save_modified(&mut self, suffix: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for file in self.files.iter_mut().filter(|file| file.modified) {
            let path = materialize::save_as_new(&file.document, &file.source.path, suffix)
                .with_context(|| format!("failed to save {}", file.source.display_name))?;
            file.modified = false;
            written.push(path);
        }
        Ok(written)
    }
}

fn missing_record(index: usize) -> DomainError {
    DomainError::Validation(format!("record {} does not exist", index + 1))
}
