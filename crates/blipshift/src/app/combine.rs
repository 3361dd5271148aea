//! Merging several documents into one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::discovery::SourceFile;
use crate::app::extract::{self, ExtractionRules};
use crate::domain::document::Document;
use crate::domain::errors::DomainError;
use crate::domain::model::DocumentId;
use crate::infra::xml::{self, Declaration};

/// Build a document under a fresh `root_name` element holding, in order, every top-level child
/// of each input document. The inputs are consumed.
pub fn combine(documents: Vec<Document>, root_name: &str) -> Result<Document, DomainError> {
    if documents.is_empty() {
        return Err(DomainError::EmptySelection("documents to combine"));
    }

    let mut combined = Document::new(root_name);
    let root = combined.root();
    for document in &documents {
        for &child in document.children(document.root()) {
            combined.import(root, document, child);
        }
    }
    Ok(combined)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineSummary {
    pub output: PathBuf,
    pub files: usize,
    pub records: usize,
}

/// Parse `sources`, combine them and write the result to `output` without an XML declaration.
///
/// Fails before writing anything when none of the files holds a record.
pub fn combine_files(
    sources: &[SourceFile],
    rules: &ExtractionRules,
    root_name: &str,
    output: &Path,
) -> Result<CombineSummary> {
    if sources.is_empty() {
        return Err(DomainError::EmptySelection("files to combine").into());
    }

    let mut documents = Vec::with_capacity(sources.len());
    let mut records = 0;
    for (index, source) in sources.iter().enumerate() {
        let document = xml::read(&source.path)?;
        records += extract::extract(&document, DocumentId(index), &source.display_name, rules)?
            .len();
        documents.push(document);
    }
    if records == 0 {
        return Err(DomainError::EmptySelection("records to combine").into());
    }

    let combined = combine(documents, root_name)?;
    xml::write(&combined, output, Declaration::Omit)
        .with_context(|| format!("failed to save combined file {}", output.display()))?;
    tracing::info!(
        path = %output.display(),
        files = sources.len(),
        records,
        "combined documents"
    );

    Ok(CombineSummary {
        output: output.to_path_buf(),
        files: sources.len(),
        records,
    })
}
