//! Writing edited documents and promoting them over their originals.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::app::discovery::{self, DiscoveryConfig};
use crate::domain::document::Document;
use crate::domain::errors::DomainError;
use crate::infra::xml::{self, Declaration};

/// `dir/name.xml` becomes `dir/name<suffix>.xml`.
pub fn fixed_path(original: &Path, suffix: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match original.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    original.with_file_name(name)
}

/// Whether `path` is itself the output of [`save_as_new`] for some other file.
pub fn is_fixed_variant(path: &Path, suffix: &str) -> bool {
    !suffix.is_empty()
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.ends_with(suffix))
}

/// Serialize `document` next to `original` under the suffixed name and return that path.
pub fn save_as_new(document: &Document, original: &Path, suffix: &str) -> Result<PathBuf> {
    let target = fixed_path(original, suffix);
    if target == original {
        return Err(DomainError::InvalidOutput(target).into());
    }
    xml::write(document, &target, Declaration::Keep)?;
    tracing::info!(
        original = %original.display(),
        path = %target.display(),
        "saved modified document"
    );
    Ok(target)
}

/// Append `.extension` unless `base` already ends with it.
pub fn normalize_output_name(base: &str, extension: &str) -> String {
    let base = base.trim();
    let dotted = format!(".{extension}");
    if base.ends_with(&dotted) {
        base.to_owned()
    } else {
        format!("{base}{dotted}")
    }
}

/// Result of promoting one fixed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { original: PathBuf, fixed: PathBuf },
    NotFound { original: PathBuf },
    Failed { original: PathBuf, reason: String },
}

impl fmt::Display for ReplaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceOutcome::Replaced { original, fixed } => write!(
                f,
                "Replaced {} with {}.",
                display_name(original),
                display_name(fixed)
            ),
            ReplaceOutcome::NotFound { original } => {
                write!(f, "{}.", DomainError::NotFound(display_name(original).into()))
            }
            ReplaceOutcome::Failed { original, reason } => {
                write!(f, "Failed to replace {}: {reason}", display_name(original))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    pub outcomes: Vec<ReplaceOutcome>,
}

impl ReplaceReport {
    pub fn replaced(&self) -> usize {
        self.count(|outcome| matches!(outcome, ReplaceOutcome::Replaced { .. }))
    }

    pub fn not_found(&self) -> usize {
        self.count(|outcome| matches!(outcome, ReplaceOutcome::NotFound { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ReplaceOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ReplaceOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Move every `<name><suffix>.<ext>` over `<name>.<ext>` in the configured directory.
///
/// Each file is handled on its own with a rename, so one failure never stops the batch. Only an
/// unreadable directory is returned as an error.
pub fn replace_with_fixed(cfg: &DiscoveryConfig, suffix: &str) -> Result<ReplaceReport> {
    let mut report = ReplaceReport::default();

    for source in discovery::discover(cfg)? {
        if is_fixed_variant(&source.path, suffix) {
            continue;
        }

        let original = source.path;
        let fixed = fixed_path(&original, suffix);
        let outcome = if !fixed.is_file() {
            ReplaceOutcome::NotFound { original }
        } else {
            match fs::rename(&fixed, &original) {
                Ok(()) => ReplaceOutcome::Replaced { original, fixed },
                Err(err) => ReplaceOutcome::Failed {
                    original,
                    reason: err.to_string(),
                },
            }
        };

        match &outcome {
            ReplaceOutcome::Failed { reason, .. } => {
                tracing::warn!(%outcome, reason = %reason, "replace failed")
            }
            _ => tracing::info!(%outcome, "replace"),
        }
        report.outcomes.push(outcome);
    }

    Ok(report)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::Config;

    fn discovery_for(dir: &Path) -> DiscoveryConfig {
        DiscoveryConfig::from_config(&Config::default()).with_directory(dir)
    }

    #[test]
    fn fixed_path_inserts_suffix_before_extension() {
        assert_eq!(
            fixed_path(Path::new("data/drops.xml"), "_fixed"),
            PathBuf::from("data/drops_fixed.xml")
        );
        assert_eq!(
            fixed_path(Path::new("drops.backup.xml"), "_fixed"),
            PathBuf::from("drops.backup_fixed.xml")
        );
        assert_eq!(fixed_path(Path::new("drops"), "_fixed"), PathBuf::from("drops_fixed"));
    }

    #[test]
    fn save_as_new_leaves_original_untouched() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let original = temp.path().join("drops.xml");
        let source = "<?xml version=\"1.0\"?>\n<Root><X>1</X></Root>";
        fs::write(&original, source)?;

        let mut document = xml::read(&original)?;
        let x = document.find_descendant(document.root(), "X").unwrap();
        document.set_text(x, "2");
        let written = save_as_new(&document, &original, "_fixed")?;

        assert_eq!(written, temp.path().join("drops_fixed.xml"));
        assert_eq!(fs::read_to_string(&original)?, source);
        assert_eq!(
            fs::read_to_string(&written)?,
            "<?xml version=\"1.0\"?>\n<Root><X>2</X></Root>\n"
        );
        Ok(())
    }

    #[test]
    fn save_as_new_refuses_empty_suffix() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let original = temp.path().join("drops.xml");
        let document = xml::parse("<Root />")?;

        let err = save_as_new(&document, &original, "").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::InvalidOutput(original.clone()))
        );
        assert!(!original.exists());
        Ok(())
    }

    #[test]
    fn normalizes_output_names() {
        assert_eq!(normalize_output_name("combined", "xml"), "combined.xml");
        assert_eq!(normalize_output_name("combined.xml", "xml"), "combined.xml");
        assert_eq!(normalize_output_name(" all_blips ", "xml"), "all_blips.xml");
    }

    #[test]
    fn replace_reports_missing_and_continues() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::write(root.join("a.xml"), "<Old />")?;
        fs::write(root.join("a_fixed.xml"), "<New />")?;
        fs::write(root.join("b.xml"), "<Keep />")?;

        let report = replace_with_fixed(&discovery_for(root), "_fixed")?;

        assert_eq!(
            report.outcomes,
            vec![
                ReplaceOutcome::Replaced {
                    original: root.join("a.xml"),
                    fixed: root.join("a_fixed.xml"),
                },
                ReplaceOutcome::NotFound {
                    original: root.join("b.xml"),
                },
            ]
        );
        assert_eq!(fs::read_to_string(root.join("a.xml"))?, "<New />");
        assert!(!root.join("a_fixed.xml").exists());
        assert_eq!(fs::read_to_string(root.join("b.xml"))?, "<Keep />");
        assert_eq!((report.replaced(), report.not_found()), (1, 1));
        Ok(())
    }

    #[test]
    fn outcome_messages_name_the_files() {
        let replaced = ReplaceOutcome::Replaced {
            original: PathBuf::from("dir/a.xml"),
            fixed: PathBuf::from("dir/a_fixed.xml"),
        };
        assert_eq!(replaced.to_string(), "Replaced a.xml with a_fixed.xml.");

        let missing = ReplaceOutcome::NotFound {
            original: PathBuf::from("b.xml"),
        };
        assert_eq!(missing.to_string(), "fixed version of b.xml not found.");
    }
}
