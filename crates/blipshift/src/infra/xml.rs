//! XML parsing and serialization for source documents.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;

use crate::domain::document::{Document, NodeId, NodeKind};

const XML_NAMESPACE_PREFIX: &str = "xml";

/// Whether the serialized output starts with the document's `<?xml ...?>` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    /// Emit the declaration the source carried, if any.
    Keep,
    Omit,
}

/// Parse XML text into an owned [`Document`].
pub fn parse(text: &str) -> Result<Document> {
    let parsed = roxmltree::Document::parse(text).map_err(|err| anyhow!("invalid XML: {err}"))?;
    let source_root = parsed.root_element();

    let mut document = Document::new(qualified_element_name(source_root));
    let root = document.root();
    copy_attributes(&mut document, root, source_root);
    copy_children(&mut document, root, source_root);
    document.set_declaration(leading_declaration(text));
    Ok(document)
}

/// Read and parse the file at `path`.
pub fn read(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Serialize the whole document.
pub fn to_string(document: &Document, declaration: Declaration) -> String {
    let mut out = String::new();
    if declaration == Declaration::Keep
        && let Some(decl) = document.declaration()
    {
        out.push_str(decl);
        out.push('\n');
    }
    write_node(document, document.root(), &mut out);
    out.push('\n');
    out
}

/// Serialize a single subtree without any trailing newline.
pub fn node_to_string(document: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(document, id, &mut out);
    out
}

/// Serialize `document` to `path`, replacing any existing file atomically.
pub fn write(document: &Document, path: &Path, declaration: Declaration) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    staged
        .write_all(to_string(document, declaration).as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    staged
        .persist(path)
        .with_context(|| format!("failed to move output into place at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "document written");
    Ok(())
}

fn leading_declaration(text: &str) -> Option<String> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("<?xml") {
        return None;
    }
    let end = trimmed.find("?>")?;
    Some(trimmed[..end + 2].to_owned())
}

fn copy_children(document: &mut Document, parent: NodeId, source: roxmltree::Node<'_, '_>) {
    for child in source.children() {
        match child.node_type() {
            roxmltree::NodeType::Element => {
                let element = document.append_element(parent, qualified_element_name(child));
                copy_attributes(document, element, child);
                copy_children(document, element, child);
            }
            roxmltree::NodeType::Text => {
                document.append_text(parent, child.text().unwrap_or_default());
            }
            roxmltree::NodeType::Comment => {
                document.append(
                    parent,
                    NodeKind::Comment(child.text().unwrap_or_default().to_owned()),
                );
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = child.pi() {
                    document.append(
                        parent,
                        NodeKind::ProcessingInstruction {
                            target: pi.target.to_owned(),
                            value: pi.value.map(str::to_owned),
                        },
                    );
                }
            }
            roxmltree::NodeType::Root => {}
        }
    }
}

fn copy_attributes(document: &mut Document, element: NodeId, source: roxmltree::Node<'_, '_>) {
    let inherited: Vec<(Option<&str>, &str)> = source
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    for ns in source.namespaces() {
        let declared = (ns.name(), ns.uri());
        if ns.name() == Some(XML_NAMESPACE_PREFIX) || inherited.contains(&declared) {
            continue;
        }
        let name = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        };
        document.push_attribute(element, name, ns.uri());
    }

    for attribute in source.attributes() {
        let name = qualify(source, attribute.namespace(), attribute.name());
        document.push_attribute(element, name, attribute.value());
    }
}

fn qualified_element_name(node: roxmltree::Node<'_, '_>) -> String {
    let tag = node.tag_name();
    qualify(node, tag.namespace(), tag.name())
}

fn qualify(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace
        .and_then(|uri| node.lookup_prefix(uri))
        .filter(|prefix| !prefix.is_empty())
    {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_owned(),
    }
}

fn write_node(document: &Document, id: NodeId, out: &mut String) {
    match document.kind(id) {
        NodeKind::Element { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for attribute in attributes {
                out.push(' ');
                out.push_str(&attribute.name);
                out.push_str("=\"");
                push_escaped(out, &attribute.value, true);
                out.push('"');
            }

            let children = document.children(id);
            if children.is_empty() {
                out.push_str(" />");
                return;
            }

            out.push('>');
            for &child in children {
                write_node(document, child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Text(text) => push_escaped(out, text, false),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, value } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(value) = value {
                out.push(' ');
                out.push_str(value);
            }
            out.push_str("?>");
        }
    }
}

fn push_escaped(out: &mut String, raw: &str, attribute: bool) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\r' if attribute => out.push_str("&#13;"),
            '\t' if attribute => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DeadDrops>
  <!-- north side -->
  <Drop kind="a&amp;b">
    <Name>Pier &lt;1&gt;</Name>
    <X>1.5</X>
  </Drop>
  <Empty />
</DeadDrops>"#;

    #[test]
    fn round_trips_structure_and_whitespace() -> Result<()> {
        let document = parse(SAMPLE)?;
        assert_eq!(document.declaration(), Some(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert_eq!(to_string(&document, Declaration::Keep), format!("{SAMPLE}\n"));
        Ok(())
    }

    #[test]
    fn omits_declaration_on_request() -> Result<()> {
        let document = parse(SAMPLE)?;
        let written = to_string(&document, Declaration::Omit);
        assert!(written.starts_with("<DeadDrops>"));
        Ok(())
    }

    #[test]
    fn unescapes_text_on_parse() -> Result<()> {
        let document = parse(SAMPLE)?;
        let name = document
            .find_descendant(document.root(), "Name")
            .expect("name element");
        assert_eq!(document.text(name), Some("Pier <1>"));
        Ok(())
    }

    #[test]
    fn keeps_namespace_prefixes() -> Result<()> {
        let source = r#"<a:Root xmlns:a="urn:a"><a:Item a:id="1"/></a:Root>"#;
        let document = parse(source)?;
        assert_eq!(
            to_string(&document, Declaration::Omit),
            "<a:Root xmlns:a=\"urn:a\"><a:Item a:id=\"1\" /></a:Root>\n"
        );
        Ok(())
    }

    #[test]
    fn attribute_whitespace_survives_reparse() -> Result<()> {
        let mut document = Document::new("Root");
        let root = document.root();
        document.push_attribute(root, "note", "a\tb\r\nc");

        let written = to_string(&document, Declaration::Omit);
        assert_eq!(written, "<Root note=\"a&#9;b&#13;&#10;c\" />\n");

        let reparsed = parse(&written)?;
        match reparsed.kind(reparsed.root()) {
            NodeKind::Element { attributes, .. } => assert_eq!(attributes[0].value, "a\tb\r\nc"),
            other => panic!("unexpected root {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("<Root><Unclosed></Root>").is_err());
    }

    #[test]
    fn write_replaces_existing_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("out.xml");
        fs::write(&path, "stale")?;

        let document = parse("<Root><X>1</X></Root>")?;
        write(&document, &path, Declaration::Omit)?;

        assert_eq!(fs::read_to_string(&path)?, "<Root><X>1</X></Root>\n");
        Ok(())
    }
}
