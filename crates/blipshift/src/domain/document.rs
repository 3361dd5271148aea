//! Owned, mutable element tree for a parsed source file.
//!
//! Nodes live in an arena and are addressed by [`NodeId`] handles, so records can point into a
//! document without borrowing it. The arena only grows; nodes are never detached.

/// Stable handle to a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        value: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    declaration: Option<String>,
}

impl Document {
    /// Create a document holding a single empty root element.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = NodeData {
            kind: NodeKind::Element {
                name: root_name.into(),
                attributes: Vec::new(),
            },
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            declaration: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Raw `<?xml ...?>` declaration carried over from the source, if any.
    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }

    pub fn set_declaration(&mut self, declaration: Option<String>) {
        self.declaration = declaration;
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Tag name when `id` is an element.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.is_element(*child))
    }

    /// Append a node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.append(
            parent,
            NodeKind::Element {
                name: name.into(),
                attributes: Vec::new(),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Text(text.into()))
    }

    /// Add an attribute to an element. Ignored for other node kinds.
    pub fn push_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.index()].kind {
            attributes.push(Attribute {
                name: name.into(),
                value: value.into(),
            });
        }
    }

    /// Text that directly opens the element, as in `<X>1.5</X>`.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let first = self.children(id).first()?;
        match self.kind(*first) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Replace the leading text of an element, inserting a text node when there is none.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        let value = value.into();
        let first = self.children(id).first().copied();
        if let Some(first) = first
            && let NodeKind::Text(text) = &mut self.nodes[first.index()].kind
        {
            *text = value;
            return;
        }

        let text = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind: NodeKind::Text(value),
            children: Vec::new(),
        });
        self.nodes[id.index()].children.insert(0, text);
    }

    /// Pre-order walk starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Every element of the document in document order, root first.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root)
            .filter(move |id| self.is_element(*id))
    }

    /// First element strictly below `id` whose tag is `name`, at any depth.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .skip(1)
            .find(|candidate| self.name(*candidate) == Some(name))
    }

    /// Deep-copy the subtree rooted at `id` in `source` under `parent` in this document.
    pub fn import(&mut self, parent: NodeId, source: &Document, id: NodeId) -> NodeId {
        let copied = self.append(parent, source.kind(id).clone());
        for &child in source.children(id) {
            self.import(copied, source, child);
        }
        copied
    }
}

pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.document.children(next).iter().rev().copied());
        Some(next)
    }
}

/// Tag names of the three spatial axis fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateFields {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl CoordinateFields {
    pub fn names(&self) -> [&str; 3] {
        [&self.x, &self.y, &self.z]
    }
}

impl Default for CoordinateFields {
    fn default() -> Self {
        Self {
            x: "X".into(),
            y: "Y".into(),
            z: "Z".into(),
        }
    }
}

/// Lookup of the three coordinate fields at or below a node.
pub trait HasCoordinates {
    /// The `[x, y, z]` field elements for `node`, or `None` unless all three exist.
    fn coordinate_fields(&self, node: NodeId, fields: &CoordinateFields) -> Option<[NodeId; 3]>;
}

impl HasCoordinates for Document {
    fn coordinate_fields(&self, node: NodeId, fields: &CoordinateFields) -> Option<[NodeId; 3]> {
        Some([
            self.find_descendant(node, &fields.x)?,
            self.find_descendant(node, &fields.y)?,
            self.find_descendant(node, &fields.z)?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(document: &mut Document, parent: NodeId, name: &str, xyz: [&str; 3]) -> NodeId {
        let element = document.append_element(parent, name);
        for (axis, value) in ["X", "Y", "Z"].into_iter().zip(xyz) {
            let field = document.append_element(element, axis);
            document.append_text(field, value);
        }
        element
    }

    #[test]
    fn descendants_walk_in_document_order() {
        let mut document = Document::new("Root");
        let root = document.root();
        let a = document.append_element(root, "A");
        let b = document.append_element(a, "B");
        let c = document.append_element(root, "C");

        let order: Vec<_> = document.elements().collect();
        assert_eq!(order, vec![root, a, b, c]);
    }

    #[test]
    fn find_descendant_excludes_self_and_searches_any_depth() {
        let mut document = Document::new("X");
        let root = document.root();
        let inner = document.append_element(root, "Wrapper");
        let nested = document.append_element(inner, "X");

        assert_eq!(document.find_descendant(root, "X"), Some(nested));
        assert_eq!(document.find_descendant(nested, "X"), None);
    }

    #[test]
    fn set_text_replaces_or_inserts_leading_text() {
        let mut document = Document::new("Root");
        let root = document.root();
        let with_text = document.append_element(root, "X");
        document.append_text(with_text, "1.5");
        let empty = document.append_element(root, "Y");

        document.set_text(with_text, "2.5");
        document.set_text(empty, "3");

        assert_eq!(document.text(with_text), Some("2.5"));
        assert_eq!(document.children(with_text).len(), 1);
        assert_eq!(document.text(empty), Some("3"));
    }

    #[test]
    fn coordinate_fields_require_all_three_axes() {
        let mut document = Document::new("Root");
        let root = document.root();
        let full = point(&mut document, root, "Blip", ["1", "2", "3"]);
        let partial = document.append_element(root, "Partial");
        document.append_element(partial, "X");
        document.append_element(partial, "Y");

        let fields = CoordinateFields::default();
        assert!(document.coordinate_fields(full, &fields).is_some());
        assert!(document.coordinate_fields(partial, &fields).is_none());
    }

    #[test]
    fn import_copies_whole_subtree() {
        let mut source = Document::new("Root");
        let root = source.root();
        let blip = point(&mut source, root, "Blip", ["1", "2", "3"]);
        source.push_attribute(blip, "id", "7");

        let mut target = Document::new("Combined");
        let target_root = target.root();
        let copied = target.import(target_root, &source, blip);

        assert_eq!(target.kind(copied), source.kind(blip));
        assert_eq!(target.children(target_root), &[copied]);
        let fields = CoordinateFields::default();
        let [x, _, z] = target.coordinate_fields(copied, &fields).expect("fields copied");
        assert_eq!(target.text(x), Some("1"));
        assert_eq!(target.text(z), Some("3"));
    }
}
