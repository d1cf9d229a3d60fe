//! The read-only tree interface the core consumes (§6).
//!
//! The core never parses XML itself; it is driven against anything that
//! implements [`XmlNode`]. The `doc` module ships a small reference tree for
//! tests and for callers who don't already have a DOM of their own.

/// Discriminates what kind of node a [`XmlNode`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

/// Opaque node identity for include/exclude list membership.
///
/// Two nodes are the same node iff their `NodeId`s are equal; this is a
/// pointer-equality surrogate, not a structural comparison — a freshly
/// parsed node with identical content is a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A read-only view onto one node of a host document tree.
///
/// Attribute nodes implement this trait too: their `node_type` is
/// [`NodeType::Attribute`], `node_value` is the attribute's value, and
/// `attributes`/`child_nodes` are empty.
pub trait XmlNode {
    /// Stable identity for include/exclude list membership.
    fn id(&self) -> NodeId;

    fn node_type(&self) -> NodeType;

    /// The local part of the node's name, with any `prefix:` stripped.
    fn local_name(&self) -> &str;

    /// The namespace prefix in scope for this node, or `""` if none.
    fn prefix(&self) -> &str;

    /// The namespace URI bound to this node's prefix, or `""` if none.
    fn namespace_uri(&self) -> &str;

    /// The node's full name as it appeared in the source (`prefix:local`
    /// or just `local`), or the synthetic name for non-element/attribute
    /// nodes (e.g. `"#text"`).
    fn node_name(&self) -> &str;

    /// The node's text value: attribute value, text content, CDATA content,
    /// comment content, or PI data. Empty for elements and documents.
    fn node_value(&self) -> &str;

    /// This node's attributes, in source order. Empty for non-elements.
    fn attributes(&self) -> Vec<Self>
    where
        Self: Sized;

    /// This node's children, in source order. Empty for leaf node kinds.
    fn child_nodes(&self) -> Vec<Self>
    where
        Self: Sized;

    /// This node's parent, or `None` at the document root.
    fn parent_node(&self) -> Option<Self>
    where
        Self: Sized;

    fn has_child_nodes(&self) -> bool
    where
        Self: Sized,
    {
        !self.child_nodes().is_empty()
    }
}
