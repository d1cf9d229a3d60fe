//! A small `Rc`-based reference tree implementing [`tree::XmlNode`].
//!
//! Grounded on the teacher's old `dom.rs` (`Node` with name/attributes/text/
//! children), rebuilt around the `XmlNode` trait and reference-based node
//! identity instead of value equality, and built bottom-up from a plain
//! [`Builder`] tree so callers don't need to pre-wire parent pointers by
//! hand. Not part of the canonicalization algorithm — it exists so the
//! crate is directly testable and so a caller without a DOM of their own
//! can construct one from values.
//!
//! There is no parser here; building a tree from XML text is out of scope
//! (§1).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::tree::{NodeId, NodeType, XmlNode};

/// An in-progress node, built with [`Document`]'s constructors and
/// [`Builder::child`]/[`Builder::attr`], then turned into a linked
/// [`DocNode`] tree with [`Builder::build`].
pub struct Builder {
    node_type: NodeType,
    local_name: String,
    prefix: String,
    namespace_uri: String,
    node_name: String,
    node_value: String,
    attributes: Vec<Builder>,
    children: Vec<Builder>,
}

impl Builder {
    fn leaf(node_type: NodeType, node_name: &str, value: &str) -> Self {
        Self {
            node_type,
            local_name: String::new(),
            prefix: String::new(),
            namespace_uri: String::new(),
            node_name: node_name.to_string(),
            node_value: value.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a child node (only meaningful on an element).
    pub fn child(mut self, child: Builder) -> Self {
        self.children.push(child);
        self
    }

    /// Appends an unqualified attribute.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(Self {
            node_type: NodeType::Attribute,
            local_name: name.to_string(),
            prefix: String::new(),
            namespace_uri: String::new(),
            node_name: name.to_string(),
            node_value: value.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        self
    }

    /// Appends a qualified attribute bound to `uri` through `prefix`.
    pub fn attr_ns(mut self, prefix: &str, local_name: &str, uri: &str, value: &str) -> Self {
        self.attributes.push(Self {
            node_type: NodeType::Attribute,
            local_name: local_name.to_string(),
            prefix: prefix.to_string(),
            namespace_uri: uri.to_string(),
            node_name: format!("{prefix}:{local_name}"),
            node_value: value.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        self
    }

    /// Appends an `xmlns="uri"` (when `prefix` is empty) or
    /// `xmlns:prefix="uri"` namespace declaration attribute.
    pub fn xmlns(mut self, prefix: &str, uri: &str) -> Self {
        let attr = if prefix.is_empty() {
            Self {
                node_type: NodeType::Attribute,
                local_name: String::new(),
                prefix: String::new(),
                namespace_uri: String::new(),
                node_name: "xmlns".to_string(),
                node_value: uri.to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            }
        } else {
            Self {
                node_type: NodeType::Attribute,
                local_name: prefix.to_string(),
                prefix: "xmlns".to_string(),
                namespace_uri: String::new(),
                node_name: format!("xmlns:{prefix}"),
                node_value: uri.to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            }
        };
        self.attributes.push(attr);
        self
    }

    /// Materializes this spec into a linked `DocNode` tree, wiring parent
    /// pointers on every descendant (including attribute nodes).
    pub fn build(self) -> DocNode {
        materialize(self)
    }
}

fn materialize(spec: Builder) -> DocNode {
    let node = DocNode(Rc::new(NodeData {
        node_type: spec.node_type,
        local_name: spec.local_name,
        prefix: spec.prefix,
        namespace_uri: spec.namespace_uri,
        node_name: spec.node_name,
        node_value: spec.node_value,
        attributes: RefCell::new(Vec::new()),
        children: RefCell::new(Vec::new()),
        parent: RefCell::new(None),
    }));

    let attributes: Vec<DocNode> = spec
        .attributes
        .into_iter()
        .map(|a| {
            let attr = materialize(a);
            *attr.0.parent.borrow_mut() = Some(Rc::downgrade(&node.0));
            attr
        })
        .collect();
    *node.0.attributes.borrow_mut() = attributes;

    let children: Vec<DocNode> = spec
        .children
        .into_iter()
        .map(|c| {
            let child = materialize(c);
            *child.0.parent.borrow_mut() = Some(Rc::downgrade(&node.0));
            child
        })
        .collect();
    *node.0.children.borrow_mut() = children;

    node
}

/// Entry points for building a [`Builder`] node tree.
pub struct Document;

impl Document {
    /// An element with local name `local_name`, optionally bound to
    /// `namespace_uri` through `prefix` (both empty for an unprefixed
    /// element with no namespace).
    pub fn element(local_name: &str, prefix: &str, namespace_uri: &str) -> Builder {
        let node_name = if prefix.is_empty() {
            local_name.to_string()
        } else {
            format!("{prefix}:{local_name}")
        };
        Builder {
            node_type: NodeType::Element,
            local_name: local_name.to_string(),
            prefix: prefix.to_string(),
            namespace_uri: namespace_uri.to_string(),
            node_name,
            node_value: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(value: &str) -> Builder {
        Builder::leaf(NodeType::Text, "#text", value)
    }

    pub fn cdata(value: &str) -> Builder {
        Builder::leaf(NodeType::CData, "#cdata-section", value)
    }

    pub fn comment(value: &str) -> Builder {
        Builder::leaf(NodeType::Comment, "#comment", value)
    }

    pub fn processing_instruction(target: &str, data: &str) -> Builder {
        Builder::leaf(NodeType::ProcessingInstruction, target, data)
    }
}

struct NodeData {
    node_type: NodeType,
    local_name: String,
    prefix: String,
    namespace_uri: String,
    node_name: String,
    node_value: String,
    attributes: RefCell<Vec<DocNode>>,
    children: RefCell<Vec<DocNode>>,
    parent: RefCell<Option<Weak<NodeData>>>,
}

/// A node in the reference tree. Cheaply `Clone`— it's a reference-counted
/// pointer, so cloning never duplicates the underlying subtree, and two
/// clones of the same node compare equal by [`XmlNode::id`].
#[derive(Clone)]
pub struct DocNode(Rc<NodeData>);

impl XmlNode for DocNode {
    fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as usize)
    }

    fn node_type(&self) -> NodeType {
        self.0.node_type
    }

    fn local_name(&self) -> &str {
        &self.0.local_name
    }

    fn prefix(&self) -> &str {
        &self.0.prefix
    }

    fn namespace_uri(&self) -> &str {
        &self.0.namespace_uri
    }

    fn node_name(&self) -> &str {
        &self.0.node_name
    }

    fn node_value(&self) -> &str {
        &self.0.node_value
    }

    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.borrow().clone()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.0.children.borrow().clone()
    }

    fn parent_node(&self) -> Option<Self> {
        self.0
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(DocNode)
    }
}
