//! Depth-first traversal honouring include/exclude lists and document-order
//! sorting (C5).

use std::cmp::Ordering;

use crate::canonicalizer::Canonicalizer;
use crate::error::Result;
use crate::params::Parameters;
use crate::tree::{NodeType, XmlNode};

fn node_depth<N: XmlNode>(node: &N) -> usize {
    let mut depth = 0;
    let mut current = node.parent_node();
    while let Some(p) = current {
        depth += 1;
        current = p.parent_node();
    }
    depth
}

/// Document-order comparison: shallower nodes sort first; nodes at the same
/// depth under the same parent sort by sibling position; otherwise the
/// comparison recurses on each node's parent until a common ancestor is
/// found. This is the concrete algorithm behind "sort the closure by
/// document order" (§4.1).
pub fn document_order<N: XmlNode>(n1: &N, n2: &N) -> Ordering {
    if n1.id() == n2.id() {
        return Ordering::Equal;
    }
    let d1 = node_depth(n1);
    let d2 = node_depth(n2);
    if d1 != d2 {
        return d1.cmp(&d2);
    }
    match (n1.parent_node(), n2.parent_node()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(p1), Some(p2)) => {
            if p1.id() == p2.id() {
                let children = p1.child_nodes();
                let i1 = children.iter().position(|c| c.id() == n1.id());
                let i2 = children.iter().position(|c| c.id() == n2.id());
                match (i1, i2) {
                    (Some(i1), Some(i2)) => i1.cmp(&i2),
                    _ => Ordering::Equal,
                }
            } else {
                document_order(&p1, &p2)
            }
        }
    }
}

/// Every included node plus its full ancestor chain, deduplicated and
/// sorted by document order.
fn compute_include_closure<N: XmlNode + Clone>(include_list: &[N]) -> Vec<N> {
    let mut all: Vec<N> = Vec::new();
    for node in include_list {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            let parent = n.parent_node();
            if !all.iter().any(|x: &N| x.id() == n.id()) {
                all.push(n);
            }
            current = parent;
        }
    }
    all.sort_by(document_order);
    all
}

struct Walk<'c, 'p, N: XmlNode> {
    canon: &'c mut Canonicalizer<'p>,
    queue: Vec<N>,
}

impl<'c, 'p, N: XmlNode> Walk<'c, 'p, N> {
    fn process(&mut self, node: &N) -> Result<()> {
        if self.canon.is_excluded(node) {
            return Ok(());
        }
        match node.node_type() {
            NodeType::Element => self.canon.start_element(node)?,
            NodeType::Text => self.canon.text(node)?,
            NodeType::CData => self.canon.cdata(node)?,
            NodeType::ProcessingInstruction | NodeType::Comment => {}
            NodeType::Document | NodeType::Attribute => {}
        }

        if !self.queue.is_empty() && self.queue[0].id() == node.id() {
            self.queue.remove(0);
        }

        if node.has_child_nodes() {
            let on_path = !self.queue.is_empty()
                && self
                    .queue[0]
                    .parent_node()
                    .map(|p| p.id() == node.id())
                    .unwrap_or(false);
            for child in node.child_nodes() {
                let visit = !on_path || (!self.queue.is_empty() && self.queue[0].id() == child.id());
                if visit {
                    self.process(&child)?;
                }
            }
        }

        if node.node_type() == NodeType::Element {
            self.canon.end_element(node)?;
        }
        Ok(())
    }
}

/// Canonicalizes the subtree rooted at `node` per the configured
/// parameters, optional include list (closure + document-order walk) and
/// optional exclude list (element/attribute drop with the `xmlns`/`xml`
/// carve-out). Returns the canonical UTF-8 byte sequence.
pub fn canonicalize<N: XmlNode + Clone>(
    node: &N,
    params: &Parameters,
    include: Option<&[N]>,
    exclude: Option<&[N]>,
) -> Result<Vec<u8>> {
    let exclude_list: &[N] = exclude.unwrap_or(&[]);
    let mut canon = Canonicalizer::new(node, params, exclude_list);

    match include {
        Some(include_list) if !include_list.is_empty() => {
            let queue = compute_include_closure(include_list);
            let mut walk = Walk {
                canon: &mut canon,
                queue,
            };
            while !walk.queue.is_empty() {
                let front = walk.queue[0].clone();
                walk.process(&front)?;
            }
        }
        _ => {
            let mut walk = Walk {
                canon: &mut canon,
                queue: Vec::new(),
            };
            walk.process(node)?;
        }
    }

    Ok(canon.into_output().into_bytes())
}
