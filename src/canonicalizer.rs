//! Per-node emission: start/end tag, attributes, text, CDATA, namespace
//! visibility and QName rewriting (C4).

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::escape;
use crate::params::{Parameters, PrefixRewrite};
use crate::prefix_stack::PrefixStack;
use crate::tree::{NodeId, NodeType, XmlNode};
use crate::xpath;

/// A namespace declaration that must be rendered on the element currently
/// being opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NSDecl {
    pub uri: String,
    pub prefix: String,
}

struct AttributeRecord {
    qualified: bool,
    uri: String,
    local_name: String,
    value: String,
    old_prefix: String,
    new_prefix: String,
}

fn attribute_sort_key(attr: &AttributeRecord) -> (String, String) {
    let uri = if attr.qualified {
        attr.uri.clone()
    } else {
        " ".to_string()
    };
    (uri, attr.local_name.clone())
}

/// A literal `xmlns` attribute name carries the reserved `xmlns` pseudo-prefix
/// and has an empty local name — both `local_name`/`prefix` deviate from the
/// raw tree accessors for this one name.
fn local_name_of<N: XmlNode>(node: &N) -> &str {
    if node.node_name() == "xmlns" {
        ""
    } else {
        node.local_name()
    }
}

fn prefix_of<N: XmlNode>(node: &N) -> &str {
    if node.node_name() == "xmlns" {
        "xmlns"
    } else {
        node.prefix()
    }
}

fn get_text_prefix(text: &str) -> String {
    match text.find(':') {
        Some(idx) => text[..idx].to_string(),
        None => String::new(),
    }
}

/// The concatenation of `node`'s direct text/CDATA children — an element has
/// no `nodeValue` of its own, but a QName- or XPath-aware element's
/// declarations must already account for what its text content references
/// before that content is emitted (§4.4.1(d)).
fn element_text<N: XmlNode>(node: &N) -> String {
    let mut text = String::new();
    for child in node.child_nodes() {
        match child.node_type() {
            NodeType::Text | NodeType::CData => text.push_str(child.node_value()),
            _ => {}
        }
    }
    text
}

/// Walks from `node` up to (but not including) the document node, seeding
/// every `xmlns:*` declaration found along the way at successively negative
/// depths, then injects a well-known `SOAP-ENV` fallback below all of them.
fn load_parent_namespaces<N: XmlNode>(declared: &mut PrefixStack, node: &N) {
    let mut chain: Vec<N> = Vec::new();
    let mut current_parent = node.parent_node();
    loop {
        match current_parent {
            Some(p) if p.node_type() != NodeType::Document => {
                let next_parent = p.parent_node();
                chain.push(p);
                current_parent = next_parent;
            }
            _ => break,
        }
    }
    let mut depth = 0i64;
    for pnode in chain.iter().rev() {
        depth += 1;
        for attr in pnode.attributes() {
            if prefix_of(&attr) == "xmlns" {
                declared.define(local_name_of(&attr), attr.node_value(), -depth);
            }
        }
    }
    depth += 1;
    declared.define(
        "SOAP-ENV",
        "http://schemas.xmlsoap.org/soap/envelope/",
        -depth,
    );
}

/// Owns the prefix stacks, the redefined-prefix map, the depth counter and
/// the output buffer for one canonicalization run.
pub struct Canonicalizer<'p> {
    params: &'p Parameters,
    exclude: HashSet<NodeId>,
    declared: PrefixStack,
    used: PrefixStack,
    redefined: HashMap<String, String>,
    next_id: u32,
    depth: i64,
    sequential: bool,
    out: String,
}

impl<'p> Canonicalizer<'p> {
    pub fn new<N: XmlNode>(root: &N, params: &'p Parameters, exclude: &[N]) -> Self {
        let mut declared = PrefixStack::new();
        load_parent_namespaces(&mut declared, root);
        if declared.lookup("").is_none() {
            declared.define("", "", 0);
        }
        let exclude_ids = exclude.iter().map(|n| n.id()).collect();
        Self {
            params,
            exclude: exclude_ids,
            declared,
            used: PrefixStack::new(),
            redefined: HashMap::new(),
            next_id: 0,
            depth: 0,
            sequential: params.prefix_rewrite() == PrefixRewrite::Sequential,
            out: String::new(),
        }
    }

    pub fn into_output(self) -> String {
        self.out
    }

    /// An element or attribute in the exclude list is dropped — unless it's
    /// an attribute carrying the reserved `xmlns` or `xml` prefix, which
    /// stays visible regardless.
    pub fn is_excluded<N: XmlNode>(&self, node: &N) -> bool {
        if !self.exclude.contains(&node.id()) {
            return false;
        }
        match node.node_type() {
            NodeType::Element => true,
            NodeType::Attribute => {
                let p = prefix_of(node);
                !(p == "xmlns" || p == "xml")
            }
            _ => false,
        }
    }

    fn namespace_uri_by_prefix(&self, prefix: &str) -> Result<String> {
        self.declared
            .lookup(prefix)
            .map(str::to_string)
            .ok_or_else(|| Error::InternalInvariant {
                prefix: prefix.to_string(),
            })
    }

    fn get_new_prefix(&self, uri: &str, prefix: &str) -> String {
        if self.sequential {
            if uri.is_empty() {
                String::new()
            } else {
                self.used.lookup(uri).unwrap_or("").to_string()
            }
        } else {
            prefix.to_string()
        }
    }

    fn add_namespaces<N: XmlNode>(&mut self, node: &N) {
        for attr in node.attributes() {
            if self.is_excluded(&attr) {
                continue;
            }
            if prefix_of(&attr) == "xmlns" {
                let suffix = local_name_of(&attr).to_string();
                self.declared.define(&suffix, attr.node_value(), self.depth);
            }
        }
        let prfx_el = prefix_of(node).to_string();
        let uri = node.namespace_uri().to_string();
        if prfx_el.is_empty() && !uri.is_empty() {
            self.declared.define(&prfx_el, &uri, self.depth);
        }
    }

    fn add_ns_declaration_for_prefix(
        &mut self,
        prefix: &str,
        decls: &mut HashSet<NSDecl>,
    ) -> Result<()> {
        let prefix_uri = self.namespace_uri_by_prefix(prefix)?;
        if prefix.is_empty() && prefix_uri.is_empty() {
            // No default namespace in scope: nothing to declare, and no
            // prefix is ever assigned in its place.
            self.used.define(prefix, &prefix_uri, self.depth);
            return Ok(());
        }
        if self.sequential {
            if self.used.lookup(&prefix_uri).is_none() {
                decls.insert(NSDecl {
                    uri: prefix_uri,
                    prefix: String::new(),
                });
            }
        } else {
            let exists_uri = self.used.lookup(prefix).map(str::to_string);
            if exists_uri.as_deref() != Some(prefix_uri.as_str()) {
                self.used.define(prefix, &prefix_uri, self.depth);
                decls.insert(NSDecl {
                    uri: prefix_uri,
                    prefix: prefix.to_string(),
                });
            }
        }
        Ok(())
    }

    fn add_visibility_if_necessary_by_text(
        &mut self,
        text: &str,
        decls: &mut HashSet<NSDecl>,
    ) -> Result<()> {
        let prefix = get_text_prefix(text);
        if prefix == "xml" {
            return Ok(());
        }
        self.add_ns_declaration_for_prefix(&prefix, decls)
    }

    fn add_xpath_visibility_if_necessary_by_text(
        &mut self,
        text: &str,
        decls: &mut HashSet<NSDecl>,
    ) -> Result<()> {
        for prefix in xpath::referenced_prefixes(text) {
            self.add_ns_declaration_for_prefix(&prefix, decls)?;
        }
        Ok(())
    }

    fn evaluate_uri_visibility<N: XmlNode>(
        &mut self,
        node: &N,
        decls: &mut HashSet<NSDecl>,
    ) -> Result<()> {
        let node_prf = prefix_of(node).to_string();
        let node_local = local_name_of(node).to_string();
        let node_uri = self.namespace_uri_by_prefix(&node_prf)?;
        self.add_ns_declaration_for_prefix(&node_prf, decls)?;

        for attr in node.attributes() {
            if self.is_excluded(&attr) {
                continue;
            }
            let prfx = prefix_of(&attr).to_string();
            if prfx == "xmlns" || prfx == "xml" {
                continue;
            }
            let attr_local = local_name_of(&attr).to_string();
            let value = attr.node_value().to_string();
            if prfx.is_empty() {
                if self
                    .params
                    .is_qname_aware_unqualified_attribute(&node_uri, &node_local, &attr_local)
                {
                    self.add_visibility_if_necessary_by_text(&value, decls)?;
                }
            } else {
                let attr_uri = self.namespace_uri_by_prefix(&prfx)?;
                if self
                    .params
                    .is_qname_aware_qualified_attribute(&attr_uri, &attr_local)
                {
                    self.add_visibility_if_necessary_by_text(&value, decls)?;
                }
                self.add_ns_declaration_for_prefix(&prfx, decls)?;
            }
        }

        let text = element_text(node);
        if self.params.is_qname_aware_element(&node_uri, &node_local) {
            self.add_visibility_if_necessary_by_text(&text, decls)?;
        }
        if self
            .params
            .is_qname_aware_xpath_element(&node_uri, &node_local)
        {
            self.add_xpath_visibility_if_necessary_by_text(&text, decls)?;
        }
        Ok(())
    }

    fn process_qname_text(&self, text: &str) -> Result<String> {
        match text.find(':') {
            Some(idx) => {
                let prefix = &text[..idx];
                let local = &text[idx + 1..];
                let uri = self.namespace_uri_by_prefix(prefix)?;
                let new_prefix = self.get_new_prefix(&uri, prefix);
                Ok(format!("{new_prefix}:{local}"))
            }
            None => Ok(text.to_string()),
        }
    }

    fn process_attributes<N: XmlNode>(
        &self,
        node: &N,
        node_uri: &str,
        node_local: &str,
    ) -> Result<Vec<AttributeRecord>> {
        let mut list = Vec::new();
        for attr in node.attributes() {
            let prfx_ns = prefix_of(&attr).to_string();
            if prfx_ns == "xmlns" {
                continue;
            }
            if self.is_excluded(&attr) {
                continue;
            }
            let suffix = local_name_of(&attr).to_string();
            let mut rec = AttributeRecord {
                qualified: true,
                uri: String::new(),
                local_name: suffix,
                value: String::new(),
                old_prefix: prfx_ns.clone(),
                new_prefix: String::new(),
            };
            if prfx_ns.is_empty() {
                rec.uri = node_uri.to_string();
                rec.qualified = false;
            } else if prfx_ns != "xml" {
                rec.uri = self.namespace_uri_by_prefix(&prfx_ns)?;
            }
            rec.value = escape::escape_attribute(attr.node_value()).to_string();
            rec.new_prefix = if rec.qualified {
                self.get_new_prefix(&rec.uri, &prfx_ns)
            } else {
                String::new()
            };
            if prfx_ns != "xml" {
                if rec.qualified {
                    if self
                        .params
                        .is_qname_aware_qualified_attribute(&rec.uri, &rec.local_name)
                    {
                        rec.value = self.process_qname_text(&rec.value)?;
                    }
                } else if self.params.is_qname_aware_unqualified_attribute(
                    node_uri,
                    node_local,
                    &rec.local_name,
                ) {
                    rec.value = self.process_qname_text(&rec.value)?;
                }
            }
            list.push(rec);
        }
        list.sort_by(|a, b| attribute_sort_key(a).cmp(&attribute_sort_key(b)));
        Ok(list)
    }

    /// `xml:space` is inherited through intervening elements: the nearest
    /// ancestor that carries it wins, not necessarily the immediate parent.
    fn xml_space_preserve<N: XmlNode>(&self, node: &N) -> Result<bool> {
        let mut ancestor = node.parent_node();
        while let Some(current) = ancestor {
            for attr in current.attributes() {
                if self.is_excluded(&attr) {
                    continue;
                }
                if prefix_of(&attr) == "xml" && local_name_of(&attr) == "space" {
                    return Ok(attr.node_value() == "preserve");
                }
            }
            ancestor = current.parent_node();
        }
        Ok(false)
    }

    /// §4.4.1 — opens an element: namespace visibility, optional sequential
    /// prefix rewrite, start tag, namespace declarations, attributes.
    pub fn start_element<N: XmlNode>(&mut self, node: &N) -> Result<()> {
        if self.is_excluded(node) {
            return Ok(());
        }
        self.depth += 1;
        self.add_namespaces(node);

        let mut decls = HashSet::new();
        self.evaluate_uri_visibility(node, &mut decls)?;
        let mut decl_list: Vec<NSDecl> = decls.into_iter().collect();

        if self.sequential {
            decl_list.sort_by(|a, b| a.uri.cmp(&b.uri));
            for decl in decl_list.iter_mut() {
                let new_prefix = if let Some(p) = self.redefined.get(&decl.uri) {
                    p.clone()
                } else {
                    let np = format!("n{}", self.next_id);
                    self.next_id += 1;
                    self.redefined.insert(decl.uri.clone(), np.clone());
                    np
                };
                decl.prefix = new_prefix.clone();
                self.used.define(&decl.uri, &new_prefix, self.depth);
            }
        }

        let node_local = local_name_of(node).to_string();
        let node_prefix = prefix_of(node).to_string();
        let node_uri = self.namespace_uri_by_prefix(&node_prefix)?;
        let new_prefix = self.get_new_prefix(&node_uri, &node_prefix);

        self.out.push('<');
        if !new_prefix.is_empty() {
            self.out.push_str(&new_prefix);
            self.out.push(':');
        }
        self.out.push_str(&node_local);

        if !self.sequential {
            decl_list.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        }
        for decl in &decl_list {
            if decl.prefix.is_empty() {
                self.out.push_str(&format!(" xmlns=\"{}\"", decl.uri));
            } else {
                self.out
                    .push_str(&format!(" xmlns:{}=\"{}\"", decl.prefix, decl.uri));
            }
        }

        let attrs = self.process_attributes(node, &node_uri, &node_local)?;
        for attr in &attrs {
            if attr.old_prefix == "xml" {
                self.out
                    .push_str(&format!(" xml:{}=\"{}\"", attr.local_name, attr.value));
                continue;
            }
            if attr.new_prefix.is_empty() {
                self.out
                    .push_str(&format!(" {}=\"{}\"", attr.local_name, attr.value));
            } else {
                self.out.push_str(&format!(
                    " {}:{}=\"{}\"",
                    attr.new_prefix, attr.local_name, attr.value
                ));
            }
        }
        self.out.push('>');
        Ok(())
    }

    /// §4.4.6 — closes an element and pops both prefix stacks at this depth.
    pub fn end_element<N: XmlNode>(&mut self, node: &N) -> Result<()> {
        if self.is_excluded(node) {
            return Ok(());
        }
        let node_prefix = prefix_of(node).to_string();
        let node_uri = self.namespace_uri_by_prefix(&node_prefix)?;
        let element_prefix = self.get_new_prefix(&node_uri, &node_prefix);
        self.out.push_str("</");
        if !element_prefix.is_empty() {
            self.out.push_str(&element_prefix);
            self.out.push(':');
        }
        self.out.push_str(local_name_of(node));
        self.out.push('>');
        self.used.pop_level(self.depth);
        self.declared.pop_level(self.depth);
        self.depth -= 1;
        Ok(())
    }

    /// §4.4.6 — normalizes, optionally trims, and emits a text node.
    pub fn text<N: XmlNode>(&mut self, node: &N) -> Result<()> {
        let mut text = escape::escape_text(node.node_value()).to_string();
        if self.params.trim_text_nodes() && !self.xml_space_preserve(node)? {
            text = text.trim().to_string();
        }

        if let Some(element) = node.parent_node() {
            let node_prefix = prefix_of(&element).to_string();
            let node_local = local_name_of(&element).to_string();
            let node_uri = self.namespace_uri_by_prefix(&node_prefix)?;
            if self.params.is_qname_aware_element(&node_uri, &node_local) {
                text = self.process_qname_text(&text)?;
            }
            if self
                .params
                .is_qname_aware_xpath_element(&node_uri, &node_local)
            {
                let declared = &self.declared;
                let used = &self.used;
                let sequential = self.sequential;
                text = xpath::rewrite(&text, |p| {
                    let uri = declared
                        .lookup(p)
                        .map(str::to_string)
                        .ok_or_else(|| Error::InternalInvariant {
                            prefix: p.to_string(),
                        })?;
                    let new_prefix = if sequential {
                        used.lookup(&uri).unwrap_or("").to_string()
                    } else {
                        p.to_string()
                    };
                    Ok(new_prefix)
                })?;
            }
        }
        self.out.push_str(&text);
        Ok(())
    }

    /// CDATA content: emitted through the same escaping as a text node, with
    /// no QName/XPath rewriting (the original never looks at the parent for
    /// CDATA) and no CDATA markers in the canonical form.
    pub fn cdata<N: XmlNode>(&mut self, node: &N) -> Result<()> {
        let text = escape::escape_text(node.node_value());
        self.out.push_str(&text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Document;
    use crate::params::{PrefixRewrite, QNameAwareParameter, UnqualifiedQNameAwareParameter};

    #[test]
    fn non_sequential_redeclare_emits_a_fresh_xmlns_on_uri_change() {
        // `x` is bound to `u1` on `a` and rebound to a different URI on the
        // child `b`; `exists_uri != prefix_uri` must force a redeclaration
        // rather than treating `x` as already visible.
        let root = Document::element("a", "x", "u1")
            .xmlns("x", "u1")
            .child(Document::element("b", "x", "u2").xmlns("x", "u2"))
            .build();
        let out = crate::driver::canonicalize(&root, &Parameters::new(), None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<x:a xmlns:x="u1"><x:b xmlns:x="u2"></x:b></x:a>"#
        );
    }

    #[test]
    fn qualified_and_unqualified_qname_attributes_both_get_rewritten() {
        let root = Document::element("a", "", "")
            .xmlns("x", "u1")
            .xmlns("xsi", "urn:xsi")
            .attr_ns("xsi", "type", "urn:xsi", "x:Foo")
            .attr("kind", "x:Bar")
            .build();
        let params = Parameters::new()
            .with_prefix_rewrite(PrefixRewrite::Sequential)
            .with_qname_aware_qualified_attribute(QNameAwareParameter::new("urn:xsi", "type"))
            .with_qname_aware_unqualified_attribute(UnqualifiedQNameAwareParameter::new(
                "", "a", "kind",
            ));
        let out = crate::driver::canonicalize(&root, &params, None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a xmlns:n0="u1" xmlns:n1="urn:xsi" kind="n0:Bar" n1:type="n0:Foo"></a>"#
        );
    }

    #[test]
    fn excluding_one_of_several_attributes_drops_only_that_one() {
        let root = Document::element("a", "", "")
            .attr("p1", "1")
            .attr("p2", "2")
            .attr("p3", "3")
            .build();
        let excluded = root.attributes()[1].clone();
        let out = crate::driver::canonicalize(&root, &Parameters::new(), None, Some(&[excluded]))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"<a p1="1" p3="3"></a>"#);
    }

    #[test]
    fn used_prefix_scope_is_popped_when_an_element_closes() {
        // `b` and `c` are siblings, each independently declaring `x` to the
        // same URI. If `end_element(b)` failed to pop `used` at its depth,
        // `c` would see `x` as already-declared and skip its own `xmlns:x`.
        let root = Document::element("a", "", "").build();
        let b = Document::element("b", "x", "u1").xmlns("x", "u1").build();
        let c = Document::element("c", "x", "u1").xmlns("x", "u1").build();
        let params = Parameters::new();
        let mut canon = Canonicalizer::new(&root, &params, &[]);
        canon.start_element(&root).unwrap();
        canon.start_element(&b).unwrap();
        canon.end_element(&b).unwrap();
        canon.start_element(&c).unwrap();
        canon.end_element(&c).unwrap();
        canon.end_element(&root).unwrap();
        assert_eq!(
            canon.into_output(),
            r#"<a><x:b xmlns:x="u1"></x:b><x:c xmlns:x="u1"></x:c></a>"#
        );
    }
}
