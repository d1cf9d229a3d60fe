//! XML Canonicalization 2.0 core.
//!
//! This crate implements the signature-relevant part of an XML
//! Canonicalization 2.0 engine: namespace visibility, optional sequential
//! prefix rewriting, attribute normalization and ordering, QName-aware
//! rewriting of text and attribute values (including XPath expressions),
//! inclusion/exclusion subtree selection, and character escaping. It does
//! not parse XML, compute a signature, or perform any I/O — it consumes a
//! generic read-only tree (see [`XmlNode`]) and produces a canonical byte
//! sequence.
//!
//! # Example
//!
//! ```
//! use xml_c14n::{canonicalize, Document, Parameters};
//!
//! let root = Document::element("a", "", "u1")
//!     .xmlns("", "u1")
//!     .child(Document::element("b", "", "u2").xmlns("", "u2"));
//! let root = root.build();
//!
//! let out = canonicalize(&root, &Parameters::new(), None, None).unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     r#"<a xmlns="u1"><b xmlns="u2"></b></a>"#
//! );
//! ```

#![forbid(unsafe_code)]

mod canonicalizer;
mod doc;
mod driver;
mod error;
mod escape;
mod params;
mod prefix_stack;
mod tree;
mod xpath;

pub use doc::{Builder, Document, DocNode};
pub use driver::canonicalize;
pub use error::{Error, Result};
pub use params::{Parameters, PrefixRewrite, QNameAwareParameter, UnqualifiedQNameAwareParameter};
pub use tree::{NodeId, NodeType, XmlNode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_default_ns_and_nested_override() {
        let root = Document::element("a", "", "u1")
            .xmlns("", "u1")
            .child(Document::element("b", "", "u2").xmlns("", "u2"))
            .build();
        let out = canonicalize(&root, &Parameters::new(), None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a xmlns="u1"><b xmlns="u2"></b></a>"#
        );
    }

    #[test]
    fn scenario_unused_declaration_is_stripped() {
        // `y` is declared but never referenced anywhere in the subtree, so it
        // is dropped entirely; `x` is only referenced by `b`, so its
        // declaration is rendered there rather than hoisted to `a`.
        let root = Document::element("a", "", "")
            .xmlns("x", "u1")
            .xmlns("y", "u2")
            .child(Document::element("b", "x", "u1"))
            .build();
        let out = canonicalize(&root, &Parameters::new(), None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a><x:b xmlns:x="u1"></x:b></a>"#
        );
    }

    #[test]
    fn scenario_attribute_sort_unqualified_before_qualified() {
        let root = Document::element("a", "", "")
            .xmlns("x", "u1")
            .attr_ns("x", "q", "u1", "1")
            .attr("p", "2")
            .build();
        let out = canonicalize(&root, &Parameters::new(), None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a xmlns:x="u1" p="2" x:q="1"></a>"#
        );
    }

    #[test]
    fn scenario_sequential_rewrite_is_assigned_in_uri_order() {
        let root = Document::element("a", "", "")
            .xmlns("m", "u1")
            .xmlns("n", "u2")
            .child(Document::element("b", "m", "u1"))
            .child(Document::element("c", "n", "u2"))
            .child(Document::element("d", "m", "u1"))
            .build();
        let params = Parameters::new().with_prefix_rewrite(PrefixRewrite::Sequential);
        let out = canonicalize(&root, &params, None, None).unwrap();
        // `u1` is allocated n0 the first time it is seen (on `b`) and reused
        // verbatim on `d`; `u2` gets the next id, n1. Each element still
        // carries its own declaration since nothing hoists them to `a`.
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a><n0:b xmlns:n0="u1"></n0:b><n1:c xmlns:n1="u2"></n1:c><n0:d xmlns:n0="u1"></n0:d></a>"#
        );
    }

    #[test]
    fn scenario_qname_attribute_rewrite_under_sequential_mode() {
        let root = Document::element("a", "", "")
            .xmlns("xs", "http://www.w3.org/2001/XMLSchema")
            .attr("type", "xs:int")
            .build();
        let params = Parameters::new()
            .with_prefix_rewrite(PrefixRewrite::Sequential)
            .with_qname_aware_unqualified_attribute(UnqualifiedQNameAwareParameter::new(
                "", "a", "type",
            ));
        let out = canonicalize(&root, &params, None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a xmlns:n0="http://www.w3.org/2001/XMLSchema" type="n0:int"></a>"#
        );
    }

    #[test]
    fn scenario_xpath_rewrite_leaves_quoted_text_alone() {
        let root = Document::element("e", "", "")
            .xmlns("ns1", "urn:one")
            .xmlns("ns2", "urn:two")
            .xmlns("ns3", "urn:three")
            .child(Document::text("self::ns1:foo/ns2:bar[@ns1:x='ns3:y']"))
            .build();
        let params = Parameters::new()
            .with_qname_aware_xpath_element(QNameAwareParameter::new("", "e"));
        let out = canonicalize(&root, &params, None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<e xmlns:ns1="urn:one" xmlns:ns2="urn:two">self::ns1:foo/ns2:bar[@ns1:x='ns3:y']</e>"#
        );
    }

    #[test]
    fn scenario_trim_respects_xml_space_preserve() {
        let preserved = Document::element("a", "", "")
            .attr_ns("xml", "space", "", "preserve")
            .child(Document::text("  hi  "))
            .build();
        let params = Parameters::new().with_trim_text_nodes(true);
        let out = canonicalize(&preserved, &params, None, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a xml:space="preserve">  hi  </a>"#
        );

        let trimmed = Document::element("a", "", "")
            .child(Document::text("  hi  "))
            .build();
        let out = canonicalize(&trimmed, &params, None, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"<a>hi</a>"#);
    }

    #[test]
    fn scenario_excluding_an_xmlns_attribute_is_a_no_op() {
        // The namespace attribute itself is in the exclude list, but the
        // xmlns/xml carve-out means it stays visible regardless.
        let root = Document::element("a", "", "u1").xmlns("", "u1").build();
        let xmlns_attr = root.attributes()[0].clone();
        let out = canonicalize(&root, &Parameters::new(), None, Some(&[xmlns_attr])).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"<a xmlns="u1"></a>"#);
    }

    #[test]
    fn p1_canonicalization_is_deterministic() {
        let root = Document::element("a", "", "u1")
            .xmlns("", "u1")
            .child(Document::element("b", "", "u2").xmlns("", "u2"))
            .build();
        let once = canonicalize(&root, &Parameters::new(), None, None).unwrap();
        let twice = canonicalize(&root, &Parameters::new(), None, None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn p4_an_unreferenced_namespace_declaration_does_not_change_output() {
        let without = Document::element("a", "", "").build();
        let with_unused = Document::element("a", "", "").xmlns("z", "unused").build();
        let base = canonicalize(&without, &Parameters::new(), None, None).unwrap();
        let extra = canonicalize(&with_unused, &Parameters::new(), None, None).unwrap();
        assert_eq!(base, extra);
    }

    #[test]
    fn p3_reordering_attributes_does_not_change_output() {
        let first = Document::element("a", "", "").attr("p", "1").attr("q", "2").build();
        let second = Document::element("a", "", "").attr("q", "2").attr("p", "1").build();
        let out1 = canonicalize(&first, &Parameters::new(), None, None).unwrap();
        let out2 = canonicalize(&second, &Parameters::new(), None, None).unwrap();
        assert_eq!(out1, out2);
    }

    #[test]
    fn p2_reordering_sibling_namespace_declarations_does_not_change_output() {
        let first = Document::element("a", "", "")
            .xmlns("x", "u1")
            .xmlns("y", "u2")
            .child(Document::element("b", "x", "u1"))
            .child(Document::element("c", "y", "u2"))
            .build();
        let second = Document::element("a", "", "")
            .xmlns("y", "u2")
            .xmlns("x", "u1")
            .child(Document::element("b", "x", "u1"))
            .child(Document::element("c", "y", "u2"))
            .build();
        let out1 = canonicalize(&first, &Parameters::new(), None, None).unwrap();
        let out2 = canonicalize(&second, &Parameters::new(), None, None).unwrap();
        assert_eq!(out1, out2);
    }

    #[test]
    fn p5_sequential_rewrite_output_does_not_depend_on_original_author_prefixes() {
        let first = Document::element("a", "", "")
            .xmlns("m", "u1")
            .xmlns("n", "u2")
            .child(Document::element("b", "m", "u1"))
            .child(Document::element("c", "n", "u2"))
            .build();
        let second = Document::element("a", "", "")
            .xmlns("foo", "u1")
            .xmlns("bar", "u2")
            .child(Document::element("b", "foo", "u1"))
            .child(Document::element("c", "bar", "u2"))
            .build();
        let params = Parameters::new().with_prefix_rewrite(PrefixRewrite::Sequential);
        let out1 = canonicalize(&first, &params, None, None).unwrap();
        let out2 = canonicalize(&second, &params, None, None).unwrap();
        assert_eq!(out1, out2);
    }
}
