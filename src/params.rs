//! Canonicalization configuration (§3).

use std::collections::HashSet;

/// How author-chosen prefixes are treated in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixRewrite {
    /// Prefixes are emitted exactly as the source tree carries them.
    #[default]
    None,
    /// Every visible URI is assigned a fresh `n0`, `n1`, … prefix the first
    /// time it becomes visible, reused thereafter for the whole document.
    Sequential,
}

/// A `(namespace URI, local name)` pair identifying a QName-aware element
/// or qualified attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QNameAwareParameter {
    pub uri: String,
    pub local_name: String,
}

impl QNameAwareParameter {
    pub fn new(uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            local_name: local_name.into(),
        }
    }
}

/// A `(namespace URI, parent local name, attribute local name)` triple
/// identifying a QName-aware unqualified attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnqualifiedQNameAwareParameter {
    pub uri: String,
    pub parent_local_name: String,
    pub local_name: String,
}

impl UnqualifiedQNameAwareParameter {
    pub fn new(
        uri: impl Into<String>,
        parent_local_name: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            parent_local_name: parent_local_name.into(),
            local_name: local_name.into(),
        }
    }
}

/// Recognized canonicalization options (§3).
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    ignore_comments: bool,
    trim_text_nodes: bool,
    prefix_rewrite: PrefixRewrite,
    qname_aware_elements: HashSet<QNameAwareParameter>,
    qname_aware_qualified_attributes: HashSet<QNameAwareParameter>,
    qname_aware_unqualified_attributes: HashSet<UnqualifiedQNameAwareParameter>,
    qname_aware_xpath_elements: HashSet<QNameAwareParameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self {
            ignore_comments: true,
            ..Default::default()
        }
    }

    pub fn with_ignore_comments(mut self, value: bool) -> Self {
        self.ignore_comments = value;
        self
    }

    pub fn with_trim_text_nodes(mut self, value: bool) -> Self {
        self.trim_text_nodes = value;
        self
    }

    pub fn with_prefix_rewrite(mut self, value: PrefixRewrite) -> Self {
        self.prefix_rewrite = value;
        self
    }

    pub fn with_qname_aware_element(mut self, entry: QNameAwareParameter) -> Self {
        self.qname_aware_elements.insert(entry);
        self
    }

    pub fn with_qname_aware_qualified_attribute(mut self, entry: QNameAwareParameter) -> Self {
        self.qname_aware_qualified_attributes.insert(entry);
        self
    }

    pub fn with_qname_aware_unqualified_attribute(
        mut self,
        entry: UnqualifiedQNameAwareParameter,
    ) -> Self {
        self.qname_aware_unqualified_attributes.insert(entry);
        self
    }

    pub fn with_qname_aware_xpath_element(mut self, entry: QNameAwareParameter) -> Self {
        self.qname_aware_xpath_elements.insert(entry);
        self
    }

    pub fn ignore_comments(&self) -> bool {
        self.ignore_comments
    }

    pub fn trim_text_nodes(&self) -> bool {
        self.trim_text_nodes
    }

    pub fn prefix_rewrite(&self) -> PrefixRewrite {
        self.prefix_rewrite
    }

    pub fn is_qname_aware_element(&self, uri: &str, local_name: &str) -> bool {
        self.qname_aware_elements.contains(&QNameAwareParameter {
            uri: uri.to_string(),
            local_name: local_name.to_string(),
        })
    }

    pub fn is_qname_aware_qualified_attribute(&self, uri: &str, local_name: &str) -> bool {
        self.qname_aware_qualified_attributes
            .contains(&QNameAwareParameter {
                uri: uri.to_string(),
                local_name: local_name.to_string(),
            })
    }

    pub fn is_qname_aware_unqualified_attribute(
        &self,
        uri: &str,
        parent_local_name: &str,
        local_name: &str,
    ) -> bool {
        self.qname_aware_unqualified_attributes
            .contains(&UnqualifiedQNameAwareParameter {
                uri: uri.to_string(),
                parent_local_name: parent_local_name.to_string(),
                local_name: local_name.to_string(),
            })
    }

    pub fn is_qname_aware_xpath_element(&self, uri: &str, local_name: &str) -> bool {
        self.qname_aware_xpath_elements
            .contains(&QNameAwareParameter {
                uri: uri.to_string(),
                local_name: local_name.to_string(),
            })
    }
}
