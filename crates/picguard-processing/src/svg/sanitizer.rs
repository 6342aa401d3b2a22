//! SVG sanitizer
//!
//! Six stages, in order:
//!
//! 1. pre-screen the raw text for smuggled data, reject on any hit
//! 2. structural check: root tags present, no script block
//! 3. normalization through a tree rewrite
//! 4. deny-list rewrite of elements and attributes, then the `svg_hush`
//!    allow-list filter over the rewritten text
//! 5. residue check on the sanitized text, one surgical strip, then reject
//! 6. the resulting text is the artifact, written verbatim

use picguard_core::AppError;
use roxmltree::{Attribute, Namespace, Node};
use svg_hush::Filter;

use super::normalize::Normalizer;
use super::rules::{SvgRules, SVG_NAMESPACE, XLINK_NAMESPACE, XML_NAMESPACE};
use super::screen::{check_structure, clear_residue, pre_screen};
use super::serialize::{rewrite, ElementAction, TreeFilter};

/// Tree filter applying the element and attribute deny-lists.
pub struct DenyListFilter<'r> {
    rules: &'r SvgRules,
}

impl<'r> DenyListFilter<'r> {
    pub fn new(rules: &'r SvgRules) -> Self {
        Self { rules }
    }
}

impl TreeFilter for DenyListFilter<'_> {
    fn element(&self, node: Node<'_, '_>) -> ElementAction {
        let tag = node.tag_name();

        // Only SVG elements are kept; XHTML and friends go with their subtree.
        if tag.namespace().is_some_and(|ns| ns != SVG_NAMESPACE) {
            return ElementAction::Drop;
        }

        if self.rules.is_denied_element(tag.name()) {
            return ElementAction::Drop;
        }

        ElementAction::Keep
    }

    fn keep_attribute(&self, _node: Node<'_, '_>, attr: &Attribute<'_, '_>) -> bool {
        if attr.namespace().is_some_and(|ns| ns != XML_NAMESPACE) {
            return false;
        }
        !self.rules.is_denied_attribute(attr.name(), attr.value())
    }

    fn keep_namespace(&self, ns: &Namespace<'_>) -> bool {
        ns.uri() == SVG_NAMESPACE || ns.uri() == XLINK_NAMESPACE
    }
}

pub struct SvgSanitizer<'r> {
    rules: &'r SvgRules,
}

impl<'r> SvgSanitizer<'r> {
    pub fn new(rules: &'r SvgRules) -> Self {
        Self { rules }
    }

    /// Run all stages over raw upload bytes.
    pub fn sanitize_bytes(&self, data: &[u8]) -> Result<String, AppError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| AppError::Classification("Invalid SVG file".to_string()))?;
        self.sanitize(text)
    }

    pub fn sanitize(&self, text: &str) -> Result<String, AppError> {
        pre_screen(text, self.rules)?;
        check_structure(text, self.rules)?;

        let normalized = rewrite(text, &Normalizer::new(self.rules))?;
        let stripped = self.strip_active_content(&normalized)?;
        let sanitized = filter_allow_list(&stripped)?;
        let cleaned = clear_residue(sanitized, self.rules)?;

        tracing::debug!(
            rules_version = self.rules.version(),
            input_len = text.len(),
            output_len = cleaned.len(),
            "SVG sanitized"
        );

        Ok(cleaned)
    }

    /// Deny-list pass alone, without the screens around it.
    pub fn strip_active_content(&self, text: &str) -> Result<String, AppError> {
        rewrite(text, &DenyListFilter::new(self.rules))
    }
}

/// Second pass through `svg_hush`, which keeps only known SVG elements and
/// attributes. Data URLs get the crate's default handling; `clear_residue`
/// rejects any that remain.
pub fn filter_allow_list(text: &str) -> Result<String, AppError> {
    let mut input = text.as_bytes();
    let mut out = Vec::with_capacity(text.len());
    let mut filter = Filter::new();

    filter.filter(&mut input, &mut out).map_err(|e| {
        tracing::warn!(error = ?e, "SVG allow-list filter failed");
        AppError::Processing("SVG could not be sanitized".to_string())
    })?;

    String::from_utf8(out)
        .map_err(|_| AppError::Processing("SVG could not be sanitized".to_string()))
}
