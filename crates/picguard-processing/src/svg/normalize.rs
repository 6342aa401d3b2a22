//! Normalization pass
//!
//! Removes editor debris and content that never renders: metadata, hidden
//! elements, editor namespaces and groups that carry nothing. Not a security
//! boundary; the deny-list pass runs after it regardless.

use roxmltree::{Attribute, Namespace, Node};

use super::rules::SvgRules;
use super::serialize::{declares_namespaces, ElementAction, TreeFilter};

/// Elements whose whitespace is content.
const TEXT_ELEMENTS: &[&str] = &["text", "tspan", "textPath"];

pub struct Normalizer<'r> {
    rules: &'r SvgRules,
}

impl<'r> Normalizer<'r> {
    pub fn new(rules: &'r SvgRules) -> Self {
        Self { rules }
    }

    fn in_editor_namespace(&self, uri: Option<&str>) -> bool {
        uri.is_some_and(|uri| self.rules.is_editor_namespace(uri))
    }
}

fn is_hidden(node: Node<'_, '_>) -> bool {
    node.attribute("display")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("none"))
        || node
            .attribute("visibility")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("hidden"))
}

impl TreeFilter for Normalizer<'_> {
    fn element(&self, node: Node<'_, '_>) -> ElementAction {
        let tag = node.tag_name();

        if self.in_editor_namespace(tag.namespace())
            || self.rules.is_metadata_element(tag.name())
            || is_hidden(node)
        {
            return ElementAction::Drop;
        }

        if tag.name() == "g" && node.attributes().next().is_none() && !declares_namespaces(node) {
            return ElementAction::Unwrap;
        }

        ElementAction::Keep
    }

    fn keep_attribute(&self, _node: Node<'_, '_>, attr: &Attribute<'_, '_>) -> bool {
        !self.in_editor_namespace(attr.namespace())
    }

    fn keep_namespace(&self, ns: &Namespace<'_>) -> bool {
        !self.rules.is_editor_namespace(ns.uri())
    }

    fn keep_blank_text(&self, parent: Node<'_, '_>) -> bool {
        TEXT_ELEMENTS.contains(&parent.tag_name().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::serialize::rewrite;

    fn normalize(svg: &str) -> String {
        let rules = SvgRules::standard().unwrap();
        rewrite(svg, &Normalizer::new(&rules)).unwrap()
    }

    #[test]
    fn test_drops_metadata_and_comments() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <!-- generator -->
  <title>Logo</title>
  <desc>A logo</desc>
  <metadata><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/></metadata>
  <rect width="10" height="10"/>
</svg>"#;
        assert_eq!(
            normalize(svg),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10" height="10"/></svg>"#
        );
    }

    #[test]
    fn test_drops_editor_namespaces() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" inkscape:version="1.3"><sodipodi:namedview id="nv"/><path d="M0 0" inkscape:label="p"/></svg>"#;
        assert_eq!(
            normalize(svg),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0"/></svg>"#
        );
    }

    #[test]
    fn test_drops_hidden_elements() {
        let svg = r#"<svg><rect display="none"/><circle visibility=" HIDDEN "/><line x1="1"/></svg>"#;
        assert_eq!(normalize(svg), r#"<svg><line x1="1"/></svg>"#);
    }

    #[test]
    fn test_collapses_bare_groups() {
        let svg = r#"<svg><g><g><rect/></g></g><g id="keep"><circle/></g></svg>"#;
        assert_eq!(
            normalize(svg),
            r#"<svg><rect/><g id="keep"><circle/></g></svg>"#
        );
    }

    #[test]
    fn test_keeps_whitespace_in_text() {
        let svg = "<svg><text>a <tspan>b</tspan> c</text></svg>";
        assert_eq!(normalize(svg), svg);
    }
}
