//! Filtered re-serialization of a parsed SVG tree
//!
//! Both tree passes work the same way: parse with roxmltree, walk the tree
//! and write back only what a [`TreeFilter`] keeps. Comments and processing
//! instructions are never written. The parsed document is dropped before
//! [`rewrite`] returns; only text leaves this module.

use picguard_core::AppError;
use roxmltree::{Attribute, Document, Namespace, Node, NodeType, ParsingOptions};

use super::rules::XML_NAMESPACE;

/// What to do with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementAction {
    Keep,
    /// Drop the element and its subtree
    Drop,
    /// Drop the element but keep its children in place
    Unwrap,
}

pub trait TreeFilter {
    fn element(&self, node: Node<'_, '_>) -> ElementAction;

    fn keep_attribute(&self, node: Node<'_, '_>, attr: &Attribute<'_, '_>) -> bool;

    fn keep_namespace(&self, ns: &Namespace<'_>) -> bool;

    /// Whitespace-only text between elements.
    fn keep_blank_text(&self, _parent: Node<'_, '_>) -> bool {
        true
    }
}

pub fn parse(text: &str) -> Result<Document<'_>, AppError> {
    let options = ParsingOptions {
        allow_dtd: false,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
        .map_err(|e| AppError::Processing(format!("Failed to parse SVG: {}", e)))
}

/// Parse `text` and write back what `filter` keeps.
pub fn rewrite(text: &str, filter: &dyn TreeFilter) -> Result<String, AppError> {
    let doc = parse(text)?;
    let root = doc.root_element();

    if !root.tag_name().name().eq_ignore_ascii_case("svg") {
        return Err(AppError::StructuralViolation(
            "Invalid SVG structure".to_string(),
        ));
    }

    let mut out = String::with_capacity(text.len());
    let writer = Writer { filter };
    writer.element(root, &mut out, true)?;
    Ok(out)
}

struct Writer<'f> {
    filter: &'f dyn TreeFilter,
}

impl Writer<'_> {
    fn element(&self, node: Node<'_, '_>, out: &mut String, is_root: bool) -> Result<(), AppError> {
        // The root element is always written.
        let action = if is_root {
            ElementAction::Keep
        } else {
            self.filter.element(node)
        };

        match action {
            ElementAction::Drop => return Ok(()),
            ElementAction::Unwrap => return self.children(node, out),
            ElementAction::Keep => {}
        }

        let name = element_name(node);
        out.push('<');
        out.push_str(&name);

        for ns in declared_namespaces(node) {
            if !self.filter.keep_namespace(&ns) {
                continue;
            }
            match ns.name() {
                Some(prefix) => write_attr(out, &format!("xmlns:{}", prefix), ns.uri()),
                None => write_attr(out, "xmlns", ns.uri()),
            }
        }

        for attr in node.attributes() {
            if !self.filter.keep_attribute(node, &attr) {
                continue;
            }
            if let Some(qname) = attribute_name(node, &attr) {
                write_attr(out, &qname, attr.value());
            }
        }

        let mut inner = String::new();
        self.children(node, &mut inner)?;

        if inner.is_empty() && !is_root {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&inner);
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }

        Ok(())
    }

    fn children(&self, node: Node<'_, '_>, out: &mut String) -> Result<(), AppError> {
        for child in node.children() {
            match child.node_type() {
                NodeType::Element => self.element(child, out, false)?,
                NodeType::Text => {
                    let text = child.text().unwrap_or_default();
                    if text.trim().is_empty() && !self.filter.keep_blank_text(node) {
                        continue;
                    }
                    escape_text(out, text);
                }
                NodeType::Comment | NodeType::PI | NodeType::Root => {}
            }
        }
        Ok(())
    }
}

/// Namespaces declared on this element rather than inherited.
fn declared_namespaces<'a, 'input>(node: Node<'a, 'input>) -> Vec<Namespace<'input>> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .cloned()
        .collect()
}

/// True when the element declares namespaces of its own.
pub fn declares_namespaces(node: Node<'_, '_>) -> bool {
    !declared_namespaces(node).is_empty()
}

fn element_name(node: Node<'_, '_>) -> String {
    let tag = node.tag_name();
    let Some(uri) = tag.namespace() else {
        return tag.name().to_string();
    };

    if node
        .namespaces()
        .any(|ns| ns.name().is_none() && ns.uri() == uri)
    {
        return tag.name().to_string();
    }

    match node
        .namespaces()
        .find(|ns| ns.uri() == uri)
        .and_then(|ns| ns.name())
    {
        Some(prefix) => format!("{}:{}", prefix, tag.name()),
        None => tag.name().to_string(),
    }
}

/// Qualified attribute name; `None` if the namespace has no prefix in scope.
fn attribute_name(node: Node<'_, '_>, attr: &Attribute<'_, '_>) -> Option<String> {
    let Some(uri) = attr.namespace() else {
        return Some(attr.name().to_string());
    };

    if uri == XML_NAMESPACE {
        return Some(format!("xml:{}", attr.name()));
    }

    node.namespaces()
        .filter(|ns| ns.uri() == uri)
        .find_map(|ns| ns.name())
        .map(|prefix| format!("{}:{}", prefix, attr.name()))
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
