//! Versioned SVG rule table
//!
//! Every check the SVG sanitizer performs is driven by this table: the
//! smuggling patterns used by the pre-screen and residue passes, the
//! structural patterns, the element and attribute deny-lists and the editor
//! namespaces dropped during normalization. New bypass classes are added here
//! together with a regression test.

use regex::Regex;

/// Bumped whenever a rule is added, removed or tightened.
pub const SVG_RULES_VERSION: u32 = 3;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Elements removed together with their subtree.
const DENIED_ELEMENTS: &[&str] = &[
    "script",
    "iframe",
    "object",
    "embed",
    "foreignobject",
    "image",
    "use",
    "a",
    "animate",
    "animatemotion",
    "animatetransform",
    "animatecolor",
    "set",
    "feimage",
    "pattern",
    "symbol",
    "mask",
    "clippath",
    "marker",
    "filter",
    "view",
    "style",
    "handler",
    "listener",
    "discard",
];

/// Attributes removed wherever they appear.
const DENIED_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "data",
    "from",
    "to",
    "values",
    "by",
    "formaction",
    "form",
    "poster",
    "background",
    "dynsrc",
    "lowsrc",
    "style",
    "ping",
    "action",
    "profile",
    "encoding",
    "method",
    "attributename",
    "begin",
    "end",
    "dur",
    "repeatcount",
    "in",
    "in2",
    "result",
    "externalresourcesrequired",
    "requiredextensions",
    "systemlanguage",
    "color-interpolation",
    "color-rendering",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "mask",
    "clip-path",
    "marker-start",
    "marker-mid",
    "marker-end",
    "cursor",
    "opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
];

/// Attribute name prefixes removed wherever they appear (`on*` handlers, `data-*`).
const DENIED_ATTRIBUTE_PREFIXES: &[&str] = &["on", "data-"];

/// Metadata elements dropped by normalization.
const METADATA_ELEMENTS: &[&str] = &["metadata", "title", "desc"];

const EDITOR_NAMESPACES: &[&str] = &[
    "http://creativecommons.org/ns#",
    "http://inkscape.sourceforge.net/DTD/sodipodi-0.dtd",
    "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd",
    "http://www.inkscape.org/namespaces/inkscape",
    "http://www.bohemiancoding.com/sketch/ns",
    "http://ns.adobe.com/AdobeIllustrator/10.0/",
    "http://ns.adobe.com/Graphs/1.0/",
    "http://ns.adobe.com/AdobeSVGViewerExtensions/3.0/",
    "http://ns.adobe.com/Variables/1.0/",
    "http://ns.adobe.com/SaveForWeb/1.0/",
    "http://ns.adobe.com/Extensibility/1.0/",
    "http://ns.adobe.com/Flows/1.0/",
    "http://ns.adobe.com/ImageReplacement/1.0/",
    "http://ns.adobe.com/GenericCustomNamespace/1.0/",
    "http://ns.adobe.com/XPath/1.0/",
    "http://schemas.microsoft.com/visio/2003/SVGExtensions/",
    "http://taptrix.com/vectorillusions/svg",
    "http://www.figma.com/figma/ns",
    "http://purl.org/dc/elements/1.1/",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
    "http://www.serif.com/",
    "http://www.vector.evaxdesign.sk",
];

/// Which passes a pattern rule participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Raw upload only
    PreScreen,
    /// Raw upload and sanitized output
    PreScreenAndResidue,
}

/// A named smuggling pattern.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub scope: RuleScope,
}

impl PatternRule {
    fn new(name: &'static str, pattern: &str, scope: RuleScope) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            scope,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn applies_to_residue(&self) -> bool {
        self.scope == RuleScope::PreScreenAndResidue
    }
}

/// Structural patterns checked after the pre-screen.
#[derive(Debug, Clone)]
pub struct StructureRules {
    pub root_open: Regex,
    pub root_close: Regex,
    pub script_block: Regex,
}

/// Patterns used by the residue pass to cut offending occurrences out of
/// sanitized text.
#[derive(Debug, Clone)]
pub struct StripRules {
    pub image_tags: Regex,
    pub data_uri_references: Regex,
}

#[derive(Debug, Clone)]
pub struct SvgRules {
    version: u32,
    patterns: Vec<PatternRule>,
    structure: StructureRules,
    strip: StripRules,
    denied_elements: Vec<String>,
    denied_attributes: Vec<String>,
    denied_attribute_prefixes: Vec<String>,
    denied_value_patterns: Vec<Regex>,
    metadata_elements: Vec<String>,
    editor_namespaces: Vec<String>,
}

impl SvgRules {
    /// Build the standard rule table. Fails only if a pattern does not compile.
    pub fn standard() -> Result<Self, regex::Error> {
        use RuleScope::*;

        let patterns = vec![
            PatternRule::new("base64-literal", r"(?i)base64", PreScreen)?,
            PatternRule::new(
                "data-uri-base64",
                r"(?i)data:[^\s]+;base64",
                PreScreenAndResidue,
            )?,
            PatternRule::new(
                "xlink-href-data-uri",
                r#"(?i)xlink:href\s*=\s*["']?\s*data:"#,
                PreScreenAndResidue,
            )?,
            PatternRule::new(
                "href-data-uri",
                r#"(?i)href\s*=\s*["']?\s*data:"#,
                PreScreenAndResidue,
            )?,
            PatternRule::new(
                "css-url-data-uri",
                r"(?i)url\s*\([^)]*data:",
                PreScreenAndResidue,
            )?,
            PatternRule::new(
                "quoted-data-uri",
                r#"(?i)["']\s*data:"#,
                PreScreenAndResidue,
            )?,
            PatternRule::new("image-element", r"(?i)<image[^>]*>", PreScreenAndResidue)?,
            PatternRule::new("doctype-declaration", r"(?i)<!DOCTYPE", PreScreen)?,
            PatternRule::new("entity-declaration", r"(?i)<!ENTITY", PreScreen)?,
        ];

        let structure = StructureRules {
            root_open: Regex::new(r"(?i)<svg\b")?,
            root_close: Regex::new(r"(?i)</svg\s*>")?,
            script_block: Regex::new(r"(?i)<script\b")?,
        };

        let strip = StripRules {
            image_tags: Regex::new(r"(?i)<image\b[^>]*>|</image\s*>")?,
            data_uri_references: Regex::new(
                r#"(?i)(?:xlink:)?href\s*=\s*["']?\s*data:[^\s>"']*["']?"#,
            )?,
        };

        let denied_value_patterns = vec![
            Regex::new(r"(?i)javascript\s*:")?,
            Regex::new(r"(?i)url\s*\(")?,
            Regex::new(r"(?i)data\s*:")?,
        ];

        Ok(Self {
            version: SVG_RULES_VERSION,
            patterns,
            structure,
            strip,
            denied_elements: to_owned(DENIED_ELEMENTS),
            denied_attributes: to_owned(DENIED_ATTRIBUTES),
            denied_attribute_prefixes: to_owned(DENIED_ATTRIBUTE_PREFIXES),
            denied_value_patterns,
            metadata_elements: to_owned(METADATA_ELEMENTS),
            editor_namespaces: to_owned(EDITOR_NAMESPACES),
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn patterns(&self) -> &[PatternRule] {
        &self.patterns
    }

    pub fn residue_patterns(&self) -> impl Iterator<Item = &PatternRule> {
        self.patterns.iter().filter(|rule| rule.applies_to_residue())
    }

    pub fn structure(&self) -> &StructureRules {
        &self.structure
    }

    pub fn strip(&self) -> &StripRules {
        &self.strip
    }

    /// Matched on the local name, ignoring case and namespace.
    pub fn is_denied_element(&self, local_name: &str) -> bool {
        contains_ignore_case(&self.denied_elements, local_name)
    }

    pub fn is_denied_attribute(&self, local_name: &str, value: &str) -> bool {
        let lowered = local_name.to_ascii_lowercase();
        contains_ignore_case(&self.denied_attributes, &lowered)
            || self
                .denied_attribute_prefixes
                .iter()
                .any(|prefix| lowered.starts_with(prefix.as_str()))
            || self
                .denied_value_patterns
                .iter()
                .any(|pattern| pattern.is_match(value))
    }

    pub fn is_metadata_element(&self, local_name: &str) -> bool {
        contains_ignore_case(&self.metadata_elements, local_name)
    }

    pub fn is_editor_namespace(&self, uri: &str) -> bool {
        self.editor_namespaces.iter().any(|ns| ns == uri)
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn contains_ignore_case(items: &[String], needle: &str) -> bool {
    items.iter().any(|item| item.eq_ignore_ascii_case(needle))
}
