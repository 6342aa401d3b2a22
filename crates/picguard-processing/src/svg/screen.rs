//! Text-level checks run before and after the tree passes

use picguard_core::AppError;

use super::rules::SvgRules;

/// Reject on the first smuggling pattern found in the raw upload.
pub fn pre_screen(text: &str, rules: &SvgRules) -> Result<(), AppError> {
    if let Some(rule) = rules.patterns().iter().find(|rule| rule.is_match(text)) {
        tracing::warn!(
            rule = rule.name,
            rules_version = rules.version(),
            "SVG rejected by pre-screen"
        );
        return Err(AppError::StructuralViolation(format!(
            "SVG contains embedded data ({})",
            rule.name
        )));
    }
    Ok(())
}

/// Root tags present and no script block.
pub fn check_structure(text: &str, rules: &SvgRules) -> Result<(), AppError> {
    let structure = rules.structure();

    if !structure.root_open.is_match(text) || !structure.root_close.is_match(text) {
        return Err(AppError::StructuralViolation(
            "Invalid SVG structure".to_string(),
        ));
    }

    if structure.script_block.is_match(text) {
        tracing::warn!("SVG rejected: script block");
        return Err(AppError::StructuralViolation(
            "SVG contains a script block".to_string(),
        ));
    }

    Ok(())
}

/// Names of residue rules that still match.
pub fn residue_hits(text: &str, rules: &SvgRules) -> Vec<&'static str> {
    rules
        .residue_patterns()
        .filter(|rule| rule.is_match(text))
        .map(|rule| rule.name)
        .collect()
}

/// Re-check sanitized output. Residue is cut out once; anything still
/// matching after the cut is rejected.
pub fn clear_residue(text: String, rules: &SvgRules) -> Result<String, AppError> {
    let hits = residue_hits(&text, rules);
    if hits.is_empty() {
        return Ok(text);
    }

    tracing::warn!(rules = ?hits, "Residue found after sanitization, stripping");

    let strip = rules.strip();
    let stripped = strip.image_tags.replace_all(&text, "");
    let stripped = strip
        .data_uri_references
        .replace_all(&stripped, "")
        .into_owned();

    let remaining = residue_hits(&stripped, rules);
    if !remaining.is_empty() {
        tracing::warn!(rules = ?remaining, "Residue survived stripping, rejecting");
        return Err(AppError::StructuralViolation(format!(
            "SVG contains embedded data ({})",
            remaining.join(", ")
        )));
    }

    Ok(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SvgRules {
        SvgRules::standard().unwrap()
    }

    #[test]
    fn test_pre_screen_rejects_data_uri_image() {
        let svg = r#"<svg><image xlink:href="data:image/png;base64,iVBORw0KGgo="/></svg>"#;
        let err = pre_screen(svg, &rules()).unwrap_err();
        assert!(matches!(err, AppError::StructuralViolation(_)));
    }

    #[test]
    fn test_pre_screen_is_case_insensitive() {
        let svg = r#"<svg><rect FILL="DATA:text/plain;BASE64,AAAA"/></svg>"#;
        assert!(pre_screen(svg, &rules()).is_err());
    }

    #[test]
    fn test_pre_screen_accepts_plain_svg() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="5" cy="5" r="4"/></svg>"#;
        assert!(pre_screen(svg, &rules()).is_ok());
    }

    #[test]
    fn test_pre_screen_rejects_entities() {
        let svg = r#"<!DOCTYPE svg [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><svg>&xxe;</svg>"#;
        assert!(pre_screen(svg, &rules()).is_err());
    }

    #[test]
    fn test_structure() {
        let rules = rules();
        assert!(check_structure("<svg></svg>", &rules).is_ok());
        assert!(check_structure("<svg>", &rules).is_err());
        assert!(check_structure("<html></html>", &rules).is_err());

        let err = check_structure("<svg><SCRIPT>alert(1)</SCRIPT></svg>", &rules).unwrap_err();
        assert!(matches!(err, AppError::StructuralViolation(ref m) if m.contains("script")));
    }

    #[test]
    fn test_clean_text_passes_unchanged() {
        let text = r#"<svg><path d="M0 0"/></svg>"#.to_string();
        assert_eq!(clear_residue(text.clone(), &rules()).unwrap(), text);
    }

    #[test]
    fn test_residue_is_stripped() {
        let text = r#"<svg><image width="1"/><path href="data:x" d="M0"/></svg>"#.to_string();
        let cleaned = clear_residue(text, &rules()).unwrap();
        assert_eq!(cleaned, r#"<svg><path  d="M0"/></svg>"#);
    }

    #[test]
    fn test_residue_surviving_strip_is_rejected() {
        let text = r#"<svg><text>'data:text/html,hi'</text></svg>"#.to_string();
        let err = clear_residue(text, &rules()).unwrap_err();
        assert!(matches!(err, AppError::StructuralViolation(_)));
    }
}
