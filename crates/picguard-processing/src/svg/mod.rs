//! SVG handling
//!
//! SVG is markup and can carry scripts, event handlers and references to
//! external or inline resources. Uploads are screened as text, rewritten
//! through two tree passes and screened again before they are stored.

pub mod normalize;
pub mod rules;
pub mod sanitizer;
pub mod screen;
pub mod serialize;

pub use rules::{PatternRule, RuleScope, SvgRules, SVG_RULES_VERSION};
pub use sanitizer::SvgSanitizer;
