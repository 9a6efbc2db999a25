use once_cell::sync::Lazy;
use regex::Regex;

use catalog_models::FontAttribute;

/// Answer intents, selected exactly once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Material,
    Fonts,
    FontAttribute,
    Mounting,
    Finishes,
    Modifiers,
    General,
}

/// Classification result, including the entity/attribute resolution for
/// font-attribute queries.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentMatch {
    pub intent: Intent,
    pub target_font: Option<String>,
    pub attribute: Option<FontAttribute>,
}

impl IntentMatch {
    fn simple(intent: Intent) -> Self {
        Self {
            intent,
            target_font: None,
            attribute: None,
        }
    }
}

struct Rule {
    intent: Intent,
    matches: Regex,
    /// A rule does not fire when this pattern also matches.
    unless: Option<Regex>,
}

/// Ordered rule table, first match wins. Evaluated against the lower-cased
/// query; fully deterministic, no model involved.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let rule = |intent, pattern: &str, unless: Option<&str>| Rule {
        intent,
        matches: Regex::new(pattern).expect("invalid intent rule pattern"),
        unless: unless.map(|p| Regex::new(p).expect("invalid intent guard pattern")),
    };

    vec![
        rule(Intent::Material, r"\bmaterials?\b", None),
        rule(
            Intent::Fonts,
            r"\bfonts?\b|\btypefaces?\b",
            Some(r"height|depth|profile|size"),
        ),
        rule(
            Intent::Mounting,
            r"\bmount(ing|ed)?\b|\binstall(ing|ed|ation)?\b",
            None,
        ),
        rule(Intent::Finishes, r"\bfinish(es)?\b|\bcolors?\b|\bpaint\b", None),
        rule(
            Intent::Modifiers,
            r"\bprice\b|\bcost\b|\bmodifiers?\b|\bpricing\b",
            None,
        ),
        rule(
            Intent::FontAttribute,
            r"\bheights?\b|\bdepths?\b|\bprofiles?\b|\bsizes?\b",
            None,
        ),
    ]
});

/// Fallback entity capture: a quoted or capitalized phrase after "for"/"of".
static TARGET_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:for|of)\s+"?([A-Za-z0-9 &\-']{2,40})"?"#).expect("invalid pattern"));

static HEIGHT_TERMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bheights?\b|\bsizes?\b").expect("invalid pattern"));
static DEPTH_TERMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdepths?\b").expect("invalid pattern"));
static PROFILE_TERMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bprofiles?\b").expect("invalid pattern"));

/// Classify a query. `known_fonts` are font names extracted from the
/// retrieved context, used to resolve the target of attribute queries.
pub fn classify(query: &str, known_fonts: &[String]) -> IntentMatch {
    let q = query.to_lowercase();

    for rule in RULES.iter() {
        if !rule.matches.is_match(&q) {
            continue;
        }
        if let Some(guard) = &rule.unless {
            if guard.is_match(&q) {
                continue;
            }
        }

        if rule.intent == Intent::FontAttribute {
            return IntentMatch {
                intent: Intent::FontAttribute,
                target_font: resolve_target_font(query, &q, known_fonts),
                attribute: Some(resolve_attribute(&q)),
            };
        }
        return IntentMatch::simple(rule.intent);
    }

    IntentMatch::simple(Intent::General)
}

fn resolve_target_font(query: &str, q_lower: &str, known_fonts: &[String]) -> Option<String> {
    // Whole-word match of any known font name, case-insensitive.
    for font in known_fonts {
        if font.is_empty() {
            continue;
        }
        let pattern = format!(r"\b{}\b", regex::escape(&font.to_lowercase()));
        if Regex::new(&pattern).map(|re| re.is_match(q_lower)).unwrap_or(false) {
            return Some(font.clone());
        }
    }

    // Fallback: phrase following "for" or "of" in the original-cased query.
    TARGET_PHRASE
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Attribute sub-type. When the rule fired but none of the attribute terms
/// disambiguate, heights is the documented default.
fn resolve_attribute(q_lower: &str) -> FontAttribute {
    if HEIGHT_TERMS.is_match(q_lower) {
        FontAttribute::Heights
    } else if DEPTH_TERMS.is_match(q_lower) {
        FontAttribute::Depths
    } else if PROFILE_TERMS.is_match(q_lower) {
        FontAttribute::Profiles
    } else {
        FontAttribute::Heights
    }
}
