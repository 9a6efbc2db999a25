use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::warn;

use catalog_models::FontOption;

use crate::errors::{QaError, QaResult};
use crate::llm::CompletionClient;

/// Structured facts extracted from retrieved context.
///
/// Every string held here is guaranteed to appear verbatim
/// (case-insensitively) in the context it was extracted from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFacts {
    pub material: Option<String>,
    pub fonts: Vec<FontOption>,
    pub mounting: Vec<String>,
    pub finishes: Vec<String>,
    pub modifiers: Map<String, Value>,
}

// Canonical catalog phrasings. The deterministic pass alone reconstructs
// every schema field from context following these conventions.
static FINISH_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Finish option for .*?:\s*(.+?)\s*$").expect("invalid pattern"));
static FINISH_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Available finishes for .*?:\s*(.+?)\s*$").expect("invalid pattern"));
static MOUNTING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Mounting option for .*?:\s*(.+?)\s*$").expect("invalid pattern"));
static MOUNTING_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Mounting options for .*?:\s*(.+?)\s*$").expect("invalid pattern"));
static MATERIAL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Material available:\s*(.+?)\s*$").expect("invalid pattern"));
static MODIFIER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Price modifier for ([^:\n]+?):\s*(.+?)\s*$").expect("invalid pattern"));
static MODIFIER_KV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Modifier:\s*([^=\n]+?)\s*=\s*(.+?)\s*$").expect("invalid pattern"));
static FONT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Font:\s*([A-Za-z0-9 &\-'()]+?)\s*(?:\||$)").expect("invalid pattern"));
static FONT_HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Height:\s*([0-9A-Za-z/\- ]+?)\s*(?:\||$)").expect("invalid pattern"));
static FONT_DEPTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Depth:\s*([0-9A-Za-z/\- ]+?)\s*(?:\||$)").expect("invalid pattern"));
static FONT_PROFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Profile:\s*([A-Za-z0-9/\- ]+?)\s*(?:\||$)").expect("invalid pattern"));

/// Extracts structured field values from retrieved context: a deterministic
/// regex pass that needs no model, plus an optional generative draft whose
/// every value is validated against the context before use.
pub struct GroundedExtractor {
    completion: Option<Arc<dyn CompletionClient>>,
    completion_timeout: Duration,
}

impl GroundedExtractor {
    pub fn new(completion: Option<Arc<dyn CompletionClient>>, completion_timeout: Duration) -> Self {
        Self {
            completion,
            completion_timeout,
        }
    }

    /// Deterministic-only extractor, for deployments without a completion model.
    pub fn deterministic_only() -> Self {
        Self {
            completion: None,
            completion_timeout: Duration::from_secs(0),
        }
    }

    /// Extract facts from context. Generative failures (error, timeout,
    /// malformed output) are absorbed; the deterministic pass always runs.
    pub async fn extract(&self, context: &str, query: &str) -> ExtractedFacts {
        let mut facts = deterministic_pass(context);

        if let Some(client) = &self.completion {
            match self.propose(client.as_ref(), context, query).await {
                Ok(draft) => merge_validated_draft(&mut facts, &draft, context),
                Err(e) => warn!("generative draft unavailable, deterministic facts only: {}", e),
            }
        }

        finalize(&mut facts);
        facts
    }

    /// Ask the completion model for a draft. The result is a hint, never
    /// trusted unchecked.
    async fn propose(
        &self,
        client: &dyn CompletionClient,
        context: &str,
        query: &str,
    ) -> QaResult<Value> {
        let prompt = build_prompt(context, query);

        let raw = match timeout(self.completion_timeout, client.complete(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(QaError::Extraction(format!("completion call failed: {}", e))),
            Err(_) => {
                return Err(QaError::Extraction(format!(
                    "completion call timed out after {}s",
                    self.completion_timeout.as_secs()
                )))
            }
        };

        extract_json_block(&raw)
            .ok_or_else(|| QaError::Extraction("draft was not a JSON object".to_string()))
    }
}

fn build_prompt(context: &str, query: &str) -> String {
    format!(
        r#"You are a strict extractor for signage catalog configuration. Use ONLY the CONTEXT to answer.
Do NOT invent values. If something is not in the context, leave it out or return an empty list.

CONTEXT:
{context}

USER QUERY:
{query}

Return strictly valid JSON only (no explanation) following this schema:

{{
  "material": "<material name>",
  "fonts": [
    {{
      "name": "<font name>",
      "heights": ["<height1>", ...],
      "depths": ["<depth1>", ...],
      "profiles": ["<profile1>", ...]
    }}
  ],
  "mounting": ["<mount1>", ...],
  "finishes": ["<finish1>", ...],
  "modifiers": {{"<modifier>": "<value>"}}
}}

Rules:
- Only include names and option tokens that appear verbatim in the CONTEXT.
- Heights and depths are strings exactly as found in the context.
- If no values are found for a key, return an empty list for that key.
- Return JSON only."#
    )
}

/// Recover a JSON object from raw model output, tolerating stray text around
/// the braces.
fn extract_json_block(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value.is_object().then_some(value);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&raw[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// True when the value appears verbatim (case-insensitively) in the context.
fn grounded(value: &str, context_lower: &str) -> bool {
    !value.trim().is_empty() && context_lower.contains(&value.trim().to_lowercase())
}

fn deterministic_pass(context: &str) -> ExtractedFacts {
    let mut facts = ExtractedFacts::default();

    for cap in FINISH_LINE.captures_iter(context) {
        facts.finishes.push(cap[1].trim().to_string());
    }
    for cap in FINISH_LIST.captures_iter(context) {
        facts
            .finishes
            .extend(cap[1].split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()));
    }

    for cap in MOUNTING_LINE.captures_iter(context) {
        facts.mounting.push(cap[1].trim().to_string());
    }
    for cap in MOUNTING_LIST.captures_iter(context) {
        facts
            .mounting
            .extend(cap[1].split(',').map(|m| m.trim().to_string()).filter(|m| !m.is_empty()));
    }

    if let Some(cap) = MATERIAL_LINE.captures(context) {
        facts.material = Some(cap[1].trim().to_string());
    }

    for cap in MODIFIER_LINE.captures_iter(context) {
        facts
            .modifiers
            .entry(cap[1].trim().to_string())
            .or_insert_with(|| Value::String(cap[2].trim().to_string()));
    }
    for cap in MODIFIER_KV.captures_iter(context) {
        facts
            .modifiers
            .entry(cap[1].trim().to_string())
            .or_insert_with(|| Value::String(cap[2].trim().to_string()));
    }

    // Font lines: "Font: N | Height: H | Depth: D | Profile: P". Multiple
    // lines for the same font accumulate onto one entry.
    for line in context.lines() {
        let Some(name_cap) = FONT_NAME.captures(line) else {
            continue;
        };
        let name = name_cap[1].trim().to_string();
        if name.is_empty() {
            continue;
        }

        let font = font_entry(&mut facts.fonts, &name);
        if let Some(cap) = FONT_HEIGHT.captures(line) {
            font.heights.push(cap[1].trim().to_string());
        }
        if let Some(cap) = FONT_DEPTH.captures(line) {
            font.depths.push(cap[1].trim().to_string());
        }
        if let Some(cap) = FONT_PROFILE.captures(line) {
            font.profiles.push(cap[1].trim().to_string());
        }
    }

    facts
}

/// Find or create the entry for a font, matched case-insensitively.
fn font_entry<'a>(fonts: &'a mut Vec<FontOption>, name: &str) -> &'a mut FontOption {
    let idx = fonts
        .iter()
        .position(|f| f.name.eq_ignore_ascii_case(name))
        .unwrap_or_else(|| {
            fonts.push(FontOption {
                name: name.to_string(),
                ..Default::default()
            });
            fonts.len() - 1
        });
    &mut fonts[idx]
}

/// Merge a generative draft, keeping only values verbatim in the context.
/// Unvalidated values are silently dropped.
fn merge_validated_draft(facts: &mut ExtractedFacts, draft: &Value, context: &str) {
    let ctx_lower = context.to_lowercase();

    if facts.material.is_none() {
        if let Some(material) = draft.get("material").and_then(Value::as_str) {
            if grounded(material, &ctx_lower) {
                facts.material = Some(material.trim().to_string());
            }
        }
    }

    for (key, target) in [("finishes", &mut facts.finishes), ("mounting", &mut facts.mounting)] {
        if let Some(values) = draft.get(key).and_then(Value::as_array) {
            for value in values {
                if let Some(s) = scalar_string(value) {
                    if grounded(&s, &ctx_lower) {
                        target.push(s.trim().to_string());
                    }
                }
            }
        }
    }

    if let Some(draft_fonts) = draft.get("fonts").and_then(Value::as_array) {
        for entry in draft_fonts {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            if !grounded(name, &ctx_lower) {
                continue;
            }

            let font = font_entry(&mut facts.fonts, name.trim());
            for (key, values) in [
                ("heights", &mut font.heights),
                ("depths", &mut font.depths),
                ("profiles", &mut font.profiles),
            ] {
                if let Some(items) = entry.get(key).and_then(Value::as_array) {
                    for item in items {
                        if let Some(s) = scalar_string(item) {
                            if grounded(&s, &ctx_lower) {
                                values.push(s.trim().to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(draft_modifiers) = draft.get("modifiers").and_then(Value::as_object) {
        for (key, value) in draft_modifiers {
            let Some(s) = scalar_string(value) else {
                continue;
            };
            if grounded(key, &ctx_lower) && grounded(&s, &ctx_lower) {
                facts
                    .modifiers
                    .entry(key.trim().to_string())
                    .or_insert_with(|| Value::String(s.trim().to_string()));
            }
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deduplicate and sort every value list. Numeric-aware when all values are
/// numeric strings, lexicographic otherwise.
fn finalize(facts: &mut ExtractedFacts) {
    sort_values(&mut facts.finishes);
    sort_values(&mut facts.mounting);
    for font in &mut facts.fonts {
        sort_values(&mut font.heights);
        sort_values(&mut font.depths);
        sort_values(&mut font.profiles);
    }
}

fn sort_values(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));

    let all_numeric = !values.is_empty() && values.iter().all(|v| v.parse::<f64>().is_ok());
    if all_numeric {
        values.sort_by(|a, b| {
            let (a, b) = (a.parse::<f64>().unwrap_or(0.0), b.parse::<f64>().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        values.sort();
    }
}
