use chrono::Utc;

use catalog_models::{
    FinishesAnswer, FontAttribute, FontAttributeAnswer, FontsAnswer, FusedResult, GeneralAnswer,
    MaterialAnswer, ModifiersAnswer, MountingAnswer, StructuredAnswer,
};

use crate::services::extractor::ExtractedFacts;
use crate::services::intent::{Intent, IntentMatch};

/// Catalog material vocabulary: query keywords and the canonical name they
/// map to. Checked in order; all matches are collected.
const MATERIAL_KEYWORDS: &[(&[&str], &str)] = &[
    (&["cast metal", "cast-metal", "castmetal"], "Cast Metal"),
    (&["bronze"], "Bronze"),
    (&["aluminum"], "Aluminum"),
    (&["brass"], "Brass"),
    (&["steel"], "Steel"),
];

/// Canonical material names mentioned in the query, in vocabulary order.
pub fn material_candidates(query: &str) -> Vec<String> {
    let q = query.to_lowercase();
    MATERIAL_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|kw| q.contains(kw)))
        .map(|(_, canonical)| canonical.to_string())
        .collect()
}

/// Unique source names from fused results, in first-seen order.
pub fn collect_sources(results: &[FusedResult]) -> Vec<String> {
    let mut sources = Vec::new();
    for result in results {
        if let Some(source) = result.record.source() {
            if !sources.iter().any(|s| s == &source) {
                sources.push(source);
            }
        }
    }
    sources
}

/// Builds the intent-shaped structured answer from extracted facts.
pub struct AnswerAssembler;

impl AnswerAssembler {
    pub fn assemble(
        query: &str,
        matched: &IntentMatch,
        facts: &ExtractedFacts,
        results: &[FusedResult],
    ) -> StructuredAnswer {
        let materials = material_candidates(query);
        let material = materials
            .first()
            .cloned()
            .or_else(|| facts.material.clone());
        let sources = collect_sources(results);
        let timestamp = Utc::now();
        let query = query.to_string();

        match matched.intent {
            Intent::Material => StructuredAnswer::Material(MaterialAnswer {
                query,
                material,
                materials,
                sources,
                timestamp,
            }),
            Intent::Fonts => StructuredAnswer::Fonts(FontsAnswer {
                query,
                material,
                fonts: facts.fonts.iter().map(|f| f.name.clone()).collect(),
                sources,
                timestamp,
            }),
            Intent::FontAttribute => {
                let attribute = matched.attribute.unwrap_or(FontAttribute::Heights);
                let font_name = matched
                    .target_font
                    .clone()
                    .or_else(|| facts.fonts.first().map(|f| f.name.clone()))
                    .unwrap_or_default();
                let values = facts
                    .fonts
                    .iter()
                    .find(|f| f.name.eq_ignore_ascii_case(&font_name))
                    .map(|f| attribute_values(f, attribute))
                    .unwrap_or_default();

                StructuredAnswer::FontAttribute(FontAttributeAnswer {
                    query,
                    material,
                    font_name,
                    attribute,
                    values,
                    sources,
                    timestamp,
                })
            }
            Intent::Mounting => StructuredAnswer::Mounting(MountingAnswer {
                query,
                material,
                mounting_options: facts.mounting.clone(),
                sources,
                timestamp,
            }),
            Intent::Finishes => StructuredAnswer::Finishes(FinishesAnswer {
                query,
                material,
                finishes: facts.finishes.clone(),
                sources,
                timestamp,
            }),
            Intent::Modifiers => StructuredAnswer::Modifiers(ModifiersAnswer {
                query,
                material,
                modifiers: facts.modifiers.clone(),
                sources,
                timestamp,
            }),
            Intent::General => StructuredAnswer::General(GeneralAnswer {
                query,
                material,
                fonts: facts.fonts.clone(),
                mounting: facts.mounting.clone(),
                finishes: facts.finishes.clone(),
                modifiers: facts.modifiers.clone(),
                sources,
                timestamp,
            }),
        }
    }
}

fn attribute_values(font: &catalog_models::FontOption, attribute: FontAttribute) -> Vec<String> {
    match attribute {
        FontAttribute::Heights => font.heights.clone(),
        FontAttribute::Depths => font.depths.clone(),
        FontAttribute::Profiles => font.profiles.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::{FontOption, RetrievedRecord, SearchMethod};
    use serde_json::json;

    fn result_with_source(source: &str) -> FusedResult {
        let payload = json!({"page_content": "text", "metadata": {"source": source}});
        let record = RetrievedRecord {
            text: "text".to_string(),
            metadata: payload["metadata"].as_object().cloned().unwrap_or_default(),
            score: 0.9,
            method: SearchMethod::Semantic,
        };
        FusedResult {
            record,
            final_score: 0.63,
            fused_method: SearchMethod::Semantic,
        }
    }

    #[test]
    fn test_material_candidates_matches_variants() {
        assert_eq!(material_candidates("cast-metal letters"), vec!["Cast Metal"]);
        assert_eq!(
            material_candidates("bronze or aluminum?"),
            vec!["Bronze", "Aluminum"]
        );
        assert!(material_candidates("vinyl banners").is_empty());
    }

    #[test]
    fn test_collect_sources_dedupes_in_first_seen_order() {
        let results = vec![
            result_with_source("catalog_b.pdf"),
            result_with_source("catalog_a.pdf"),
            result_with_source("catalog_b.pdf"),
        ];
        assert_eq!(
            collect_sources(&results),
            vec!["catalog_b.pdf", "catalog_a.pdf"]
        );
    }

    #[test]
    fn test_font_attribute_answer_picks_target_font_values() {
        let facts = ExtractedFacts {
            fonts: vec![
                FontOption {
                    name: "Optima".to_string(),
                    heights: vec!["1".to_string()],
                    ..Default::default()
                },
                FontOption {
                    name: "Garamond".to_string(),
                    heights: vec!["2".to_string(), "3".to_string()],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let matched = IntentMatch {
            intent: Intent::FontAttribute,
            target_font: Some("Garamond".to_string()),
            attribute: Some(FontAttribute::Heights),
        };

        let answer = AnswerAssembler::assemble("heights for Garamond?", &matched, &facts, &[]);
        match answer {
            StructuredAnswer::FontAttribute(a) => {
                assert_eq!(a.font_name, "Garamond");
                assert_eq!(a.values, vec!["2", "3"]);
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }

    #[test]
    fn test_material_answer_prefers_query_keyword_over_facts() {
        let facts = ExtractedFacts {
            material: Some("Steel".to_string()),
            ..Default::default()
        };
        let matched = IntentMatch {
            intent: Intent::Material,
            target_font: None,
            attribute: None,
        };

        let answer =
            AnswerAssembler::assemble("what materials? bronze maybe", &matched, &facts, &[]);
        match answer {
            StructuredAnswer::Material(a) => {
                assert_eq!(a.material.as_deref(), Some("Bronze"));
                assert_eq!(a.materials, vec!["Bronze"]);
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }

    #[test]
    fn test_general_answer_carries_all_facts() {
        let facts = ExtractedFacts {
            material: Some("Cast Metal".to_string()),
            finishes: vec!["Brushed".to_string()],
            mounting: vec!["Stud mount".to_string()],
            ..Default::default()
        };
        let matched = IntentMatch {
            intent: Intent::General,
            target_font: None,
            attribute: None,
        };

        let answer = AnswerAssembler::assemble("tell me everything", &matched, &facts, &[]);
        match answer {
            StructuredAnswer::General(a) => {
                assert_eq!(a.material.as_deref(), Some("Cast Metal"));
                assert_eq!(a.finishes, vec!["Brushed"]);
                assert_eq!(a.mounting, vec!["Stud mount"]);
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }
}
