use std::collections::HashMap;

use catalog_models::{FusedResult, RetrievedRecord, SearchMethod};

/// Merges semantic and keyword result lists into one ranked, deduplicated
/// list. Pure and idempotent: identical inputs always produce identical
/// output order.
#[derive(Debug, Clone, Copy)]
pub struct ResultFuser {
    pub semantic_weight: f32,
    pub keyword_weight: f32,
}

impl Default for ResultFuser {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            keyword_weight: 0.3,
        }
    }
}

/// Dedup key: trimmed, lower-cased, whitespace-collapsed text.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

struct Candidate {
    record: RetrievedRecord,
    final_score: f32,
    method: SearchMethod,
    semantic_rank: usize,
    keyword_rank: usize,
}

impl ResultFuser {
    pub fn new(semantic_weight: f32, keyword_weight: f32) -> Self {
        Self {
            semantic_weight,
            keyword_weight,
        }
    }

    pub fn fuse(
        &self,
        semantic: &[RetrievedRecord],
        keyword: &[RetrievedRecord],
        top_k: usize,
    ) -> Vec<FusedResult> {
        let mut by_text: HashMap<String, usize> = HashMap::new();
        let mut candidates: Vec<Candidate> = Vec::with_capacity(semantic.len() + keyword.len());

        for (rank, record) in semantic.iter().enumerate() {
            let key = normalize_text(&record.text);
            match by_text.get(&key) {
                // Duplicate text inside one list: keep the first occurrence.
                Some(_) => continue,
                None => {
                    by_text.insert(key, candidates.len());
                    candidates.push(Candidate {
                        record: record.clone(),
                        final_score: record.score * self.semantic_weight,
                        method: SearchMethod::Semantic,
                        semantic_rank: rank,
                        keyword_rank: usize::MAX,
                    });
                }
            }
        }

        for (rank, record) in keyword.iter().enumerate() {
            let key = normalize_text(&record.text);
            match by_text.get(&key) {
                Some(&idx) => {
                    let candidate = &mut candidates[idx];
                    if candidate.keyword_rank != usize::MAX {
                        continue;
                    }
                    candidate.final_score += record.score * self.keyword_weight;
                    candidate.method = SearchMethod::Hybrid;
                    candidate.keyword_rank = rank;
                }
                None => {
                    by_text.insert(key, candidates.len());
                    candidates.push(Candidate {
                        record: record.clone(),
                        final_score: record.score * self.keyword_weight,
                        method: SearchMethod::Keyword,
                        semantic_rank: usize::MAX,
                        keyword_rank: rank,
                    });
                }
            }
        }

        // Descending by final score; ties broken by semantic-list order,
        // then keyword-list order. Never random.
        candidates.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.semantic_rank.cmp(&b.semantic_rank))
                .then(a.keyword_rank.cmp(&b.keyword_rank))
        });
        candidates.truncate(top_k);

        candidates
            .into_iter()
            .map(|c| FusedResult {
                record: c.record,
                final_score: c.final_score,
                fused_method: c.method,
            })
            .collect()
    }
}
