//! Partial-failure-tolerant merging of per-chunk extraction results
//!
//! Merging never fails as a whole: failed chunks are recorded as
//! warnings and errors while the successful chunks still produce items.
//! Each successful chunk yields exactly one item tagged with the
//! chunk's page range and provenance.

use docflow_domain::{ChunkResult, ChunkTier, MergeMetadata, MergedItem, MergedResult};
use serde_json::Value;

/// Merges an unordered set of chunk results into one file-level result
pub struct ResultMerger;

impl ResultMerger {
    /// Merge chunk results, tolerating any number of failures
    ///
    /// Results are ordered by chunk index before merging, so callers may
    /// hand over completion-order output directly.
    pub fn merge(mut results: Vec<ChunkResult>, tier: ChunkTier) -> MergedResult {
        results.sort_by_key(|r| r.chunk_index);

        let total_chunks = results.len();
        let total_tokens: usize = results.iter().map(|r| r.tokens_used).sum();
        let cache_hits = results.iter().filter(|r| r.cache_hit).count();

        let mut items = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for result in results {
            if result.success {
                items.push(MergedItem {
                    data: normalize_payload(result.payload),
                    start_page: result.start_page,
                    end_page: result.end_page,
                    document_index: result.document_index,
                    tokens_used: result.tokens_used,
                    cache_hit: result.cache_hit,
                    confidence: result.confidence,
                });
            } else {
                let reason = result.error.unwrap_or_else(|| "unknown error".to_string());
                warnings.push(format!(
                    "Chunk {} (pages {}-{}) failed: {}",
                    result.chunk_index, result.start_page, result.end_page, reason
                ));
                errors.push(reason);
            }
        }

        let failed_chunks = errors.len();
        let successful_chunks = total_chunks - failed_chunks;

        if failed_chunks > 0 {
            tracing::warn!(
                "Merged with {} of {} chunks failed ({})",
                failed_chunks,
                total_chunks,
                tier
            );
        }

        MergedResult {
            success: failed_chunks == 0,
            items,
            metadata: MergeMetadata {
                total_chunks,
                successful_chunks,
                failed_chunks,
                total_tokens,
                cache_hit_rate: percentage(cache_hits, total_chunks),
                tier,
                warnings,
            },
            errors,
        }
    }

    /// Merge and then drop items whose payload repeats an earlier value
    /// under `key`; the first occurrence wins
    ///
    /// Items whose payload lacks `key` are always kept.
    pub fn merge_deduplicated(
        results: Vec<ChunkResult>,
        tier: ChunkTier,
        key: &str,
    ) -> MergedResult {
        let mut merged = Self::merge(results, tier);

        let mut seen: Vec<Value> = Vec::new();
        let before = merged.items.len();

        merged.items.retain(|item| match item.data.get(key) {
            Some(value) => {
                if seen.contains(value) {
                    false
                } else {
                    seen.push(value.clone());
                    true
                }
            }
            None => true,
        });

        let removed = before - merged.items.len();
        if removed > 0 {
            merged.metadata.warnings.push(format!(
                "Removed {} duplicate item(s) sharing the same \"{}\"",
                removed, key
            ));
        }

        merged
    }
}

/// `part` over `total` as a percentage; 0.0 for an empty total
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Coerce a raw provider payload into structured JSON
///
/// Objects and arrays pass through; strings are parsed as JSON when
/// possible and wrapped otherwise; any other scalar is wrapped.
fn normalize_payload(payload: Value) -> Value {
    match payload {
        Value::Object(_) | Value::Array(_) => payload,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
            _ => serde_json::json!({ "text": s }),
        },
        other => serde_json::json!({ "value": other }),
    }
}
