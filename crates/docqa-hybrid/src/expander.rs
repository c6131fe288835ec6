//! Rewrites one user question into several diversified search queries.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use docqa_core::traits::ChatModel;

const EXPANSION_TEMPLATE: &str = "You are helping search a document collection.\n\
Rewrite the question below into exactly 5 different search queries that together cover \
its wording, synonyms and likely related terms.\n\
Write one query per line. Do not number the lines, do not quote them, and write nothing else.\n\n\
Question: {query}";

static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+").expect("valid ordinal pattern"));

pub fn build_prompt(query: &str) -> String {
    EXPANSION_TEMPLATE.replace("{query}", query)
}

/// Clean the model's raw reply into at most `max` distinct queries.
///
/// Ordinal markers and surrounding quotes are stripped, blank lines dropped,
/// duplicates removed case-insensitively keeping the first occurrence.
pub fn postprocess(raw: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in raw.lines() {
        let line = ORDINAL.replace(line, "");
        let line = strip_enclosing_quotes(line.trim());
        if line.is_empty() { continue; }
        if seen.insert(line.to_lowercase()) {
            out.push(line.to_string());
        }
        if out.len() == max { break; }
    }
    out
}

const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('“', '”'), ('`', '`')];

/// Remove one pair of quotes wrapping the whole line. A lone or unbalanced
/// quote is content and stays.
fn strip_enclosing_quotes(line: &str) -> &str {
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = line.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim();
            }
        }
    }
    line
}

/// Expand `query` with one model call. Never fails: a model error, a timeout
/// or an unusable reply all yield `[query]`.
pub async fn expand(model: &dyn ChatModel, query: &str, max: usize, timeout: Duration) -> Vec<String> {
    let fallback = || vec![query.to_string()];
    let prompt = build_prompt(query);
    let raw = match tokio::time::timeout(timeout, model.complete(&prompt)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!(error = %e, "query expansion failed, using original query");
            return fallback();
        }
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "query expansion timed out, using original query");
            return fallback();
        }
    };
    let queries = postprocess(&raw, max.max(1));
    if queries.is_empty() {
        warn!("query expansion returned no usable lines, using original query");
        return fallback();
    }
    debug!(count = queries.len(), "expanded queries");
    queries
}
