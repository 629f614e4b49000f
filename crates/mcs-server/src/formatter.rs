//! Search response formatting
//!
//! Shapes a ranked page into the wire response for the requested detail
//! level: `full` returns the rich items, `compact` one small object per
//! result, `ultra` single-line strings for chat UIs. Also applies the
//! smart snippet truncation (first highlight, else first non-comment line,
//! 120-char headline).

use serde_json::{json, Value};

use mcs_domain::value_objects::{DetailLevel, RankedResult, SearchPage, SearchQuery};

/// Headline length cap
const HEADLINE_CHARS: usize = 120;

/// First highlight snippet of a result, when any
fn first_highlight(result: &RankedResult) -> Option<&str> {
    result
        .highlights
        .values()
        .flat_map(|snippets| snippets.iter())
        .next()
        .map(String::as_str)
}

/// First non-empty, non-comment line of the content
fn headline_from_content(content: &str) -> String {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let is_comment = trimmed.starts_with('#')
            || trimmed.starts_with("//")
            || trimmed.starts_with("/*")
            || trimmed.starts_with('*')
            || trimmed.starts_with("<!--");
        if is_comment {
            continue;
        }
        return truncate(trimmed, HEADLINE_CHARS);
    }
    content
        .lines()
        .next()
        .map(|l| truncate(l.trim(), HEADLINE_CHARS))
        .unwrap_or_else(|| "No content".to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}

/// Headline for a result: highlight first, content fallback
fn headline_of(result: &RankedResult) -> String {
    match first_highlight(result) {
        Some(highlight) => truncate(highlight, HEADLINE_CHARS),
        None => headline_from_content(&result.content),
    }
}

/// Replace each item's content with a `snippet_lines`-bounded excerpt
pub fn truncate_snippets(items: &mut [RankedResult], snippet_lines: usize) {
    if snippet_lines == 0 {
        return;
    }
    for item in items {
        let headline = headline_of(item);
        if snippet_lines > 1 {
            let extra: Vec<&str> = item.content.lines().skip(1).take(snippet_lines - 1).collect();
            let mut lines = vec![headline];
            lines.extend(extra.into_iter().map(str::to_string));
            item.content = lines.join("\n");
        } else {
            item.content = headline;
        }
    }
}

fn compact_item(result: &RankedResult) -> Value {
    let mut entry = json!({
        "id": result.id,
        "rank": result.rank,
        "file": format!("{}:{}", result.file_path, result.start_line),
        "repo": result.repository,
        "language": result.language,
        "lines": [result.start_line, result.end_line],
        "score": (result.relevance * 10_000.0).round() / 10_000.0,
        "match": result
            .function_name
            .as_deref()
            .or(result.class_name.as_deref())
            .map(str::to_string)
            .or_else(|| first_highlight(result).map(str::to_string))
            .unwrap_or_else(|| "Code match".to_string()),
        "headline": headline_from_content(&result.content),
    });
    if let Some((field, snippets)) = result.highlights.iter().find(|(_, s)| !s.is_empty()) {
        entry["why"] = json!(truncate(&snippets[0], HEADLINE_CHARS));
        entry["why_field"] = json!(field);
    }
    entry
}

fn ultra_item(result: &RankedResult) -> Value {
    let why = first_highlight(result)
        .map(str::to_string)
        .unwrap_or_else(|| "Match".to_string());
    json!(format!(
        "#{} {}:{} [{}] score={:.3} | {} || {}",
        result.rank,
        result.file_path,
        result.start_line,
        if result.language.is_empty() { "?" } else { &result.language },
        result.relevance,
        why,
        headline_from_content(&result.content),
    ))
}

/// Build the `search_code` response body for a page
pub fn format_search_response(
    query: &SearchQuery,
    page: &SearchPage,
    took_ms: u64,
    include_timings: bool,
) -> Value {
    let mut items = page.items.clone();
    if query.snippet_lines > 0 && query.detail_level == DetailLevel::Full {
        truncate_snippets(&mut items, query.snippet_lines);
    }

    let rendered: Value = match query.detail_level {
        DetailLevel::Full => json!(items),
        DetailLevel::Compact => json!(items.iter().map(compact_item).collect::<Vec<_>>()),
        DetailLevel::Ultra => json!(items.iter().map(ultra_item).collect::<Vec<_>>()),
    };

    let mut response = json!({
        "items": rendered,
        "count": page.items.len(),
        "total": page.total,
        "took_ms": took_ms,
        "query": query.text,
        "query_id": page.query_id,
        "applied_exact_terms": page.applied_exact_terms,
        "exact_terms": page.exact_terms,
        "detail_level": query.detail_level,
        "backend": page.backend.as_str(),
        "semantic_used": page.semantic_used,
        "has_more": page.has_more(query.skip),
        "next_skip": page.next_skip(query.skip),
    });
    if page.from_cache {
        response["from_cache"] = json!(true);
    }
    if include_timings {
        response["timings_ms"] = json!(page.timings);
    }
    response
}
