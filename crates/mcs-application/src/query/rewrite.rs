//! Query rewriting
//!
//! Generates recall-improving variants of a sanitized query: identifier
//! splitting (camelCase/snake_case), code-synonym expansion and import-path
//! expansion. The original query is always variant zero.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum variants returned, including the original
const MAX_VARIANTS: usize = 4;

/// Synonym groups for common programming vocabulary
static SYNONYMS: &[(&str, &[&str])] = &[
    ("auth", &["authentication", "authorization"]),
    ("authentication", &["auth", "login"]),
    ("db", &["database", "storage"]),
    ("database", &["db", "storage"]),
    ("api", &["endpoint", "route"]),
    ("func", &["function", "method"]),
    ("function", &["method"]),
    ("var", &["variable", "parameter"]),
    ("err", &["error", "exception"]),
    ("error", &["exception", "fault"]),
    ("config", &["configuration", "settings"]),
    ("configuration", &["config", "settings"]),
    ("init", &["initialize", "setup"]),
    ("initialize", &["init", "bootstrap"]),
];

static CAMEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

/// Split camelCase and snake_case identifiers into words
fn split_identifiers(query: &str) -> String {
    let with_camel_spaces = CAMEL_RE.replace_all(query, "$1 $2");
    with_camel_spaces
        .split_whitespace()
        .map(|token| token.replace('_', " "))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Expand path-like tokens (`a::b::c`, `a/b/c`, `a.b.c`) into their segments
fn expand_paths(query: &str) -> Option<String> {
    let mut expanded = false;
    let rewritten = query
        .split_whitespace()
        .map(|token| {
            if token.contains("::") || (token.contains('/') && !token.starts_with("http")) {
                expanded = true;
                token
                    .split(|c| c == ':' || c == '/')
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    expanded.then_some(rewritten)
}

/// Append synonyms for any recognized tokens
fn expand_synonyms(query: &str) -> Option<String> {
    let lowered = query.to_lowercase();
    let mut additions: Vec<&str> = Vec::new();
    for token in lowered.split_whitespace() {
        if let Some((_, synonyms)) = SYNONYMS.iter().find(|(k, _)| *k == token) {
            for synonym in *synonyms {
                if !lowered.contains(synonym) && !additions.contains(synonym) {
                    additions.push(synonym);
                }
            }
        }
    }
    if additions.is_empty() {
        return None;
    }
    Some(format!("{query} {}", additions.join(" ")))
}

/// Generate 1..N query variants; the original is always first.
///
/// Returns the variants and the names of the rules that produced them.
pub fn rewrite_query(query: &str) -> (Vec<String>, Vec<String>) {
    let mut variants = vec![query.to_string()];
    let mut rules = Vec::new();

    let split = split_identifiers(query);
    if split != query.to_lowercase() && !variants.contains(&split) {
        variants.push(split);
        rules.push("identifier_split".to_string());
    }

    if let Some(expanded) = expand_paths(query) {
        if !variants.contains(&expanded) {
            variants.push(expanded);
            rules.push("path_expansion".to_string());
        }
    }

    if let Some(with_synonyms) = expand_synonyms(query) {
        if !variants.contains(&with_synonyms) {
            variants.push(with_synonyms);
            rules.push("synonym_expansion".to_string());
        }
    }

    variants.truncate(MAX_VARIANTS);
    (variants, rules)
}
