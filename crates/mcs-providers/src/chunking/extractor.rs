//! Generic tree-sitter chunk extraction
//!
//! Walks a parsed file and produces one chunk per declaration the language
//! spec marks as chunk-worthy, down to [`CHUNK_MAX_DEPTH`] levels so methods
//! inside classes and impl blocks are captured. Structural metadata
//! (signature, imports, called functions, docstring) is extracted in the
//! same pass.

use chrono::{DateTime, Utc};
use tree_sitter::Node;

use mcs_domain::entities::CodeChunk;

use crate::constants::{
    CHUNK_MAX_DEPTH, MAX_CALLED_FUNCTIONS, MAX_CHUNKS_PER_FILE, MAX_IMPORTS_PER_FILE,
    MIN_CHUNK_CHARS,
};

use super::spec::LanguageSpec;

/// Extract chunks from a parsed tree
pub fn extract_chunks(
    spec: &LanguageSpec,
    tree: &tree_sitter::Tree,
    content: &str,
    repository: &str,
    file_path: &str,
    last_modified: DateTime<Utc>,
) -> Vec<CodeChunk> {
    let root = tree.root_node();
    let imports = collect_imports(spec, root, content);

    let mut chunks = Vec::new();
    walk(
        spec,
        root,
        content,
        repository,
        file_path,
        last_modified,
        &imports,
        None,
        0,
        &mut chunks,
    );
    chunks.truncate(MAX_CHUNKS_PER_FILE);
    chunks
}

#[allow(clippy::too_many_arguments)]
fn walk(
    spec: &LanguageSpec,
    node: Node<'_>,
    content: &str,
    repository: &str,
    file_path: &str,
    last_modified: DateTime<Utc>,
    imports: &[String],
    enclosing_class: Option<&str>,
    depth: usize,
    chunks: &mut Vec<CodeChunk>,
) {
    if depth > CHUNK_MAX_DEPTH || chunks.len() >= MAX_CHUNKS_PER_FILE {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if spec.chunk_kinds.contains(&kind) {
            let class_name = if spec.class_kinds.contains(&kind) {
                node_name(child, content)
            } else {
                None
            };
            if let Some(chunk) = build_chunk(
                spec,
                child,
                content,
                repository,
                file_path,
                last_modified,
                imports,
                enclosing_class,
            ) {
                chunks.push(chunk);
            }
            // Classes and impl blocks also contain methods worth their own
            // chunks.
            if spec.container_kinds.contains(&kind) || class_name.is_some() {
                let class = class_name
                    .as_deref()
                    .or(enclosing_class)
                    .map(str::to_string);
                walk(
                    spec,
                    child,
                    content,
                    repository,
                    file_path,
                    last_modified,
                    imports,
                    class.as_deref(),
                    depth + 1,
                    chunks,
                );
            }
        } else if spec.container_kinds.contains(&kind) {
            let class = node_name(child, content);
            walk(
                spec,
                child,
                content,
                repository,
                file_path,
                last_modified,
                imports,
                class.as_deref().or(enclosing_class),
                depth + 1,
                chunks,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_chunk(
    spec: &LanguageSpec,
    node: Node<'_>,
    content: &str,
    repository: &str,
    file_path: &str,
    last_modified: DateTime<Utc>,
    imports: &[String],
    enclosing_class: Option<&str>,
) -> Option<CodeChunk> {
    let text = node_text(node, content)?;
    if text.len() < MIN_CHUNK_CHARS {
        return None;
    }

    let start_line = node.start_position().row as u32 + 1;
    let end_line = node.end_position().row as u32 + 1;
    let name = node_name(node, content);
    let is_class = spec.class_kinds.contains(&node.kind());

    let mut chunk = CodeChunk::new(
        repository,
        file_path,
        start_line,
        end_line,
        text,
        last_modified,
    );
    chunk.language = spec.name.to_string();
    chunk.signature = signature_of(node, content);
    chunk.imports = imports.to_vec();
    chunk.called_functions = collect_calls(spec, node, content);
    chunk.docstring = docstring_of(spec, node, content);
    if is_class {
        chunk.class_name = name;
        chunk.function_name = None;
    } else {
        chunk.function_name = name;
        chunk.class_name = enclosing_class.map(str::to_string);
    }
    Some(chunk)
}

fn node_text<'a>(node: Node<'_>, content: &'a str) -> Option<&'a str> {
    node.utf8_text(content.as_bytes()).ok()
}

fn node_name(node: Node<'_>, content: &str) -> Option<String> {
    node.child_by_field_name("name")
        // Rust impl blocks carry the type under `type`, not `name`.
        .or_else(|| node.child_by_field_name("type"))
        .and_then(|n| node_text(n, content))
        .map(str::to_string)
}

/// The declaration's first line, up to the body opener
fn signature_of(node: Node<'_>, content: &str) -> Option<String> {
    let text = node_text(node, content)?;
    let first_line = text.lines().next()?.trim();
    let signature = first_line
        .split_once('{')
        .map_or(first_line, |(head, _)| head.trim_end());
    Some(signature.trim_end_matches(':').trim().to_string())
}

/// Imports declared at the top level of the file
fn collect_imports(spec: &LanguageSpec, root: Node<'_>, content: &str) -> Vec<String> {
    let mut imports = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if spec.import_kinds.contains(&child.kind()) {
            if let Some(text) = node_text(child, content) {
                for line in text.lines() {
                    let line = line.trim();
                    if !line.is_empty() && imports.len() < MAX_IMPORTS_PER_FILE {
                        imports.push(line.trim_end_matches(';').to_string());
                    }
                }
            }
        }
        if imports.len() >= MAX_IMPORTS_PER_FILE {
            break;
        }
    }
    imports
}

/// Function names called within the chunk, deduplicated in order
fn collect_calls(spec: &LanguageSpec, node: Node<'_>, content: &str) -> Vec<String> {
    let mut calls = Vec::new();
    collect_calls_rec(spec, node, content, &mut calls);
    calls
}

fn collect_calls_rec(spec: &LanguageSpec, node: Node<'_>, content: &str, out: &mut Vec<String>) {
    if out.len() >= MAX_CALLED_FUNCTIONS {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if spec.call_kinds.contains(&child.kind()) {
            let callee = child
                .child_by_field_name("function")
                .or_else(|| child.named_child(0));
            if let Some(name) = callee.and_then(|c| node_text(c, content)) {
                // `a.b.c(...)` records the trailing segment.
                let name = name
                    .rsplit(['.', ':'])
                    .next()
                    .unwrap_or(name)
                    .trim()
                    .to_string();
                if !name.is_empty()
                    && name.len() <= 64
                    && !name.contains('\n')
                    && !out.contains(&name)
                {
                    out.push(name);
                }
            }
        }
        collect_calls_rec(spec, child, content, out);
        if out.len() >= MAX_CALLED_FUNCTIONS {
            return;
        }
    }
}

/// Documentation attached to the declaration.
///
/// Python reads the leading string expression of the body; other languages
/// collect the contiguous comment block directly above the declaration.
fn docstring_of(spec: &LanguageSpec, node: Node<'_>, content: &str) -> Option<String> {
    if spec.name == "python" {
        let body = node.child_by_field_name("body")?;
        let first = body.named_child(0)?;
        if first.kind() == "expression_statement" {
            let string = first.named_child(0)?;
            if string.kind() == "string" {
                let text = node_text(string, content)?;
                let trimmed = text
                    .trim_matches(|c| c == '"' || c == '\'')
                    .trim()
                    .to_string();
                return (!trimmed.is_empty()).then_some(trimmed);
            }
        }
        return None;
    }

    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(prev) = sibling {
        if !prev.kind().contains("comment") {
            break;
        }
        let text = node_text(prev, content)?.trim().to_string();
        let is_doc = spec.doc_prefixes.iter().any(|p| text.starts_with(p));
        if !is_doc {
            break;
        }
        lines.push(clean_comment(&text));
        sibling = prev.prev_sibling();
    }
    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join(" ").trim().to_string())
}

fn clean_comment(text: &str) -> String {
    text.trim_start_matches('/')
        .trim_start_matches('*')
        .trim_start_matches('!')
        .trim_start_matches('#')
        .trim()
        .trim_end_matches("*/")
        .trim()
        .to_string()
}
