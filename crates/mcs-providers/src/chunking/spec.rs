//! Per-language chunking specifications
//!
//! Node kinds and patterns driving the generic extractor. One spec per
//! supported grammar; everything else goes through the fallback chunker.

use tree_sitter::Language;

/// Declarative description of how to chunk one language
pub struct LanguageSpec {
    /// Language identifier matching the domain's known set
    pub name: &'static str,
    /// Node kinds that become chunks
    pub chunk_kinds: &'static [&'static str],
    /// Node kinds to descend into looking for nested chunks (class bodies,
    /// impl blocks)
    pub container_kinds: &'static [&'static str],
    /// Node kinds whose text is recorded as a file import
    pub import_kinds: &'static [&'static str],
    /// Node kinds representing a call site
    pub call_kinds: &'static [&'static str],
    /// Chunk kinds that define a class-like scope
    pub class_kinds: &'static [&'static str],
    /// Comment prefixes that count as documentation when directly above a
    /// declaration
    pub doc_prefixes: &'static [&'static str],
    /// Line-start patterns for the fallback chunker
    pub fallback_patterns: &'static [&'static str],
    language_fn: fn() -> Language,
}

impl LanguageSpec {
    /// The tree-sitter grammar for this language
    pub fn language(&self) -> Language {
        (self.language_fn)()
    }

    /// Spec for a language identifier, when a grammar is available
    pub fn for_language(name: &str) -> Option<&'static LanguageSpec> {
        ALL_SPECS.iter().copied().find(|s| s.name == name)
    }

    /// Identifiers of all languages with grammars
    pub fn supported() -> &'static [&'static str] {
        SUPPORTED_NAMES
    }
}

static RUST: LanguageSpec = LanguageSpec {
    name: "rust",
    chunk_kinds: &[
        "function_item",
        "struct_item",
        "enum_item",
        "trait_item",
    ],
    container_kinds: &["impl_item", "declaration_list", "mod_item", "trait_item"],
    import_kinds: &["use_declaration"],
    call_kinds: &["call_expression", "macro_invocation"],
    class_kinds: &["impl_item", "struct_item", "enum_item", "trait_item"],
    doc_prefixes: &["///", "//!"],
    fallback_patterns: &[r"^\s*(pub\s+)?fn ", r"^\s*(pub\s+)?struct ", r"^\s*impl "],
    language_fn: || tree_sitter_rust::LANGUAGE.into(),
};

static PYTHON: LanguageSpec = LanguageSpec {
    name: "python",
    chunk_kinds: &["function_definition", "class_definition"],
    container_kinds: &["class_definition", "block", "decorated_definition"],
    import_kinds: &["import_statement", "import_from_statement"],
    call_kinds: &["call"],
    class_kinds: &["class_definition"],
    doc_prefixes: &["#"],
    fallback_patterns: &[r"^def ", r"^class ", r"^async def "],
    language_fn: || tree_sitter_python::LANGUAGE.into(),
};

static JAVASCRIPT: LanguageSpec = LanguageSpec {
    name: "javascript",
    chunk_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "class_declaration",
        "method_definition",
    ],
    container_kinds: &["class_declaration", "class_body", "export_statement"],
    import_kinds: &["import_statement"],
    call_kinds: &["call_expression"],
    class_kinds: &["class_declaration"],
    doc_prefixes: &["//", "/*", "*"],
    fallback_patterns: &[r"^\s*function ", r"^\s*class ", r"^\s*export "],
    language_fn: || tree_sitter_javascript::LANGUAGE.into(),
};

static TYPESCRIPT: LanguageSpec = LanguageSpec {
    name: "typescript",
    chunk_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "class_declaration",
        "method_definition",
        "interface_declaration",
    ],
    container_kinds: &["class_declaration", "class_body", "export_statement"],
    import_kinds: &["import_statement"],
    call_kinds: &["call_expression"],
    class_kinds: &["class_declaration", "interface_declaration"],
    doc_prefixes: &["//", "/*", "*"],
    fallback_patterns: &[r"^\s*function ", r"^\s*class ", r"^\s*export "],
    language_fn: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
};

static GO: LanguageSpec = LanguageSpec {
    name: "go",
    chunk_kinds: &["function_declaration", "method_declaration", "type_declaration"],
    container_kinds: &[],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    class_kinds: &["type_declaration"],
    doc_prefixes: &["//"],
    fallback_patterns: &[r"^func ", r"^type "],
    language_fn: || tree_sitter_go::LANGUAGE.into(),
};

static ALL_SPECS: [&LanguageSpec; 5] = [&RUST, &PYTHON, &JAVASCRIPT, &TYPESCRIPT, &GO];

static SUPPORTED_NAMES: &[&str] = &["rust", "python", "javascript", "typescript", "go"];
