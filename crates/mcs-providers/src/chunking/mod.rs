//! AST-aware code chunking
//!
//! Splits source files into semantic chunks. Languages with a tree-sitter
//! grammar get one chunk per top-level function/class (and methods one level
//! down), each carrying signature, file imports, called functions and
//! docstring. Parse failures fall back to pattern-based splitting; anything
//! else becomes a single whole-file chunk with truncated content.

mod engine;
mod extractor;
mod fallback;
mod spec;

pub use engine::ChunkingEngine;
pub use spec::LanguageSpec;
