//! Query shaping pipeline
//!
//! Turns raw tool arguments into a [`ShapedQuery`] ready for retrieval:
//! validation and sanitization, exact-term extraction, intent
//! classification, rewriting and filter composition.

mod exact_terms;
mod filter;
mod intent;
mod rewrite;
mod shaper;
pub mod validation;

pub use exact_terms::extract_exact_terms;
pub use filter::{build_filter, escape_filter_value};
pub use intent::classify_intent;
pub use rewrite::rewrite_query;
pub use shaper::{QueryShaper, ShapedQuery};
