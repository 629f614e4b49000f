//! Embedding providers
//!
//! Implementations of the `EmbeddingProvider` port plus the lazy lifecycle
//! wrapper enforcing the `uninitialized → enabled | disabled` state machine.

mod lazy;
mod null;
mod openai;

pub use lazy::LazyEmbeddingProvider;
pub use null::NullEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
