//! Provider abstractions for completion and knowledge storage
//!
//! Completion providers are selected through `ProviderChain`; the knowledge
//! store backs both documents and themes.

pub mod chain;
pub mod gemini;
pub mod knowledge_store;
pub mod llm;
pub mod local;
pub mod openai;

pub use chain::{Completion, ProviderChain};
pub use gemini::GeminiClient;
pub use knowledge_store::{KnowledgeStore, Metadata, MetadataFilter, StoreMatch, StoreRecord};
pub use llm::{CompletionOptions, CompletionProvider};
pub use local::LocalKnowledgeStore;
pub use openai::OpenAiCompatibleClient;
