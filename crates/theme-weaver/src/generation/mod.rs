//! Answer generation, citation extraction, and theme identification

pub mod citation;
pub mod prompt;
pub mod theme_identifier;
pub mod theme_parser;

pub use citation::CitationParser;
pub use prompt::{PromptBuilder, ThemeInput};
pub use theme_identifier::{label_documents, ThemeIdentifier};
pub use theme_parser::ThemeResponseParser;
