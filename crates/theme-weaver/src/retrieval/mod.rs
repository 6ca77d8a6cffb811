//! Session-scoped document retrieval and question answering

pub mod query;

pub use query::QueryProcessor;
