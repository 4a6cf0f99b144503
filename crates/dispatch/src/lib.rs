//! Request dispatch for chatrelay.
//!
//! The `Dispatcher` validates a chat request, resolves its credential, pulls
//! knowledge context and routes the composed prompt to one provider adapter.

pub mod dispatcher;
pub mod knowledge;

pub use dispatcher::Dispatcher;
pub use knowledge::{
    DocumentKnowledge, KnowledgeDocument, KnowledgeStore, NoKnowledge, PlaceholderKnowledge,
    source_from_config,
};
