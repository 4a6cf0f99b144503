//! Knowledge source trait: the retrieval collaborator.
//!
//! Given a project and the user's query, a source returns background text to
//! inject ahead of the query, or nothing. The text is untrusted and opaque.

use async_trait::async_trait;

use crate::error::KnowledgeError;

#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// A human-readable name for this source (used in logs).
    fn name(&self) -> &str;

    /// Fetch context for `(project_id, query)`.
    ///
    /// `Ok(None)` means the project has nothing relevant.
    async fn fetch_context(
        &self,
        project_id: &str,
        query: &str,
    ) -> std::result::Result<Option<String>, KnowledgeError>;
}
