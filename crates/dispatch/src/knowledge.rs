//! Knowledge sources and the in-memory text document store.
//!
//! - `PlaceholderKnowledge` returns fixed text for every project (the default)
//! - `DocumentKnowledge` concatenates the text documents saved for a project
//! - `NoKnowledge` never returns context

use async_trait::async_trait;
use chatrelay_config::KnowledgeConfig;
use chatrelay_core::{Error, KnowledgeError, KnowledgeSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const TEXT_DOCUMENT_TYPE: &str = "text/plain";

/// Returns the same configured text for every lookup.
pub struct PlaceholderKnowledge {
    text: String,
}

impl PlaceholderKnowledge {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for PlaceholderKnowledge {
    fn default() -> Self {
        Self::new(KnowledgeConfig::default().placeholder_text)
    }
}

#[async_trait]
impl KnowledgeSource for PlaceholderKnowledge {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn fetch_context(
        &self,
        _project_id: &str,
        _query: &str,
    ) -> Result<Option<String>, KnowledgeError> {
        Ok(Some(self.text.clone()))
    }
}

/// Never returns context.
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeSource for NoKnowledge {
    fn name(&self) -> &str {
        "none"
    }

    async fn fetch_context(
        &self,
        _project_id: &str,
        _query: &str,
    ) -> Result<Option<String>, KnowledgeError> {
        Ok(None)
    }
}

/// A saved text document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDocument {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Content length in bytes
    pub size: usize,
    pub content: String,
    pub is_text: bool,
    pub created_at: DateTime<Utc>,
    /// Set only when an existing item was updated
    pub updated_at: Option<DateTime<Utc>>,
}

/// In-memory text documents, grouped by project. Not persisted.
///
/// Each project holds at most `max_per_project` documents.
pub struct KnowledgeStore {
    projects: RwLock<HashMap<String, Vec<KnowledgeDocument>>>,
    max_per_project: usize,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::with_max_documents(KnowledgeConfig::default().max_documents_per_project)
    }

    pub fn with_max_documents(max_per_project: usize) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            max_per_project,
        }
    }

    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self::with_max_documents(config.max_documents_per_project)
    }

    /// Create or update a text document.
    ///
    /// With `item_id` the document with that id is replaced (keeping its
    /// creation time if it exists) and `updated_at` is set. Without it a new
    /// document gets a fresh UUID. Adding a document to a full project fails;
    /// replacing one does not.
    pub async fn save_text(
        &self,
        project_id: &str,
        title: &str,
        content: &str,
        item_id: Option<&str>,
    ) -> Result<KnowledgeDocument, KnowledgeError> {
        let now = Utc::now();
        let mut projects = self.projects.write().await;
        let documents = projects.entry(project_id.to_string()).or_default();

        let item_id = item_id.map(str::trim).filter(|id| !id.is_empty());
        let existing = item_id.and_then(|id| documents.iter().position(|d| d.id == id));

        if existing.is_none() && documents.len() >= self.max_per_project {
            return Err(KnowledgeError::ProjectFull {
                project_id: project_id.to_string(),
                limit: self.max_per_project,
            });
        }

        let document = KnowledgeDocument {
            id: item_id
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: title.to_string(),
            content_type: TEXT_DOCUMENT_TYPE.into(),
            size: content.len(),
            content: content.to_string(),
            is_text: true,
            created_at: existing.map(|i| documents[i].created_at).unwrap_or(now),
            updated_at: item_id.map(|_| now),
        };

        match existing {
            Some(i) => documents[i] = document.clone(),
            None => documents.push(document.clone()),
        }

        Ok(document)
    }

    /// All documents for a project, in insertion order.
    pub async fn list(&self, project_id: &str) -> Vec<KnowledgeDocument> {
        self.projects
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn count(&self, project_id: &str) -> usize {
        self.projects
            .read()
            .await
            .get(project_id)
            .map_or(0, Vec::len)
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves the documents saved in a `KnowledgeStore`.
pub struct DocumentKnowledge {
    store: Arc<KnowledgeStore>,
}

impl DocumentKnowledge {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KnowledgeSource for DocumentKnowledge {
    fn name(&self) -> &str {
        "documents"
    }

    async fn fetch_context(
        &self,
        project_id: &str,
        _query: &str,
    ) -> Result<Option<String>, KnowledgeError> {
        let documents = self.store.list(project_id).await;
        if documents.is_empty() {
            return Ok(None);
        }

        let context = documents
            .iter()
            .map(|d| format!("{}:\n{}", d.name, d.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(Some(context))
    }
}

/// Build the configured knowledge source.
pub fn source_from_config(
    config: &KnowledgeConfig,
    store: Arc<KnowledgeStore>,
) -> Result<Arc<dyn KnowledgeSource>, Error> {
    match config.source.as_str() {
        "placeholder" => Ok(Arc::new(PlaceholderKnowledge::new(
            config.placeholder_text.clone(),
        ))),
        "documents" => Ok(Arc::new(DocumentKnowledge::new(store))),
        "none" => Ok(Arc::new(NoKnowledge)),
        other => Err(Error::Config {
            message: format!("Unknown knowledge source: {other}"),
        }),
    }
}
