//! Chat request and result domain types.
//!
//! A `ChatRequest` comes in from the boundary, a `ChatResult` goes back out.
//! Both are plain values: built once per call and never shared between requests.

use serde::{Deserialize, Serialize};

/// How the user is chatting: free-form, or through a predefined template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Free,
    Predefined,
}

/// A named predefined chat behavior.
///
/// Unknown template ids are kept as `Custom` so they round-trip, but no
/// prompt rule is attached to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Coding,
    Storytelling,
    Image,
    Custom(String),
}

impl Template {
    pub fn parse(id: &str) -> Self {
        match id.trim() {
            "coding" => Template::Coding,
            "storytelling" => Template::Storytelling,
            "image" => Template::Image,
            other => Template::Custom(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Template::Coding => "coding",
            Template::Storytelling => "storytelling",
            Template::Image => "image",
            Template::Custom(id) => id,
        }
    }

    /// The template that is actually in effect for a request.
    ///
    /// Templates only apply in predefined mode.
    pub fn effective(mode: ChatMode, template: Option<&str>) -> Option<Self> {
        match mode {
            ChatMode::Predefined => template.map(Self::parse),
            ChatMode::Free => None,
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// An inbound chat request, as received at the boundary.
///
/// `api_provider` is kept as the raw string so that an unknown or missing
/// provider is reported by the dispatcher as a validation failure rather
/// than by the JSON layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    /// Free-form or predefined template chat
    #[serde(default)]
    pub chat_mode: ChatMode,

    /// Which upstream provider to use ("openai", "anthropic", "deepseek")
    #[serde(default)]
    pub api_provider: Option<String>,

    /// Template id; only meaningful in predefined mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Project the request belongs to (scopes knowledge lookups)
    #[serde(default)]
    pub project_id: String,

    /// Whether to inject retrieved knowledge context
    #[serde(default = "default_true")]
    pub use_knowledge: bool,
}

fn default_true() -> bool {
    true
}

impl ChatRequest {
    /// A free-mode request with knowledge enabled.
    pub fn new(
        message: impl Into<String>,
        api_provider: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            chat_mode: ChatMode::Free,
            api_provider: Some(api_provider.into()),
            template: None,
            project_id: project_id.into(),
            use_knowledge: true,
        }
    }

    /// Switch to predefined mode with the given template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.chat_mode = ChatMode::Predefined;
        self.template = Some(template.into());
        self
    }

    pub fn without_knowledge(mut self) -> Self {
        self.use_knowledge = false;
        self
    }

    pub fn effective_template(&self) -> Option<Template> {
        Template::effective(self.chat_mode, self.template.as_deref())
    }
}

/// A structured, typed piece of response content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Artifact {
    Code { language: String, content: String },
    Image { url: String, title: String },
    Markdown { content: String },
}

impl From<CodeBlock> for Artifact {
    fn from(block: CodeBlock) -> Self {
        Artifact::Code {
            language: block.language,
            content: block.content,
        }
    }
}

/// A fenced code block found in free-form reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub content: String,
}

/// The uniform result of a chat call, whatever provider produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl ChatResult {
    /// A plain text result with no artifacts.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(content: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self {
            content: content.into(),
            artifacts,
        }
    }
}
