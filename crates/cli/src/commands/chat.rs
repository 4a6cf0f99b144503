//! `chatrelay chat`: Run one message through the dispatcher.

use std::sync::Arc;

use chatrelay_config::AppConfig;
use chatrelay_core::{Artifact, ChatMode, ChatRequest};
use chatrelay_dispatch::{Dispatcher, KnowledgeStore};

pub struct ChatOptions {
    pub provider: String,
    pub mode: Option<ChatMode>,
    pub template: Option<String>,
    pub project: String,
    pub use_knowledge: bool,
    pub message: String,
}

impl ChatOptions {
    fn into_request(self) -> ChatRequest {
        let chat_mode = self.mode.unwrap_or(if self.template.is_some() {
            ChatMode::Predefined
        } else {
            ChatMode::Free
        });

        ChatRequest {
            message: self.message,
            chat_mode,
            api_provider: Some(self.provider),
            template: self.template,
            project_id: self.project,
            use_knowledge: self.use_knowledge,
        }
    }
}

pub async fn run(config: AppConfig, options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let knowledge = chatrelay_dispatch::source_from_config(
        &config.knowledge,
        Arc::new(KnowledgeStore::from_config(&config.knowledge)),
    )?;
    let dispatcher = Dispatcher::new(chatrelay_providers::build_from_config(&config), knowledge);
    let credentials = config.credentials();

    let result = match dispatcher.handle(options.into_request(), &credentials).await {
        Ok(result) => result,
        Err(e) if e.is_validation() => {
            eprintln!("Error: {e}");
            if let chatrelay_core::Error::Validation(chatrelay_core::ValidationError::MissingCredential(p)) = &e {
                let upper = p.as_str().to_ascii_uppercase();
                eprintln!("  Set CHATRELAY_{upper}_API_KEY or {upper}_API_KEY, or add it to");
                eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", result.content);
    let rendered = render_artifacts(&result.artifacts);
    if !rendered.is_empty() {
        println!();
        print!("{rendered}");
    }

    Ok(())
}

/// One block per artifact, for terminal output.
fn render_artifacts(artifacts: &[Artifact]) -> String {
    let mut out = String::new();
    for (i, artifact) in artifacts.iter().enumerate() {
        let n = i + 1;
        match artifact {
            Artifact::Code { language, content } => {
                out.push_str(&format!("[{n}] code ({language})\n{content}"));
                if !content.ends_with('\n') {
                    out.push('\n');
                }
            }
            Artifact::Image { url, title } => {
                out.push_str(&format!("[{n}] image: {title}\n{url}\n"));
            }
            Artifact::Markdown { content } => {
                out.push_str(&format!("[{n}] markdown\n{content}\n"));
            }
        }
    }
    out
}
