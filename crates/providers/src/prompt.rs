//! Prompt composition: the single place where templates and retrieved
//! knowledge shape what is sent upstream.
//!
//! Order of operations:
//! 1. Per-provider template rules pick the system prompt and may rewrite the message.
//! 2. Knowledge context (if any) is prepended as a labeled block, identically for
//!    every provider.

use chatrelay_core::{ApiProvider, ChatMode, ComposedPrompt, Template};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const ANTHROPIC_SYSTEM_PROMPT: &str = "You are Claude, a helpful AI assistant.";
pub const CODING_SYSTEM_PROMPT: &str = "You are a coding assistant. Always provide detailed and well-commented code. Use code blocks for code samples.";

/// Compose the outgoing prompt pair for one request.
pub fn compose(
    provider: ApiProvider,
    message: &str,
    chat_mode: ChatMode,
    template: Option<&Template>,
    knowledge_context: Option<&str>,
) -> ComposedPrompt {
    let template = match chat_mode {
        ChatMode::Predefined => template,
        ChatMode::Free => None,
    };

    let system_prompt = match (provider, template) {
        (ApiProvider::Anthropic, Some(Template::Coding)) => CODING_SYSTEM_PROMPT,
        (ApiProvider::Anthropic, _) => ANTHROPIC_SYSTEM_PROMPT,
        (ApiProvider::OpenAi | ApiProvider::DeepSeek, _) => DEFAULT_SYSTEM_PROMPT,
    };

    let prompt = match (provider, template) {
        (ApiProvider::DeepSeek, Some(Template::Storytelling)) => story_instruction(message),
        _ => message.to_string(),
    };

    ComposedPrompt {
        system_prompt: system_prompt.to_string(),
        prompt: inject_context(&prompt, knowledge_context),
    }
}

/// Prepend knowledge context to a prompt. Blank context is ignored.
pub fn inject_context(prompt: &str, knowledge_context: Option<&str>) -> String {
    match knowledge_context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("Context information:\n{context}\n\nUser query: {prompt}"),
        None => prompt.to_string(),
    }
}

fn story_instruction(message: &str) -> String {
    format!("Create a compelling story based on the following idea: {message}. Be creative and engaging.")
}
