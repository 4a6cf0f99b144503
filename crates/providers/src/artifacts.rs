//! Code artifact extraction from free-form reply text.
//!
//! A fenced block opens with three backticks, an optional `[A-Za-z0-9]+`
//! language tag and a newline, and runs up to the next three backticks.
//! Blocks without a tag are recorded as `text`.

use std::sync::LazyLock;

use chatrelay_core::{Artifact, CodeBlock};
use regex_lite::Regex;

const DEFAULT_LANGUAGE: &str = "text";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([a-zA-Z0-9]+)?\n(.+?)```").expect("code fence pattern is valid")
});

/// Scan `text` for fenced code blocks, left to right, non-overlapping.
pub fn extract(text: &str) -> Vec<CodeBlock> {
    CODE_FENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let content = caps.get(2)?.as_str().to_string();
            let language = caps
                .get(1)
                .map_or(DEFAULT_LANGUAGE, |m| m.as_str())
                .to_string();
            Some(CodeBlock { language, content })
        })
        .collect()
}

/// Same as [`extract`], converted into `Artifact::Code` values.
pub fn extract_artifacts(text: &str) -> Vec<Artifact> {
    extract(text).into_iter().map(Artifact::from).collect()
}
