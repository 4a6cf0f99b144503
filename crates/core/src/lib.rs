//! # chatrelay core
//!
//! Domain types, traits, and error definitions for the chatrelay
//! multi-provider chat relay. This crate has **no HTTP dependencies**; it
//! defines the model every other crate implements against.
//!
//! The two seams are traits:
//! - [`ProviderAdapter`]: one upstream wire protocol
//! - [`KnowledgeSource`]: the retrieval collaborator

pub mod chat;
pub mod credentials;
pub mod error;
pub mod knowledge;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use chat::{Artifact, ChatMode, ChatRequest, ChatResult, CodeBlock, Template};
pub use credentials::{ApiKey, ProviderCredentials};
pub use error::{Error, KnowledgeError, UpstreamError, UpstreamErrorKind, ValidationError};
pub use knowledge::KnowledgeSource;
pub use provider::{AdapterRequest, ApiProvider, ComposedPrompt, ProviderAdapter};
