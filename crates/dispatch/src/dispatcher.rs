//! The request dispatcher.
//!
//! Pipeline for one chat request:
//! 1. Validate the provider and message
//! 2. Resolve the credential for that provider (before any prompt is built)
//! 3. Best-effort knowledge lookup, degrading to no context on failure
//! 4. Compose the prompt and hand it to the provider's adapter

use std::sync::Arc;

use chatrelay_core::{
    AdapterRequest, ApiProvider, ChatRequest, ChatResult, Error, KnowledgeSource,
    ProviderCredentials, ValidationError,
};
use chatrelay_providers::{AdapterSet, prompt};
use tracing::{debug, info, warn};

pub struct Dispatcher {
    adapters: AdapterSet,
    knowledge: Arc<dyn KnowledgeSource>,
}

impl Dispatcher {
    pub fn new(adapters: AdapterSet, knowledge: Arc<dyn KnowledgeSource>) -> Self {
        Self { adapters, knowledge }
    }

    /// Process one chat request with the caller's credentials.
    pub async fn handle(
        &self,
        request: ChatRequest,
        credentials: &ProviderCredentials,
    ) -> Result<ChatResult, Error> {
        let provider: ApiProvider = request.api_provider.as_deref().unwrap_or("").parse()?;

        if request.message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let api_key = credentials
            .resolve(provider)
            .ok_or(ValidationError::MissingCredential(provider))?;

        let template = request.effective_template();
        info!(
            provider = %provider,
            mode = ?request.chat_mode,
            template = template.as_ref().map(|t| t.id()).unwrap_or("-"),
            project = %request.project_id,
            "Dispatching chat request"
        );

        let knowledge_context = if request.use_knowledge {
            self.fetch_knowledge(&request.project_id, &request.message).await
        } else {
            None
        };

        let composed = prompt::compose(
            provider,
            &request.message,
            request.chat_mode,
            template.as_ref(),
            knowledge_context.as_deref(),
        );

        let adapter_request = AdapterRequest {
            message: request.message,
            composed,
            chat_mode: request.chat_mode,
            template,
        };

        let result = self
            .adapters
            .get(provider)
            .send(api_key, &adapter_request)
            .await
            .inspect_err(|e| warn!(provider = %provider, error = %e, "Upstream call failed"))?;

        debug!(
            provider = %provider,
            artifacts = result.artifacts.len(),
            "Chat request completed"
        );
        Ok(result)
    }

    async fn fetch_knowledge(&self, project_id: &str, query: &str) -> Option<String> {
        match self.knowledge.fetch_context(project_id, query).await {
            Ok(context) => context.filter(|c| !c.trim().is_empty()),
            Err(e) => {
                warn!(
                    source = self.knowledge.name(),
                    project = %project_id,
                    error = %e,
                    "Knowledge lookup failed, continuing without context"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatrelay_core::{ApiKey, Artifact, ChatMode, KnowledgeError, ProviderAdapter, UpstreamError};
    use std::sync::Mutex;

    use crate::knowledge::{NoKnowledge, PlaceholderKnowledge};

    /// A mock adapter that records what it was sent.
    struct RecordingAdapter {
        provider: ApiProvider,
        reply: Result<ChatResult, UpstreamError>,
        seen: Mutex<Vec<(String, AdapterRequest)>>,
    }

    impl RecordingAdapter {
        fn ok(provider: ApiProvider, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply: Ok(ChatResult::text(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(provider: ApiProvider, error: UpstreamError) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply: Err(error),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, AdapterRequest)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderAdapter for RecordingAdapter {
        fn provider(&self) -> ApiProvider {
            self.provider
        }

        async fn send(&self, api_key: &ApiKey, request: &AdapterRequest) -> Result<ChatResult, UpstreamError> {
            self.seen
                .lock()
                .unwrap()
                .push((api_key.expose().to_string(), request.clone()));
            self.reply.clone()
        }
    }

    struct FailingKnowledge;

    #[async_trait]
    impl KnowledgeSource for FailingKnowledge {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_context(&self, project_id: &str, _query: &str) -> Result<Option<String>, KnowledgeError> {
            Err(KnowledgeError::QueryFailed {
                project_id: project_id.to_string(),
                reason: "index offline".into(),
            })
        }
    }

    struct Fixture {
        openai: Arc<RecordingAdapter>,
        anthropic: Arc<RecordingAdapter>,
        deepseek: Arc<RecordingAdapter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                openai: RecordingAdapter::ok(ApiProvider::OpenAi, "from openai"),
                anthropic: RecordingAdapter::ok(ApiProvider::Anthropic, "from anthropic"),
                deepseek: RecordingAdapter::ok(ApiProvider::DeepSeek, "from deepseek"),
            }
        }

        fn dispatcher(&self, knowledge: Arc<dyn KnowledgeSource>) -> Dispatcher {
            Dispatcher::new(
                AdapterSet::new(self.openai.clone(), self.anthropic.clone(), self.deepseek.clone()),
                knowledge,
            )
        }

        fn total_calls(&self) -> usize {
            self.openai.calls().len() + self.anthropic.calls().len() + self.deepseek.calls().len()
        }
    }

    fn all_keys() -> ProviderCredentials {
        ProviderCredentials::new()
            .with(ApiProvider::OpenAi, "sk-openai")
            .with(ApiProvider::Anthropic, "sk-ant")
            .with(ApiProvider::DeepSeek, "sk-ds")
    }

    #[tokio::test]
    async fn routes_to_selected_provider_with_its_key() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        let result = dispatcher
            .handle(ChatRequest::new("hi", "anthropic", "p1"), &all_keys())
            .await
            .unwrap();

        assert_eq!(result.content, "from anthropic");
        let calls = fx.anthropic.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sk-ant");
        assert_eq!(fx.total_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected_without_network() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(PlaceholderKnowledge::default()));

        for name in ["mistral", "gpt", "OpenAI-2"] {
            let err = dispatcher
                .handle(ChatRequest::new("hi", name, "p1"), &all_keys())
                .await
                .unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), "Invalid API provider");
        }
        assert_eq!(fx.total_calls(), 0);
    }

    #[tokio::test]
    async fn missing_provider_is_rejected() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        let mut request = ChatRequest::new("hi", "openai", "p1");
        request.api_provider = None;

        let err = dispatcher.handle(request, &all_keys()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingProvider)));
    }

    #[tokio::test]
    async fn missing_credential_is_rejected_before_any_call() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(PlaceholderKnowledge::default()));
        let credentials = ProviderCredentials::new().with(ApiProvider::OpenAi, "sk-openai");

        let err = dispatcher
            .handle(ChatRequest::new("hi", "deepseek", "p1"), &credentials)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing API key for deepseek");
        assert_eq!(fx.total_calls(), 0);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        let err = dispatcher
            .handle(ChatRequest::new("   ", "openai", "p1"), &all_keys())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyMessage)));
    }

    #[tokio::test]
    async fn knowledge_context_is_injected() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(PlaceholderKnowledge::new("Team uses Rust.")));

        dispatcher
            .handle(ChatRequest::new("what language?", "openai", "p1"), &all_keys())
            .await
            .unwrap();

        let sent = &fx.openai.calls()[0].1;
        assert_eq!(
            sent.composed.prompt,
            "Context information:\nTeam uses Rust.\n\nUser query: what language?"
        );
        assert_eq!(sent.message, "what language?");
    }

    #[tokio::test]
    async fn knowledge_can_be_disabled_per_request() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(PlaceholderKnowledge::new("ctx")));

        dispatcher
            .handle(ChatRequest::new("hi", "deepseek", "p1").without_knowledge(), &all_keys())
            .await
            .unwrap();

        assert_eq!(fx.deepseek.calls()[0].1.composed.prompt, "hi");
    }

    #[tokio::test]
    async fn knowledge_failure_degrades_to_no_context() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(FailingKnowledge));

        let result = dispatcher
            .handle(ChatRequest::new("hi", "openai", "p1"), &all_keys())
            .await
            .unwrap();

        assert_eq!(result.content, "from openai");
        let sent = &fx.openai.calls()[0].1;
        assert_eq!(sent.composed.prompt, "hi");
        assert!(!sent.composed.prompt.contains("Context information"));
    }

    #[tokio::test]
    async fn template_ignored_in_free_mode() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        let mut request = ChatRequest::new("a dragon", "deepseek", "p1");
        request.template = Some("storytelling".into());
        assert_eq!(request.chat_mode, ChatMode::Free);

        dispatcher.handle(request, &all_keys()).await.unwrap();

        let sent = &fx.deepseek.calls()[0].1;
        assert!(sent.template.is_none());
        assert_eq!(sent.composed.prompt, "a dragon");
    }

    #[tokio::test]
    async fn storytelling_template_rewrites_prompt() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        dispatcher
            .handle(
                ChatRequest::new("a dragon", "deepseek", "p1").with_template("storytelling"),
                &all_keys(),
            )
            .await
            .unwrap();

        let sent = &fx.deepseek.calls()[0].1;
        assert!(sent.composed.prompt.contains("a dragon"));
        assert!(sent.composed.prompt.starts_with("Create a compelling story"));
    }

    #[tokio::test]
    async fn upstream_error_propagates_unchanged() {
        let fx = Fixture {
            openai: RecordingAdapter::failing(
                ApiProvider::OpenAi,
                UpstreamError::status(ApiProvider::OpenAi, 503, Some("Service Unavailable")),
            ),
            ..Fixture::new()
        };
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        let err = dispatcher
            .handle(ChatRequest::new("hi", "openai", "p1"), &all_keys())
            .await
            .unwrap_err();

        assert!(!err.is_validation());
        match err {
            Error::Upstream(e) => assert_eq!(e.provider, ApiProvider::OpenAi),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn artifacts_pass_through() {
        let fx = Fixture {
            anthropic: Arc::new(RecordingAdapter {
                provider: ApiProvider::Anthropic,
                reply: Ok(ChatResult::with_artifacts(
                    "code",
                    vec![Artifact::Code {
                        language: "rust".into(),
                        content: "fn main() {}\n".into(),
                    }],
                )),
                seen: Mutex::new(Vec::new()),
            }),
            ..Fixture::new()
        };
        let dispatcher = fx.dispatcher(Arc::new(NoKnowledge));

        let result = dispatcher
            .handle(ChatRequest::new("hi", "anthropic", "p1"), &all_keys())
            .await
            .unwrap();
        assert_eq!(result.artifacts.len(), 1);
    }
}
