//! Classifier transport and the agent client.

use super::error::AgentError;
use super::parse::parse_classifier_reply;
use super::prompt::{ProjectContext, build_system_prompt};
use crate::catalog::Catalog;
use crate::conversation::AgentMessage;
use crate::intent::IntentEnvelope;
use crate::state::ShowroomState;
use showroom_anthropic::messages::DEFAULT_MODEL;
use showroom_anthropic::{AnthropicClient, Message, MessagesRequest};
use std::future::Future;
use std::sync::Arc;

/// External text classifier
///
/// Receives a system prompt and one utterance, returns the raw reply text.
pub trait Classifier: Send + Sync {
    /// Classify `utterance` under `system_prompt`
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if no reply could be obtained.
    fn classify(
        &self,
        system_prompt: &str,
        utterance: &str,
    ) -> impl Future<Output = Result<String, AgentError>> + Send;
}

/// [`Classifier`] backed by the Messages API
#[derive(Clone, Debug)]
pub struct AnthropicClassifier {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicClassifier {
    /// Classifier using the default model and a 300 token reply limit
    #[must_use]
    pub fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 300,
        }
    }

    /// Builder: set model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: set the reply token limit
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Classifier for AnthropicClassifier {
    async fn classify(&self, system_prompt: &str, utterance: &str) -> Result<String, AgentError> {
        let request = MessagesRequest::new(vec![Message::user(utterance)])
            .with_model(self.model.clone())
            .with_max_tokens(self.max_tokens)
            .with_system(system_prompt.to_string());

        let response = self.client.messages(request).await?;
        Ok(response.text().unwrap_or_default().to_string())
    }
}

/// Builds prompts, calls the classifier and parses its replies
#[derive(Debug)]
pub struct AgentClient<C> {
    classifier: C,
    project: ProjectContext,
    catalog: Arc<Catalog>,
}

impl<C: Classifier> AgentClient<C> {
    /// Agent for `project` over `catalog`
    #[must_use]
    pub const fn new(classifier: C, project: ProjectContext, catalog: Arc<Catalog>) -> Self {
        Self {
            classifier,
            project,
            catalog,
        }
    }

    /// Project details used in prompts
    #[must_use]
    pub const fn project(&self) -> &ProjectContext {
        &self.project
    }

    /// The underlying classifier
    #[must_use]
    pub const fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify `utterance` in the context of `state` and `recent` turns
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the classifier could not be reached. A reply
    /// that arrives but does not parse yields the fallback intent instead.
    #[tracing::instrument(skip_all, fields(utterance_len = utterance.len()))]
    pub async fn send_message(
        &self,
        utterance: &str,
        state: &ShowroomState,
        recent: &[AgentMessage],
    ) -> Result<IntentEnvelope, AgentError> {
        let system_prompt = build_system_prompt(state, &self.project, &self.catalog, recent);
        let reply = self.classifier.classify(&system_prompt, utterance).await?;

        let envelope = parse_classifier_reply(&reply);
        tracing::debug!(
            intent = %envelope.kind,
            confidence = envelope.confidence,
            "Classifier replied"
        );
        Ok(envelope)
    }
}
