//! Session composition root.
//!
//! A [`ShowroomSession`] owns one showroom store, one conversation store, the
//! catalog and the agent client, and runs a visitor's turn end to end:
//!
//! ```text
//! utterance ─▶ conversation log
//!           ─▶ agent client (state + inventory + recent turns) ─▶ classifier
//!           ─▶ reply text ─▶ conversation log
//!           ─▶ typed intent ─▶ dispatcher ─▶ showroom store
//! ```

use crate::agent::{AgentClient, AgentError, Classifier, ProjectContext};
use crate::catalog::Catalog;
use crate::config::ShowroomConfig;
use crate::conversation::{
    ConversationAction, ConversationEnvironment, ConversationReducer, ConversationState,
    MessageRole,
};
use crate::dispatcher::IntentDispatcher;
use crate::intent::{Intent, IntentError};
use crate::reducer::{LockPolicy, ShowroomEnvironment, ShowroomReducer};
use crate::state::{ShowroomAction, ShowroomState};
use crate::{ConversationStore, ShowroomStore};
use showroom_core::environment::{Clock, SystemClock};
use showroom_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that end a turn
#[derive(Debug, Error)]
pub enum SessionError {
    /// The visitor sent nothing
    #[error("empty message")]
    EmptyMessage,
    /// The classifier could not be reached
    #[error(transparent)]
    Agent(#[from] AgentError),
    /// A store refused an action
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session tuning knobs
#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// Project details for prompts and the welcome message
    pub project: ProjectContext,
    /// Transition settle time
    pub settle_duration: Duration,
    /// Which actions the transition lock blocks
    pub lock_policy: LockPolicy,
    /// Upper bound on one classifier call
    pub classify_timeout: Duration,
    /// Conversation turns included in the prompt
    pub context_turns: usize,
}

impl SessionSettings {
    /// Settings for `project_name` with default timings
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        let navigation = ShowroomEnvironment::default();
        Self {
            project: ProjectContext::new(project_name),
            settle_duration: navigation.settle_duration,
            lock_policy: navigation.lock_policy,
            classify_timeout: Duration::from_secs(30),
            context_turns: 6,
        }
    }
}

impl From<&ShowroomConfig> for SessionSettings {
    fn from(config: &ShowroomConfig) -> Self {
        Self {
            project: ProjectContext::new(config.project.name.clone())
                .with_response_language(config.project.response_language.clone()),
            settle_duration: config.navigation.settle_duration(),
            lock_policy: config.navigation.lock_policy,
            classify_timeout: config.llm.timeout(),
            context_turns: config.llm.context_turns,
        }
    }
}

/// Result of one visitor turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Reply shown to the visitor (may be empty)
    pub reply: String,
    /// Classifier confidence
    pub confidence: f64,
    /// Typed intent, or why the classifier's intent was rejected
    pub intent: Result<Intent, IntentError>,
    /// Action that changed the showroom view, if any
    pub dispatched: Option<ShowroomAction>,
}

/// One visitor's showroom session
pub struct ShowroomSession<C> {
    showroom: ShowroomStore,
    conversation: ConversationStore,
    agent: AgentClient<C>,
    dispatcher: IntentDispatcher,
    classify_timeout: Duration,
    context_turns: usize,
}

impl<C: Classifier> ShowroomSession<C> {
    /// Session over `catalog` using the system clock
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, classifier: C, settings: SessionSettings) -> Self {
        Self::with_clock(catalog, classifier, settings, SystemClock)
    }

    /// Session with an explicit clock for message timestamps
    #[must_use]
    pub fn with_clock(
        catalog: Arc<Catalog>,
        classifier: C,
        settings: SessionSettings,
        clock: impl Clock + 'static,
    ) -> Self {
        let initial_building_id = catalog.first_building_id().map(str::to_string);
        let showroom = Store::new(
            ShowroomState::initial(initial_building_id.clone()),
            ShowroomReducer,
            ShowroomEnvironment {
                settle_duration: settings.settle_duration,
                lock_policy: settings.lock_policy,
                initial_building_id,
            },
        );
        let conversation = Store::new(
            ConversationState::default(),
            ConversationReducer,
            ConversationEnvironment::new(clock),
        );

        Self {
            showroom,
            conversation,
            agent: AgentClient::new(classifier, settings.project, Arc::clone(&catalog)),
            dispatcher: IntentDispatcher::new(catalog),
            classify_timeout: settings.classify_timeout,
            context_turns: settings.context_turns,
        }
    }

    /// The showroom store, for observers
    #[must_use]
    pub const fn showroom(&self) -> &ShowroomStore {
        &self.showroom
    }

    /// The conversation store, for observers
    #[must_use]
    pub const fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    /// The catalog this session shows
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.dispatcher.catalog()
    }

    /// The agent client
    #[must_use]
    pub const fn agent(&self) -> &AgentClient<C> {
        &self.agent
    }

    /// Seed the welcome message
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the conversation store is shut down.
    pub async fn start(&self) -> Result<(), SessionError> {
        self.conversation
            .send(ConversationAction::Welcome {
                project_name: self.agent.project().project_name.clone(),
            })
            .await?;
        Ok(())
    }

    /// Run one visitor turn
    ///
    /// # Errors
    ///
    /// - [`SessionError::EmptyMessage`] for blank input
    /// - [`SessionError::Agent`] if the classifier fails or times out
    /// - [`SessionError::Store`] if a store is shut down
    #[tracing::instrument(skip_all, fields(utterance_len = text.len()))]
    pub async fn handle_user_message(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let context_turns = self.context_turns;
        let recent = self.conversation.state(|c| c.recent(context_turns)).await;
        self.conversation
            .send(ConversationAction::Append {
                role: MessageRole::User,
                content: text.to_string(),
            })
            .await?;

        let state = self.showroom.state(ShowroomState::clone).await;
        let envelope = match tokio::time::timeout(
            self.classify_timeout,
            self.agent.send_message(text, &state, &recent),
        )
        .await
        {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(e)) => {
                error!(error = %e, "Classifier call failed");
                return Err(e.into());
            },
            Err(_) => {
                error!(timeout = ?self.classify_timeout, "Classifier call timed out");
                return Err(AgentError::Timeout(self.classify_timeout).into());
            },
        };

        if !envelope.response_text.is_empty() {
            self.conversation
                .send(ConversationAction::Append {
                    role: MessageRole::Assistant,
                    content: envelope.response_text.clone(),
                })
                .await?;
        }

        let intent = envelope.to_intent();
        let dispatched = match &intent {
            Ok(intent) if intent.is_informational() => {
                debug!(intent = intent.kind(), "Informational intent, view unchanged");
                None
            },
            Ok(intent) => self.dispatcher.execute(&self.showroom, intent).await?,
            Err(e) => {
                warn!(error = %e, "Rejected classifier intent");
                metrics::counter!("showroom.intents.rejected").increment(1);
                None
            },
        };

        info!(
            intent = %envelope.kind,
            confidence = envelope.confidence,
            dispatched = dispatched.is_some(),
            "Turn complete"
        );

        Ok(TurnOutcome {
            reply: envelope.response_text,
            confidence: envelope.confidence,
            intent,
            dispatched,
        })
    }

    /// Restore the initial view and restart the conversation
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if a store is shut down.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.showroom.send(ShowroomAction::Reset).await?;
        self.conversation.send(ConversationAction::Clear).await?;
        self.start().await
    }

    /// Stop both stores, waiting up to `timeout` for pending transitions
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if effects are still running at the deadline.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), SessionError> {
        self.showroom.shutdown(timeout).await?;
        self.conversation.shutdown(timeout).await?;
        Ok(())
    }
}
