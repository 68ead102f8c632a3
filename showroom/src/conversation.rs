//! Conversation log: an append-only, role-tagged message history.
//!
//! The log feeds two consumers: the chat transcript and the classifier
//! prompt, which includes the most recent turns.

use serde::{Deserialize, Serialize};
use showroom_core::{
    DateTime, SmallVec, Utc, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};
use std::fmt;
use std::sync::Arc;

/// Per-session message id, rendered as `msg-N`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who wrote a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The buyer
    User,
    /// The showroom agent
    Assistant,
    /// Out-of-band notices
    System,
}

/// One message of the transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Strictly increasing within a session
    pub id: MessageId,
    /// Author
    pub role: MessageRole,
    /// Text
    pub content: String,
    /// When it was appended
    pub timestamp: DateTime<Utc>,
}

/// Ordered message history
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<AgentMessage>,
    last_id: u64,
}

impl ConversationState {
    /// All messages, oldest first
    #[must_use]
    pub fn messages(&self) -> &[AgentMessage] {
        &self.messages
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message of any role
    #[must_use]
    pub fn latest(&self) -> Option<&AgentMessage> {
        self.messages.last()
    }

    /// Most recent assistant message
    #[must_use]
    pub fn latest_assistant(&self) -> Option<&AgentMessage> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::Assistant)
    }

    /// The last `n` user and assistant messages, oldest first
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<AgentMessage> {
        let mut recent: Vec<_> = self
            .messages
            .iter()
            .rev()
            .filter(|message| message.role != MessageRole::System)
            .take(n)
            .cloned()
            .collect();
        recent.reverse();
        recent
    }
}

/// Conversation actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationAction {
    /// Append a message
    Append {
        /// Author
        role: MessageRole,
        /// Text
        content: String,
    },
    /// Append the welcome message for a project
    Welcome {
        /// Project shown in the greeting
        project_name: String,
    },
    /// Drop every message and restart ids
    Clear,
}

/// Greeting seeded at session start
#[must_use]
pub fn welcome_message(project_name: &str) -> String {
    format!(
        "Dobro dosli u {project_name}! Gledate juznu fasadu zgrade. Recite mi sta vas zanima, \
         ili samo kazite \"pokazi mi nesto lepo\" i ja cu vas provesti."
    )
}

/// Conversation dependencies
#[derive(Clone)]
pub struct ConversationEnvironment {
    /// Timestamps for appended messages
    pub clock: Arc<dyn Clock>,
}

impl ConversationEnvironment {
    /// Environment backed by `clock`
    #[must_use]
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }
}

impl fmt::Debug for ConversationEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for [`ConversationState`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ConversationReducer;

impl Reducer for ConversationReducer {
    type State = ConversationState;
    type Action = ConversationAction;
    type Environment = ConversationEnvironment;

    fn reduce(
        &self,
        state: &mut ConversationState,
        action: ConversationAction,
        env: &ConversationEnvironment,
    ) -> SmallVec<[Effect<ConversationAction>; 4]> {
        match action {
            ConversationAction::Append { role, content } => append(state, role, content, env),
            ConversationAction::Welcome { project_name } => append(
                state,
                MessageRole::Assistant,
                welcome_message(&project_name),
                env,
            ),
            ConversationAction::Clear => *state = ConversationState::default(),
        }

        smallvec![Effect::None]
    }
}

fn append(
    state: &mut ConversationState,
    role: MessageRole,
    content: String,
    env: &ConversationEnvironment,
) {
    state.last_id += 1;
    state.messages.push(AgentMessage {
        id: MessageId(state.last_id),
        role,
        content,
        timestamp: env.clock.now(),
    });
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use showroom_testing::{ReducerTest, SteppingClock, assertions, test_clock};

    fn user(content: &str) -> ConversationAction {
        ConversationAction::Append {
            role: MessageRole::User,
            content: content.to_string(),
        }
    }

    fn assistant(content: &str) -> ConversationAction {
        ConversationAction::Append {
            role: MessageRole::Assistant,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_ids_increase_and_restart_after_clear() {
        ReducerTest::new(ConversationReducer)
            .with_env(ConversationEnvironment::new(test_clock()))
            .given_state(ConversationState::default())
            .when_action(user("hi"))
            .when_action(assistant("hello"))
            .when_action(ConversationAction::Clear)
            .when_action(user("again"))
            .then_state(|state| {
                assert_eq!(state.len(), 1);
                assert_eq!(state.messages()[0].id, MessageId(1));
                assert_eq!(state.messages()[0].id.to_string(), "msg-1");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_ids_strictly_increase() {
        let env = ConversationEnvironment::new(test_clock());
        let mut state = ConversationState::default();
        for i in 0..5 {
            let _ = ConversationReducer.reduce(&mut state, user(&format!("m{i}")), &env);
        }
        let ids: Vec<_> = state.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_latest_assistant_scans_backwards() {
        let env = ConversationEnvironment::new(test_clock());
        let mut state = ConversationState::default();
        assert!(state.latest_assistant().is_none());

        let _ = ConversationReducer.reduce(&mut state, assistant("first"), &env);
        let _ = ConversationReducer.reduce(&mut state, assistant("second"), &env);
        let _ = ConversationReducer.reduce(&mut state, user("question"), &env);

        assert_eq!(state.latest().unwrap().content, "question");
        assert_eq!(state.latest_assistant().unwrap().content, "second");
    }

    #[test]
    fn test_welcome_names_project() {
        let env = ConversationEnvironment::new(test_clock());
        let mut state = ConversationState::default();
        let _ = ConversationReducer.reduce(
            &mut state,
            ConversationAction::Welcome {
                project_name: "Gamma Residence".to_string(),
            },
            &env,
        );

        let message = state.latest_assistant().unwrap();
        assert!(message.content.starts_with("Dobro dosli u Gamma Residence!"));
        assert_eq!(message.role, MessageRole::Assistant);
    }

    #[test]
    fn test_timestamps_come_from_clock() {
        let clock = Arc::new(SteppingClock::new(
            showroom_testing::mocks::epoch(),
            chrono::Duration::seconds(1),
        ));
        let env = ConversationEnvironment {
            clock: clock.clone(),
        };
        let mut state = ConversationState::default();

        let _ = ConversationReducer.reduce(&mut state, user("a"), &env);
        let _ = ConversationReducer.reduce(&mut state, user("b"), &env);

        let [a, b] = state.messages() else {
            unreachable!("two messages were appended");
        };
        assert_eq!(b.timestamp - a.timestamp, chrono::Duration::seconds(1));
    }

    #[test]
    fn test_recent_skips_system_and_keeps_order() {
        let env = ConversationEnvironment::new(test_clock());
        let mut state = ConversationState::default();
        let _ = ConversationReducer.reduce(&mut state, user("one"), &env);
        let _ = ConversationReducer.reduce(
            &mut state,
            ConversationAction::Append {
                role: MessageRole::System,
                content: "notice".to_string(),
            },
            &env,
        );
        let _ = ConversationReducer.reduce(&mut state, assistant("two"), &env);
        let _ = ConversationReducer.reduce(&mut state, user("three"), &env);

        let recent: Vec<_> = state.recent(2).into_iter().map(|m| m.content).collect();
        assert_eq!(recent, ["two", "three"]);
    }
}
