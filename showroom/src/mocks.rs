//! Test doubles for the agent's external collaborators.

use crate::agent::{AgentError, Classifier};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One scripted classifier outcome
#[derive(Clone, Debug)]
pub enum ScriptedReply {
    /// Reply with this text
    Text(String),
    /// Fail as if the service were unreachable
    Unavailable(String),
}

/// Classifier that replays scripted replies in order
///
/// Every call records the system prompt and utterance it received. Once the
/// script is exhausted, calls fail with [`AgentError::Unavailable`].
///
/// # Example
///
/// ```
/// use showroom::mocks::ScriptedClassifier;
///
/// let classifier = ScriptedClassifier::new()
///     .reply(r#"{"intent":{"type":"go_back","params":{},"responseText":"Back.","confidence":0.9}}"#);
/// assert_eq!(classifier.remaining(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Option<Duration>,
}

impl ScriptedClassifier {
    /// Classifier with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: queue a text reply
    #[must_use]
    pub fn reply(self, text: impl Into<String>) -> Self {
        lock(&self.script).push_back(ScriptedReply::Text(text.into()));
        self
    }

    /// Builder: queue a failure
    #[must_use]
    pub fn fail(self, reason: impl Into<String>) -> Self {
        lock(&self.script).push_back(ScriptedReply::Unavailable(reason.into()));
        self
    }

    /// Builder: wait this long before every reply
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replies left in the script
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    /// `(system_prompt, utterance)` of every call so far
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        lock(&self.calls).clone()
    }
}

impl Classifier for ScriptedClassifier {
    async fn classify(&self, system_prompt: &str, utterance: &str) -> Result<String, AgentError> {
        lock(&self.calls).push((system_prompt.to_string(), utterance.to_string()));
        let next = lock(&self.script).pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Unavailable(reason)) => Err(AgentError::Unavailable(reason)),
            None => Err(AgentError::Unavailable("script exhausted".to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
