//! Agent client: turns a visitor's utterance into an intent.
//!
//! 1. [`build_system_prompt`] describes the showroom state, the available
//!    apartments and the JSON reply contract.
//! 2. A [`Classifier`] sends the prompt and the utterance to the external
//!    text-classification service.
//! 3. [`parse_classifier_reply`] extracts an [`IntentEnvelope`] from the
//!    reply, falling back to a low-confidence `general_info` intent.
//!
//! [`IntentEnvelope`]: crate::intent::IntentEnvelope

mod client;
mod error;
mod parse;
mod prompt;

pub use client::{AgentClient, AnthropicClassifier, Classifier};
pub use error::AgentError;
pub use parse::{FALLBACK_CONFIDENCE, parse_classifier_reply};
pub use prompt::{ProjectContext, build_system_prompt, format_eur};
