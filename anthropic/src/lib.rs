//! # Messages API Client
//!
//! A small client for the Anthropic Messages API. The showroom agent uses it
//! as a text classifier: one system prompt, one user utterance, one text reply.
//!
//! ## Example
//!
//! ```no_run
//! use showroom_anthropic::{AnthropicClient, Message, MessagesRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads ANTHROPIC_API_KEY
//!     let client = AnthropicClient::from_env()?;
//!
//!     let request = MessagesRequest::new(vec![Message::user("Show me apartment A2")])
//!         .with_system("Reply with a single JSON object.".to_string());
//!
//!     let response = client.messages(request).await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod messages;
pub mod types;

// Re-export main types for convenience
pub use client::AnthropicClient;
pub use error::ClaudeError;
pub use messages::{MessagesRequest, MessagesResponse};
pub use types::{ContentBlock, Message, Role, StopReason, Usage};
