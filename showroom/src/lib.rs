//! # Virtual Showroom
//!
//! The core of an interactive real-estate showroom: a visitor rotates the
//! building, highlights an apartment, opens its floor plan and steps into room
//! panoramas, either directly or by talking to an agent whose replies are
//! classified into navigation intents.
//!
//! ## Modules
//!
//! - [`facade`] and [`catalog`]: apartment data and the orientation → facade mapping
//! - [`state`] and [`reducer`]: the showroom view state machine
//! - [`conversation`]: the append-only message log
//! - [`intent`] and [`dispatcher`]: classifier intents and how they move the view
//! - [`agent`]: prompt construction, classifier transport, lenient reply parsing
//! - [`session`]: wires everything for one visitor
//! - [`config`]: environment-driven configuration
//!
//! Both stores are plain [`showroom_runtime::Store`]s: read them with
//! `state(|s| ..)`, or observe them with `subscribe()`.
//!
//! ## Example
//!
//! ```no_run
//! use showroom::agent::AnthropicClassifier;
//! use showroom::catalog::Catalog;
//! use showroom::session::{SessionSettings, ShowroomSession};
//! use showroom_anthropic::AnthropicClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(Catalog::from_json_file("catalog.json")?);
//! let classifier = AnthropicClassifier::new(AnthropicClient::from_env()?);
//! let session = ShowroomSession::new(catalog, classifier, SessionSettings::new("Gamma Residence"));
//!
//! session.start().await?;
//! let outcome = session.handle_user_message("Show me apartment A2").await?;
//! println!("{}", outcome.reply);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod facade;
pub mod intent;
pub mod mocks;
pub mod reducer;
pub mod session;
pub mod state;

use showroom_runtime::Store;

pub use catalog::{Apartment, ApartmentStatus, ApartmentType, Building, Catalog, CatalogError, Floor};
pub use conversation::{
    AgentMessage, ConversationAction, ConversationEnvironment, ConversationReducer,
    ConversationState, MessageId, MessageRole,
};
pub use dispatcher::IntentDispatcher;
pub use facade::FacadeId;
pub use intent::{Intent, IntentEnvelope, IntentError};
pub use reducer::{LockPolicy, ShowroomEnvironment, ShowroomReducer};
pub use session::{SessionError, SessionSettings, ShowroomSession, TurnOutcome};
pub use state::{RoomType, ShowroomAction, ShowroomState, ShowroomView, TransitionType};

/// Store holding the showroom view state
pub type ShowroomStore = Store<ShowroomState, ShowroomAction, ShowroomEnvironment, ShowroomReducer>;

/// Store holding the conversation log
pub type ConversationStore =
    Store<ConversationState, ConversationAction, ConversationEnvironment, ConversationReducer>;
