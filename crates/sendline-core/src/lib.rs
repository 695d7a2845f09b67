//! Client-side synchronization core for the agent dashboard.
//!
//! Owns the two stateful flows the UI cannot implement correctly on its own:
//! pairing a messaging account with the platform (rotating pairing code,
//! status polling) and keeping an open conversation consistent with the
//! remote message store (incremental merge, backward pagination, optimistic
//! sends). Screens subscribe to the state these components emit and feed
//! user intents back in; they never mutate the state directly.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod gateway;
pub mod models;
pub mod pairing;
pub mod store;
pub mod sync;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::CoreConfig;
pub use error::CoreError;
pub use events::CoreEvent;
pub use gateway::{HttpGateway, MessagingGateway};
pub use pairing::PairingController;
pub use sync::MessageSyncEngine;
