mod engine;
mod outbound;
mod state;

pub use engine::MessageSyncEngine;
pub use outbound::{OutboundEntry, OutboundMessageTracker};
pub use state::ConversationSyncState;
