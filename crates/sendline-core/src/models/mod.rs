mod contact;
mod message;
mod pairing_session;

pub use contact::ContactProfile;
pub use message::{DeliveryState, Message, MessageRole};
pub use pairing_session::{PairingSession, PairingState};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
