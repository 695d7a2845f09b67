/// Discrete signals delivered to the UI layer over the core event channel.
///
/// Only terminal, user-relevant outcomes are emitted. A transient poll
/// failure retried on the next tick produces no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// An operator-initiated pairing attempt completed.
    PairingSucceeded { account_id: String },
    /// An operator-initiated pairing attempt ended without a connection.
    PairingFailed { account_id: String, reason: String },
    /// A specific outbound message was rejected and rolled back. The
    /// operator's typed text is kept by the UI so it can be resubmitted.
    SendFailed {
        conversation_id: String,
        temp_id: String,
        reason: String,
    },
}
