/// Errors surfaced to the UI layer.
///
/// Transient poll/fetch failures never appear here; they are absorbed and
/// retried inside the sync components. Every variant corresponds to a
/// user-relevant outcome the dashboard must react to.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("pairing request failed: {reason}")]
    Pairing { reason: String },

    #[error("message send failed: {reason}")]
    SendFailed { reason: String },

    #[error("failed to load older messages: {reason}")]
    Pagination { reason: String },

    #[error("message delete failed: {reason}")]
    DeleteFailed { reason: String },

    #[error("contact lookup failed: {reason}")]
    ContactLookup { reason: String },
}
