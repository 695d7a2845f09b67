use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingState {
    /// No pairing attempt in progress.
    Idle,
    /// A pairing code is displayed and waiting to be scanned.
    AwaitingScan,
    /// The device acknowledged the code; the session is being established.
    DeviceConnecting,
    Connected,
    /// Pass-through state while the collaborator tears down a cancelled
    /// attempt; resolves to `Idle`.
    Cancelled,
    /// Pass-through state for a terminally failed attempt; resolves to `Idle`.
    Failed,
}

/// Snapshot of one account's pairing flow, owned by `PairingController`.
///
/// Plain serializable data; all transitions live in the controller so the
/// machine can be exercised without any UI or network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingSession {
    pub account_id: String,
    pub state: PairingState,
    /// Present only while awaiting a scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    /// Unix milliseconds when the current code was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_issued_at: Option<u64>,
    /// Whether the operator triggered this attempt. Controls whether
    /// success/failure is surfaced; a mere status refresh of an
    /// already-connected account stays silent.
    pub user_initiated: bool,
}

impl PairingSession {
    pub fn idle(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            state: PairingState::Idle,
            pairing_code: None,
            code_issued_at: None,
            user_initiated: false,
        }
    }
}
