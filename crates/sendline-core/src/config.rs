use std::time::Duration;

use crate::constants;

/// Tunables for the pairing and sync components.
///
/// The defaults match the production dashboard; tests shrink the intervals
/// to keep paused-clock scenarios readable.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Rotation period for the displayed pairing code.
    pub code_rotation: Duration,
    /// Interval between connection-status polls.
    pub status_poll_interval: Duration,
    /// Interval between forward message syncs.
    pub message_poll_interval: Duration,
    /// How long the pairing success state stays visible.
    pub success_display: Duration,
    /// Consecutive status-poll failures before the attempt fails.
    pub max_status_failures: u32,
    /// Page size for backward pagination.
    pub page_size: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            code_rotation: Duration::from_secs(constants::CODE_ROTATION_SECS),
            status_poll_interval: Duration::from_secs(constants::STATUS_POLL_INTERVAL_SECS),
            message_poll_interval: Duration::from_secs(constants::MESSAGE_POLL_INTERVAL_SECS),
            success_display: Duration::from_secs(constants::SUCCESS_DISPLAY_SECS),
            max_status_failures: constants::MAX_STATUS_POLL_FAILURES,
            page_size: constants::DEFAULT_PAGE_SIZE,
        }
    }
}
