//! Application-wide constants
//!
//! Default tunables for the pairing and sync timers. All of these are
//! overridable through `CoreConfig`; nothing outside this module hard-codes
//! an interval.

/// How often a displayed pairing code is replaced while waiting for a scan.
pub const CODE_ROTATION_SECS: u64 = 20;

/// Interval between connection-status polls during a pairing attempt.
pub const STATUS_POLL_INTERVAL_SECS: u64 = 3;

/// Interval between forward message syncs for an open conversation.
pub const MESSAGE_POLL_INTERVAL_SECS: u64 = 5;

/// How long the success state stays visible after a pairing completes
/// before the session returns to the neutral "connected" display.
pub const SUCCESS_DISPLAY_SECS: u64 = 2;

/// Consecutive status-poll failures tolerated before the pairing attempt
/// is considered failed. A single successful poll resets the count.
pub const MAX_STATUS_POLL_FAILURES: u32 = 5;

/// Messages fetched per backward-pagination page.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Contact profiles kept in a `ContactCache` before the least recently
/// used entry is evicted.
pub const DEFAULT_CONTACT_CACHE_CAPACITY: usize = 64;
