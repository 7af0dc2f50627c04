//! Size limits and defaults for the support desk.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Visitor fields (chars) ===

/// Visitor display name max length.
pub const MAX_VISITOR_NAME_LEN: usize = 120;

/// Visitor email max length.
pub const MAX_EMAIL_LEN: usize = 254;

/// Visitor phone max length.
pub const MAX_PHONE_LEN: usize = 32;

/// Subject line max length.
pub const MAX_SUBJECT_LEN: usize = 200;

/// Department / source channel max length.
pub const MAX_LABEL_LEN: usize = 64;

// === Messages ===

/// Maximum message content length (chars).
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Maximum transfer reason / notes length (chars).
pub const MAX_NOTES_LEN: usize = 1000;

/// Maximum rating feedback length (chars).
pub const MAX_FEEDBACK_LEN: usize = 2000;

// === Ratings ===

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

// === Pagination ===

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// === Support configuration bounds ===

/// Upper bound for `maxSessionsPerAgent`.
pub const MAX_SESSIONS_PER_AGENT: u32 = 100;

/// Upper bound for `sessionTimeoutMinutes` (one week).
pub const MAX_SESSION_TIMEOUT_MINUTES: u32 = 10_080;
