//! SQLite table schemas.
//!
//! Timestamps are stored as Unix milliseconds (INTEGER) so that ordering by
//! column value matches chronological order.

/// Current schema version, recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Agent directory (the assignable subset of users).
pub const CREATE_AGENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS support_agents (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT,
    role TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    -- Registration order, used as the stable enumeration order
    created_seq INTEGER NOT NULL
)
"#;

/// Support sessions.
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS support_sessions (
    id TEXT PRIMARY KEY NOT NULL,
    session_id TEXT NOT NULL UNIQUE,
    visitor_name TEXT,
    visitor_email TEXT,
    visitor_phone TEXT,
    user_id TEXT,
    customer_id TEXT,
    subject TEXT,
    department TEXT,
    source TEXT,
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    assigned_to TEXT REFERENCES support_agents(id),
    rating INTEGER,
    feedback TEXT,
    metadata TEXT,
    created_at INTEGER NOT NULL,
    last_activity_at INTEGER NOT NULL,
    assigned_at INTEGER,
    ended_at INTEGER,
    version INTEGER NOT NULL DEFAULT 0,
    CHECK (status NOT IN ('CLOSED', 'ABANDONED') OR ended_at IS NOT NULL),
    CHECK (assigned_to IS NULL OR assigned_at IS NOT NULL)
)
"#;

/// Append-only message log. `seq` is the log order.
pub const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS support_messages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    session_id TEXT NOT NULL REFERENCES support_sessions(id),
    content TEXT NOT NULL,
    message_type TEXT NOT NULL,
    sender_type TEXT NOT NULL,
    sender_id TEXT,
    status TEXT NOT NULL,
    created_at INTEGER NOT NULL
)
"#;

/// Transfer requests.
pub const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS support_transfers (
    id TEXT PRIMARY KEY NOT NULL,
    session_id TEXT NOT NULL REFERENCES support_sessions(id),
    from_agent_id TEXT REFERENCES support_agents(id),
    to_agent_id TEXT NOT NULL REFERENCES support_agents(id),
    reason TEXT,
    notes TEXT,
    status TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    accepted_at INTEGER,
    rejected_at INTEGER,
    cancelled_at INTEGER,
    version INTEGER NOT NULL DEFAULT 0
)
"#;

/// Support configuration singleton, pinned to id 1.
pub const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS support_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    enabled INTEGER NOT NULL,
    welcome_message TEXT NOT NULL,
    offline_message TEXT NOT NULL,
    auto_assignment INTEGER NOT NULL,
    max_sessions_per_agent INTEGER NOT NULL,
    allow_file_upload INTEGER NOT NULL,
    max_file_size_mb INTEGER NOT NULL,
    allowed_file_types TEXT NOT NULL,
    allow_rating INTEGER NOT NULL,
    session_timeout_minutes INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

/// Indexes, including the storage-level guard for one PENDING transfer per session.
pub const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sessions_status ON support_sessions(status);
CREATE INDEX IF NOT EXISTS idx_sessions_assigned ON support_sessions(assigned_to, status);
CREATE INDEX IF NOT EXISTS idx_sessions_created ON support_sessions(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_session ON support_messages(session_id, created_at, seq);
CREATE INDEX IF NOT EXISTS idx_transfers_session ON support_transfers(session_id, created_at);
CREATE UNIQUE INDEX IF NOT EXISTS idx_transfers_one_pending
    ON support_transfers(session_id) WHERE status = 'PENDING';
"#;

/// Get all DDL statements in creation order.
pub fn all_tables() -> Vec<&'static str> {
    vec![
        CREATE_AGENTS_TABLE,
        CREATE_SESSIONS_TABLE,
        CREATE_MESSAGES_TABLE,
        CREATE_TRANSFERS_TABLE,
        CREATE_SETTINGS_TABLE,
        CREATE_INDEXES,
    ]
}
