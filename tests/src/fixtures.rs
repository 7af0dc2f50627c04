//! Test fixtures: agents and request bodies.

use serde_json::{json, Value};
use support_core::{Agent, AgentRole};

pub const ADA: &str = "agent-ada";
pub const GRACE: &str = "agent-grace";
/// Plain user account, never assignable
pub const LINUS: &str = "agent-linus";
/// Deactivated editor
pub const KEN: &str = "agent-ken";

pub const ADMIN_TOKEN: &str = "test-admin-token";

fn agent(id: &str, name: &str, role: AgentRole, active: bool) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        email: Some(format!("{id}@example.com")),
        role,
        active,
    }
}

/// Agent directory seeded into every test context, in registration order.
pub fn agents() -> Vec<Agent> {
    vec![
        agent(ADA, "Ada Lovelace", AgentRole::Editor, true),
        agent(GRACE, "Grace Hopper", AgentRole::Admin, true),
        agent(LINUS, "Linus Torvalds", AgentRole::User, true),
        agent(KEN, "Ken Thompson", AgentRole::Editor, false),
    ]
}

/// Body for `POST /support/sessions`.
pub fn new_session(subject: &str) -> Value {
    json!({
        "visitorName": "Visitor",
        "visitorEmail": "visitor@example.com",
        "subject": subject,
        "source": "widget",
        "priority": "HIGH",
        "metadata": { "page": "/pricing" }
    })
}

/// Body for `POST /support/sessions/:id/messages`.
pub fn message(content: &str, sender_type: &str, sender_id: Option<&str>) -> Value {
    json!({
        "content": content,
        "senderType": sender_type,
        "senderId": sender_id,
    })
}

/// Body for `POST /support/transfers`.
pub fn transfer(session_id: &str, from: Option<&str>, to: &str) -> Value {
    json!({
        "sessionId": session_id,
        "fromAgentId": from,
        "toAgentId": to,
        "reason": "Needs billing expertise",
    })
}

/// Authorization header value for agent routes.
pub fn bearer() -> String {
    format!("Bearer {ADMIN_TOKEN}")
}
