//! Agents: staff users who can own support sessions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result, ValidationErrorCode};

/// User role. Only ADMIN and EDITOR can be assigned sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRole {
    Admin,
    Editor,
    User,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Editor => "EDITOR",
            Self::User => "USER",
        }
    }

    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Admin | Self::Editor)
    }
}

impl FromStr for AgentRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "EDITOR" => Ok(Self::Editor),
            "USER" => Ok(Self::User),
            other => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "role",
                format!("unknown role '{other}'"),
            )),
        }
    }
}

/// A staff user as seen by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: AgentRole,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Agent {
    /// Whether this agent may own sessions right now.
    pub fn is_assignable(&self) -> bool {
        self.active && self.role.is_assignable()
    }

    /// Validates that `agent` exists and may own sessions.
    pub fn require_assignable(agent: Option<Agent>, field: &str) -> Result<Agent> {
        match agent {
            Some(agent) if agent.is_assignable() => Ok(agent),
            Some(agent) => Err(Error::invalid_field(
                ValidationErrorCode::InvalidAgent,
                field,
                format!("Agent {} is inactive or cannot take sessions", agent.id),
            )),
            None => Err(Error::invalid_field(
                ValidationErrorCode::InvalidAgent,
                field,
                "Agent not found",
            )),
        }
    }
}

/// An agent together with its current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLoad {
    #[serde(flatten)]
    pub agent: Agent,
    /// Sessions assigned to this agent with status WAITING or ACTIVE
    pub load: u32,
}
