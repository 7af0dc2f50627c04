//! Agent directory queries.

use rusqlite::{params, Connection, OptionalExtension, Row};
use support_core::{Agent, AgentLoad, Result};

use super::parse_col;
use crate::database::sql_err;

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: parse_col(3, row.get(3)?)?,
        active: row.get(4)?,
    })
}

/// Insert or refresh an agent. Registration order is kept on update.
pub fn upsert_agent(conn: &Connection, agent: &Agent) -> Result<()> {
    conn.execute(
        "INSERT INTO support_agents (id, name, email, role, active, created_seq) \
         VALUES (?1, ?2, ?3, ?4, ?5, \
                 (SELECT COALESCE(MAX(created_seq), 0) + 1 FROM support_agents)) \
         ON CONFLICT(id) DO UPDATE SET \
            name = excluded.name, email = excluded.email, \
            role = excluded.role, active = excluded.active",
        params![agent.id, agent.name, agent.email, agent.role.as_str(), agent.active],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn get_agent(conn: &Connection, id: &str) -> Result<Option<Agent>> {
    conn.query_row(
        "SELECT id, name, email, role, active FROM support_agents WHERE id = ?1",
        params![id],
        agent_from_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Every agent with its load (sessions in WAITING or ACTIVE), in registration order.
pub fn agents_with_load(conn: &Connection) -> Result<Vec<AgentLoad>> {
    let mut stmt = conn
        .prepare(
            "SELECT a.id, a.name, a.email, a.role, a.active, COUNT(s.id) \
             FROM support_agents a \
             LEFT JOIN support_sessions s \
                ON s.assigned_to = a.id AND s.status IN ('WAITING', 'ACTIVE') \
             GROUP BY a.id \
             ORDER BY a.created_seq ASC",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map([], |row| {
            let load: i64 = row.get(5)?;
            Ok(AgentLoad {
                agent: agent_from_row(row)?,
                load: load as u32,
            })
        })
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    Ok(rows)
}

/// Assignable agents with their load, in registration order.
pub fn assignable_agents_with_load(conn: &Connection) -> Result<Vec<AgentLoad>> {
    Ok(agents_with_load(conn)?
        .into_iter()
        .filter(|entry| entry.agent.is_assignable())
        .collect())
}
