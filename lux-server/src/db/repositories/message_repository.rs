use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use lux_types::Message;

use crate::db::DbPool;

pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new message
    pub fn create(&self, message: &Message) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO messages (id, sender_id, receiver_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                message.id.to_string(),
                message.sender_id.to_string(),
                message.receiver_id.to_string(),
                &message.content,
                message.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create message")?;
        Ok(())
    }

    /// Get the full conversation between two companies, oldest first
    pub fn conversation_between(&self, company_a: &Uuid, company_b: &Uuid) -> Result<Vec<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.sender_id, m.receiver_id, s.name, r.name, m.content, m.created_at
             FROM messages m
             JOIN companies s ON m.sender_id = s.id
             JOIN companies r ON m.receiver_id = r.id
             WHERE (m.sender_id = ? AND m.receiver_id = ?)
                OR (m.sender_id = ? AND m.receiver_id = ?)
             ORDER BY m.created_at ASC",
        )?;

        let messages = stmt
            .query_map(
                (
                    company_a.to_string(),
                    company_b.to_string(),
                    company_b.to_string(),
                    company_a.to_string(),
                ),
                |row| {
                    Ok(Message {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        sender_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                        receiver_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
                        sender_name: row.get(3)?,
                        receiver_name: row.get(4)?,
                        content: row.get(5)?,
                        created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Get the companies this company has exchanged messages with, most
    /// recent conversation first
    pub fn conversation_partners(&self, company_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT
                CASE
                    WHEN sender_id = ? THEN receiver_id
                    ELSE sender_id
                END as partner_id
             FROM messages
             WHERE sender_id = ? OR receiver_id = ?
             ORDER BY (SELECT MAX(created_at)
                       FROM messages m2
                       WHERE (m2.sender_id = ? AND m2.receiver_id = partner_id)
                          OR (m2.receiver_id = ? AND m2.sender_id = partner_id)) DESC",
        )?;

        let partner_ids = stmt
            .query_map(
                (
                    company_id.to_string(),
                    company_id.to_string(),
                    company_id.to_string(),
                    company_id.to_string(),
                    company_id.to_string(),
                ),
                |row| {
                    let id_str: String = row.get(0)?;
                    Ok(Uuid::parse_str(&id_str).unwrap())
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(partner_ids)
    }
}
