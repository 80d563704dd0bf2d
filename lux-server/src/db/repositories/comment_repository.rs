use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use lux_types::Comment;

use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new comment
    pub fn create(&self, comment: &Comment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (id, post_id, company_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.company_id.to_string(),
                &comment.content,
                comment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    /// Get a single comment by ID
    pub fn get_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.post_id, m.company_id, c.name, m.content, m.created_at
             FROM comments m
             JOIN companies c ON m.company_id = c.id
             WHERE m.id = ?",
        )?;

        let comment = stmt
            .query_row([comment_id.to_string()], |row| {
                Ok(Comment {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
                    company_name: row.get(3)?,
                    content: row.get(4)?,
                    created_at: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })
            .optional()?;

        Ok(comment)
    }

    /// Get all comments on a post, oldest first
    pub fn list_by_post(&self, post_id: &Uuid) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.post_id, m.company_id, c.name, m.content, m.created_at
             FROM comments m
             JOIN companies c ON m.company_id = c.id
             WHERE m.post_id = ?
             ORDER BY m.created_at ASC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], |row| {
                Ok(Comment {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
                    company_name: row.get(3)?,
                    content: row.get(4)?,
                    created_at: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Delete a comment
    pub fn delete(&self, comment_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM comments WHERE id = ?", [comment_id.to_string()])
            .context("Failed to delete comment")?;
        Ok(())
    }
}
