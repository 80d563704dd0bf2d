use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a like from a company on a post
    ///
    /// Likes are idempotent, the (post, company) pair is the primary key.
    /// Returns true if the like was newly recorded, false if it already
    /// existed.
    pub fn like(&self, post_id: &Uuid, company_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO likes (post_id, company_id, created_at)
                 VALUES (?, ?, ?)",
                (
                    post_id.to_string(),
                    company_id.to_string(),
                    Utc::now().to_rfc3339(),
                ),
            )
            .context("Failed to record like")?;
        Ok(rows > 0)
    }

    /// Count the likes on a post
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
