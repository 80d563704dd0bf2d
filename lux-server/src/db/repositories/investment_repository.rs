use anyhow::{Context, Result};
use uuid::Uuid;

use lux_types::Investment;

use crate::db::DbPool;

pub struct InvestmentRepository {
    pool: DbPool,
}

impl InvestmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record an investment in a post
    ///
    /// Every investment is its own row; repeat investments from the same
    /// company accumulate rather than replace.
    pub fn create(&self, investment: &Investment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO investments (id, post_id, company_id, amount, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                investment.id.to_string(),
                investment.post_id.to_string(),
                investment.company_id.to_string(),
                investment.amount,
                investment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to record investment")?;
        Ok(())
    }

    /// Total amount invested in a post
    pub fn total_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM investments WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
