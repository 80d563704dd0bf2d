use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use lux_types::Post;

use crate::db::DbPool;
use crate::score::compute_score;

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, company_id, category_id, title, content, created_at, likes, investment, score)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.company_id.to_string(),
                post.category_id.to_string(),
                &post.title,
                &post.content,
                post.created_at.to_rfc3339(),
                post.likes,
                post.investment,
                post.score,
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get a single post by ID
    ///
    /// Like every read in this repository, engagement counters come from the
    /// likes, investments and comments tables, never from the cached columns
    /// on the posts row, and the score is recomputed from those counts.
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                    (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                    (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
             FROM posts p
             JOIN companies c ON p.company_id = c.id
             WHERE p.id = ?",
        )?;

        let post = stmt
            .query_row([post_id.to_string()], |row| {
                let likes: i64 = row.get(7)?;
                let investment: i64 = row.get(8)?;
                let comment_count: i64 = row.get(9)?;
                let content: String = row.get(5)?;
                let score = compute_score(likes, investment, &content, comment_count);
                Ok(Post {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_name: row.get(2)?,
                    category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                    title: row.get(4)?,
                    content,
                    created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                    likes,
                    investment,
                    comment_count,
                    score,
                })
            })
            .optional()?;

        Ok(post)
    }

    /// Get the newest posts, optionally restricted to a category
    pub fn list_recent(&self, limit: i64, category_id: Option<&Uuid>) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;

        match category_id {
            Some(category_id) => {
                let mut stmt = conn.prepare(
                    "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                            (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                            (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
                     FROM posts p
                     JOIN companies c ON p.company_id = c.id
                     WHERE p.category_id = ?
                     ORDER BY p.created_at DESC
                     LIMIT ?",
                )?;

                let posts = stmt
                    .query_map([category_id.to_string(), limit.to_string()], |row| {
                        let likes: i64 = row.get(7)?;
                        let investment: i64 = row.get(8)?;
                        let comment_count: i64 = row.get(9)?;
                        let content: String = row.get(5)?;
                        let score = compute_score(likes, investment, &content, comment_count);
                        Ok(Post {
                            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                            company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                            company_name: row.get(2)?,
                            category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                            title: row.get(4)?,
                            content,
                            created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                            likes,
                            investment,
                            comment_count,
                            score,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(posts)
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                            (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                            (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
                     FROM posts p
                     JOIN companies c ON p.company_id = c.id
                     ORDER BY p.created_at DESC
                     LIMIT ?",
                )?;

                let posts = stmt
                    .query_map([limit.to_string()], |row| {
                        let likes: i64 = row.get(7)?;
                        let investment: i64 = row.get(8)?;
                        let comment_count: i64 = row.get(9)?;
                        let content: String = row.get(5)?;
                        let score = compute_score(likes, investment, &content, comment_count);
                        Ok(Post {
                            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                            company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                            company_name: row.get(2)?,
                            category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                            title: row.get(4)?,
                            content,
                            created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                            likes,
                            investment,
                            comment_count,
                            score,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(posts)
            }
        }
    }

    /// Get every post in a category, newest first
    pub fn list_by_category(&self, category_id: &Uuid) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                    (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                    (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
             FROM posts p
             JOIN companies c ON p.company_id = c.id
             WHERE p.category_id = ?
             ORDER BY p.created_at DESC",
        )?;

        let posts = stmt
            .query_map([category_id.to_string()], |row| {
                let likes: i64 = row.get(7)?;
                let investment: i64 = row.get(8)?;
                let comment_count: i64 = row.get(9)?;
                let content: String = row.get(5)?;
                let score = compute_score(likes, investment, &content, comment_count);
                Ok(Post {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_name: row.get(2)?,
                    category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                    title: row.get(4)?,
                    content,
                    created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                    likes,
                    investment,
                    comment_count,
                    score,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get every post by a specific company, newest first
    pub fn list_by_company(&self, company_id: &Uuid) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                    (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                    (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
             FROM posts p
             JOIN companies c ON p.company_id = c.id
             WHERE p.company_id = ?
             ORDER BY p.created_at DESC",
        )?;

        let posts = stmt
            .query_map([company_id.to_string()], |row| {
                let likes: i64 = row.get(7)?;
                let investment: i64 = row.get(8)?;
                let comment_count: i64 = row.get(9)?;
                let content: String = row.get(5)?;
                let score = compute_score(likes, investment, &content, comment_count);
                Ok(Post {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_name: row.get(2)?,
                    category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                    title: row.get(4)?,
                    content,
                    created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                    likes,
                    investment,
                    comment_count,
                    score,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get every post in the database, newest first
    ///
    /// Ranking and search aggregate over the full post set, so this has no
    /// limit.
    pub fn list_all(&self) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                    (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                    (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
             FROM posts p
             JOIN companies c ON p.company_id = c.id
             ORDER BY p.created_at DESC",
        )?;

        let posts = stmt
            .query_map([], |row| {
                let likes: i64 = row.get(7)?;
                let investment: i64 = row.get(8)?;
                let comment_count: i64 = row.get(9)?;
                let content: String = row.get(5)?;
                let score = compute_score(likes, investment, &content, comment_count);
                Ok(Post {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_name: row.get(2)?,
                    category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                    title: row.get(4)?,
                    content,
                    created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                    likes,
                    investment,
                    comment_count,
                    score,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Find the oldest post by a company whose title contains the fragment
    /// (case-insensitive)
    pub fn find_by_title_fragment(
        &self,
        company_id: &Uuid,
        fragment: &str,
    ) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.company_id, c.name, p.category_id, p.title, p.content, p.created_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) as like_count,
                    (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id) as investment_total,
                    (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id) as comment_count
             FROM posts p
             JOIN companies c ON p.company_id = c.id
             WHERE p.company_id = ? AND instr(lower(p.title), lower(?)) > 0
             ORDER BY p.created_at ASC
             LIMIT 1",
        )?;

        let post = stmt
            .query_row([company_id.to_string(), fragment.to_string()], |row| {
                let likes: i64 = row.get(7)?;
                let investment: i64 = row.get(8)?;
                let comment_count: i64 = row.get(9)?;
                let content: String = row.get(5)?;
                let score = compute_score(likes, investment, &content, comment_count);
                Ok(Post {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    company_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                    company_name: row.get(2)?,
                    category_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
                    title: row.get(4)?,
                    content,
                    created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
                    likes,
                    investment,
                    comment_count,
                    score,
                })
            })
            .optional()?;

        Ok(post)
    }

    /// Update the title and content of a post
    pub fn update_content(&self, post_id: &Uuid, title: &str, content: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET title = ?, content = ? WHERE id = ?",
            (title, content, post_id.to_string()),
        )
        .context("Failed to update post")?;
        Ok(())
    }

    /// Delete a post (likes, investments and comments cascade)
    pub fn delete(&self, post_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(())
    }

    /// Recount engagement from source tables and refresh the cached columns
    ///
    /// The cached likes, investment and score columns exist for external
    /// tooling that reads the database directly. Counts are always recounted
    /// from the likes and investments tables rather than incremented, so a
    /// lost update can never leave them drifted.
    pub fn refresh_engagement(&self, post_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;

        let counted = conn
            .query_row(
                "SELECT p.content,
                        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
                        (SELECT COALESCE(SUM(i.amount), 0) FROM investments i WHERE i.post_id = p.id),
                        (SELECT COUNT(*) FROM comments m WHERE m.post_id = p.id)
                 FROM posts p
                 WHERE p.id = ?",
                [post_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        // Post may have been deleted between the mutation and the refresh
        if let Some((content, likes, investment, comment_count)) = counted {
            let score = compute_score(likes, investment, &content, comment_count);
            conn.execute(
                "UPDATE posts SET likes = ?, investment = ?, score = ? WHERE id = ?",
                (likes, investment, score, post_id.to_string()),
            )
            .context("Failed to refresh post engagement")?;
        }

        Ok(())
    }
}
