use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use lux_types::Category;

use crate::db::DbPool;

pub struct CategoryRepository {
    pool: DbPool,
}

impl CategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new category
    pub fn create(&self, category: &Category) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO categories (id, name, description) VALUES (?, ?, ?)",
            (
                category.id.to_string(),
                &category.name,
                category.description.as_deref(),
            ),
        )
        .context("Failed to create category")?;
        Ok(())
    }

    /// Get all categories ordered by name
    pub fn list_all(&self) -> Result<Vec<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description
             FROM categories
             ORDER BY name",
        )?;

        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Get category by ID
    pub fn get_by_id(&self, category_id: &Uuid) -> Result<Option<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description
             FROM categories
             WHERE id = ?",
        )?;

        let category = stmt
            .query_row([category_id.to_string()], |row| {
                Ok(Category {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })
            .optional()?;

        Ok(category)
    }

    /// Get category by exact name
    pub fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description
             FROM categories
             WHERE name = ?",
        )?;

        let category = stmt
            .query_row([name], |row| {
                Ok(Category {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })
            .optional()?;

        Ok(category)
    }

    /// Update a category's name and description
    pub fn update(&self, category_id: &Uuid, name: &str, description: Option<&str>) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE categories SET name = ?, description = ? WHERE id = ?",
            (name, description, category_id.to_string()),
        )
        .context("Failed to update category")?;
        Ok(())
    }

    /// Delete a category along with everything that referenced it
    ///
    /// Posts in the category go away (their likes, investments and comments
    /// cascade), companies assigned to it are unassigned. All of it commits
    /// atomically, a failure partway leaves the category fully intact.
    pub fn delete_cascade(&self, category_id: &Uuid) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM posts WHERE category_id = ?",
            [category_id.to_string()],
        )
        .context("Failed to delete posts in category")?;
        tx.execute(
            "UPDATE companies SET category_id = NULL WHERE category_id = ?",
            [category_id.to_string()],
        )
        .context("Failed to unassign companies from category")?;
        tx.execute(
            "DELETE FROM categories WHERE id = ?",
            [category_id.to_string()],
        )
        .context("Failed to delete category")?;

        tx.commit().context("Failed to commit category delete")?;
        Ok(())
    }
}
