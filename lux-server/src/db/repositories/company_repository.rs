use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use lux_types::Company;

use crate::db::DbPool;

pub struct CompanyRepository {
    pool: DbPool,
}

impl CompanyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new company with its credential hash
    pub fn create(&self, company: &Company, credential_hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO companies (id, name, credential_hash, category_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                company.id.to_string(),
                &company.name,
                credential_hash,
                company.category_id.map(|id| id.to_string()),
                company.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create company")?;
        Ok(())
    }

    /// Get company by ID
    pub fn get_by_id(&self, company_id: &Uuid) -> Result<Option<Company>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id, created_at
             FROM companies
             WHERE id = ?",
        )?;

        let company = stmt
            .query_row([company_id.to_string()], |row| {
                let category_id_str: Option<String> = row.get(2)?;
                Ok(Company {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    category_id: category_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
                    created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })
            .optional()?;

        Ok(company)
    }

    /// Get company by exact name
    pub fn get_by_name(&self, name: &str) -> Result<Option<Company>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id, created_at
             FROM companies
             WHERE name = ?",
        )?;

        let company = stmt
            .query_row([name], |row| {
                let category_id_str: Option<String> = row.get(2)?;
                Ok(Company {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    category_id: category_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
                    created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })
            .optional()?;

        Ok(company)
    }

    /// Look up a company together with its stored credential hash
    ///
    /// Only the login path reads the hash; it never travels further than the
    /// verification call.
    pub fn find_with_credential(&self, name: &str) -> Result<Option<(Company, String)>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id, created_at, credential_hash
             FROM companies
             WHERE name = ?",
        )?;

        let found = stmt
            .query_row([name], |row| {
                let category_id_str: Option<String> = row.get(2)?;
                let company = Company {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    category_id: category_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
                    created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                };
                Ok((company, row.get::<_, String>(4)?))
            })
            .optional()?;

        Ok(found)
    }

    /// Get all companies ordered by name
    pub fn list_all(&self) -> Result<Vec<Company>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id, created_at
             FROM companies
             ORDER BY name",
        )?;

        let companies = stmt
            .query_map([], |row| {
                let category_id_str: Option<String> = row.get(2)?;
                Ok(Company {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    category_id: category_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
                    created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(companies)
    }

    /// Get all companies assigned to a category, ordered by name
    pub fn list_by_category(&self, category_id: &Uuid) -> Result<Vec<Company>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id, created_at
             FROM companies
             WHERE category_id = ?
             ORDER BY name",
        )?;

        let companies = stmt
            .query_map([category_id.to_string()], |row| {
                let category_id_str: Option<String> = row.get(2)?;
                Ok(Company {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    category_id: category_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
                    created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(companies)
    }

    /// Find the alphabetically first company whose name contains the fragment
    /// (case-insensitive)
    pub fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<Company>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id, created_at
             FROM companies
             WHERE instr(lower(name), lower(?)) > 0
             ORDER BY name ASC
             LIMIT 1",
        )?;

        let company = stmt
            .query_row([fragment], |row| {
                let category_id_str: Option<String> = row.get(2)?;
                Ok(Company {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    name: row.get(1)?,
                    category_id: category_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
                    created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })
            .optional()?;

        Ok(company)
    }

    /// Assign or clear the company's category
    pub fn set_category(&self, company_id: &Uuid, category_id: Option<&Uuid>) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE companies SET category_id = ? WHERE id = ?",
            (category_id.map(|id| id.to_string()), company_id.to_string()),
        )
        .context("Failed to update company category")?;
        Ok(())
    }
}
