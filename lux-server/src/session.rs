use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Database-backed session manager for persistent authentication
///
/// Manages company sessions with token-based authentication, including:
/// - Session creation with UUID v4 tokens
/// - Session validation with expiry checking
/// - Session deletion (logout)
/// - Automatic cleanup of expired sessions
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new session for a company
    ///
    /// Generates a cryptographically secure UUID v4 token and stores it in the database
    /// with a 30-day expiry period.
    ///
    /// # Arguments
    /// * `company_id` - The UUID of the company to create a session for
    ///
    /// # Returns
    /// * `Result<String>` - The session token on success
    pub fn create_session(&self, company_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(30);

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, company_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                company_id.to_string(),
                created_at.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for company {}", company_id);
        Ok(token)
    }

    /// Validate a session token and return the associated company ID
    ///
    /// Checks if the token exists in the database and has not expired.
    ///
    /// # Arguments
    /// * `token` - The session token to validate
    ///
    /// # Returns
    /// * `Result<Uuid>` - The company ID if the session is valid
    /// * `Err` - If the session is invalid or expired
    pub fn validate_session(&self, token: &str) -> Result<Uuid> {
        let conn = self.db.connection()?;

        let (company_id_str, expires_at_str): (String, String) = conn
            .query_row(
                "SELECT company_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("Session not found")?;

        // Parse expiry time
        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .context("Failed to parse expiry time")?
            .with_timezone(&Utc);

        // Check if session has expired
        if Utc::now() > expires_at {
            // Clean up expired session
            self.delete_session(token)?;
            anyhow::bail!("Session has expired");
        }

        // Parse company ID
        let company_id =
            Uuid::parse_str(&company_id_str).context("Failed to parse company ID")?;

        Ok(company_id)
    }

    /// Delete a session (logout)
    ///
    /// Removes the session from the database, effectively logging out the company.
    ///
    /// # Arguments
    /// * `token` - The session token to delete
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Clean up expired sessions from the database
    ///
    /// Removes all sessions that have passed their expiry time.
    /// This should be called periodically to prevent database bloat.
    ///
    /// # Returns
    /// * `Result<usize>` - The number of sessions deleted
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}
