use crate::db::Database;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(db: Database, admin_token: Option<String>) -> Self {
        let session_manager = SessionManager::new(db.clone());
        Self {
            db,
            session_manager,
            admin_token,
        }
    }

    /// Get authenticated company ID from session token
    pub fn get_authenticated_company_id_from_token(&self, token: &str) -> Option<uuid::Uuid> {
        self.session_manager.validate_session(token).ok()
    }
}
