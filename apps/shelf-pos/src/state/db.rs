//! # Database State
//!
//! Wraps the `Database` for use in commands and gates every access through
//! the administrator check.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! async fn get_book(db: &DbState, user_id: &str, id: &str) -> Result<Book, ApiError> {
//!     let session = db.session(user_id).await?;
//!     Ok(session.books().get(id).await?)
//! }
//! ```

use shelf_db::{AdminSession, Database};
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Opens an administrator session for one request.
    ///
    /// ## Returns
    /// * `Err(ApiError)` with `PERMISSION_DENIED` when `user_id` is not an administrator
    pub async fn session(&self, user_id: &str) -> Result<AdminSession, ApiError> {
        debug!(user_id = %user_id, "Opening admin session");
        Ok(self.db.session(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use shelf_db::DbConfig;

    #[tokio::test]
    async fn test_session_requires_admin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.grant_admin("manager").await.unwrap();
        let state = DbState::new(db);

        assert!(state.session("manager").await.is_ok());

        let err = state.session("clerk").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
