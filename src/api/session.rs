use tower_sessions::Session;

use super::ApiError;
use crate::db::{Store, User};
use crate::entities::users;

const USER_ID_KEY: &str = "user_id";
const RESET_ID_KEY: &str = "reset_id";

/// Session-backed identity for one request. The session stores ids only;
/// the user row is resolved fresh on every read, so profile edits show up
/// immediately.
pub struct SessionContext<'a> {
    session: Session,
    store: &'a Store,
}

impl<'a> SessionContext<'a> {
    #[must_use]
    pub const fn new(session: Session, store: &'a Store) -> Self {
        Self { session, store }
    }

    pub async fn start_session(&self, user_id: i32) -> Result<(), ApiError> {
        self.session
            .insert(USER_ID_KEY, user_id)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))
    }

    /// Resolve the logged-in user, if any. This answers "who is this
    /// session?", not "may this account still log in?": a user disabled
    /// after login keeps a working session until it expires.
    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        let user_id: Option<i32> = self
            .session
            .get(USER_ID_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let user = self.store.get_user_by_id(user_id).await?;
        Ok(user.map(User::from))
    }

    /// Drop the login binding. Any reset flow in the same session is left
    /// alone.
    pub async fn end_session(&self) -> Result<(), ApiError> {
        let _: Option<i32> = self
            .session
            .remove(USER_ID_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
        Ok(())
    }

    pub async fn begin_reset(&self, user_id: i32) -> Result<(), ApiError> {
        self.session
            .insert(RESET_ID_KEY, user_id)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))
    }

    /// The account under reset in this session, if a flow is active.
    pub async fn reset_subject(&self) -> Result<Option<users::Model>, ApiError> {
        let reset_id: Option<i32> = self
            .session
            .get(RESET_ID_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

        let Some(reset_id) = reset_id else {
            return Ok(None);
        };

        let user = self.store.get_user_by_id(reset_id).await?;
        Ok(user)
    }

    /// Read and clear the reset binding in one step, so a completed flow
    /// cannot be replayed.
    pub async fn complete_reset(&self) -> Result<Option<i32>, ApiError> {
        self.session
            .remove(RESET_ID_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))
    }
}
