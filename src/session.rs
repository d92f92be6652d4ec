//! The signed-in context the shells hand to everything that talks to the
//! backend on the user's behalf.

use std::sync::Arc;

use crate::api::models::User;
use crate::api::{ApiClient, ApiError, Transport};
use crate::app::AppState;
use crate::timeline::{Presentation, Timeline};

pub struct Session {
    client: Arc<ApiClient>,
    user: User,
}

impl Session {
    pub fn new(client: Arc<ApiClient>, user: User) -> Self {
        Self { client, user }
    }

    /// Rebuilds a session from the stored token, checking it with `/v1/users/me`.
    pub async fn resume(state: &AppState) -> Result<Self, ApiError> {
        let token = state.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        let client = ApiClient::new(&state.endpoints())?.with_token(token);
        let user = client.current_user().await?;
        log::info!("Resumed session for {}", user.username);
        Ok(Self::new(Arc::new(client), user))
    }

    /// Logs in and records the token in `state`; the caller persists it.
    pub async fn login(
        state: &mut AppState,
        username: &str,
        password: &str,
    ) -> Result<Self, ApiError> {
        let anonymous = ApiClient::new(&state.endpoints())?;
        let token = anonymous.login(username, password).await?.access_token;
        let client = ApiClient::new(&state.endpoints())?.with_token(token.clone());
        let user = client.current_user().await?;
        state.token = Some(token);
        state.username = Some(user.username.clone());
        log::info!("Logged in as {}", user.username);
        Ok(Self::new(Arc::new(client), user))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// A timeline that fetches through this session and marks the user's own messages.
    pub fn timeline<V: Presentation>(&self, view: V) -> Timeline<V> {
        let transport: Arc<dyn Transport> = self.client.clone();
        Timeline::new(transport, self.user.id.clone(), view)
    }
}

/// Forgets the stored credentials.
pub fn logout(state: &mut AppState) {
    state.token = None;
}
