//! # Identity Layer
//!
//! The authenticator resolves ids into users through a per-request [`RequestGuard`],
//! which sits on top of a shared [`UserProvider`] store. The guard may start out with a
//! durable session user supplied by the host; `once_using_id` attaches a user for the
//! current request only and never writes to the session.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::error::AuthResult;
use crate::core::types::{User, UserId};

/// Looks users up by id
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn retrieve_by_id(&self, id: &UserId) -> AuthResult<Option<User>>;
}

/// In-memory user store
#[derive(Debug, Default)]
pub struct InMemoryUserProvider {
    users: DashMap<UserId, User>,
}

impl InMemoryUserProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserProvider for InMemoryUserProvider {
    async fn retrieve_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }
}

/// Per-request view of the identity layer
#[derive(Clone)]
pub struct RequestGuard {
    users: Arc<dyn UserProvider>,
    session_user_id: Option<UserId>,
    user: Option<User>,
}

impl RequestGuard {
    pub fn new(users: Arc<dyn UserProvider>) -> Self {
        Self {
            users,
            session_user_id: None,
            user: None,
        }
    }

    /// Start from a user the host's session layer already knows about
    pub fn with_session_user(mut self, id: UserId) -> Self {
        self.session_user_id = Some(id);
        self
    }

    pub fn session_user_id(&self) -> Option<&UserId> {
        self.session_user_id.as_ref()
    }

    /// Whether a user is present for this request
    pub async fn check(&mut self) -> AuthResult<bool> {
        Ok(self.user().await?.is_some())
    }

    /// Log the user with `id` in for this request only.
    ///
    /// Returns `false` when no such user exists.
    pub async fn once_using_id(&mut self, id: &UserId) -> AuthResult<bool> {
        match self.users.retrieve_by_id(id).await? {
            Some(user) => {
                self.user = Some(user);
                Ok(true)
            }
            None => {
                tracing::debug!(user_id = %id, "No user found for authenticated id");
                Ok(false)
            }
        }
    }

    /// The current user, resolving the session user on first access
    pub async fn user(&mut self) -> AuthResult<Option<User>> {
        if self.user.is_none() {
            if let Some(id) = &self.session_user_id {
                self.user = self.users.retrieve_by_id(id).await?;
            }
        }

        Ok(self.user.clone())
    }
}

impl fmt::Debug for RequestGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGuard")
            .field("session_user_id", &self.session_user_id)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .finish()
    }
}
