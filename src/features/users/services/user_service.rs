use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::auth::AuthenticatedUser;
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;

/// Maps verified identities to user records and keeps them in sync with the
/// identity provider
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Look up the user owning `token_identifier`
    pub async fn resolve_user(&self, token_identifier: &str) -> Result<User> {
        self.repo
            .find_by_token(token_identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Resolve the caller for a write; anonymous or unknown identities are rejected
    pub async fn require_caller(&self, caller: Option<&AuthenticatedUser>) -> Result<User> {
        self.find_caller(caller)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unauthenticated call".to_string()))
    }

    /// Resolve the caller for a read; `None` when there is nobody to resolve
    pub async fn find_caller(&self, caller: Option<&AuthenticatedUser>) -> Result<Option<User>> {
        let Some(caller) = caller else {
            return Ok(None);
        };

        match self.resolve_user(&caller.token_identifier).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::NotFound(_)) => {
                debug!(
                    "No user record for identity {}; treating caller as anonymous",
                    caller.token_identifier
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The caller's own record
    pub async fn get_me(&self, caller: Option<&AuthenticatedUser>) -> Result<User> {
        self.require_caller(caller).await
    }

    /// Create the user on first sight, refresh profile fields afterwards
    pub async fn upsert_user(
        &self,
        token_identifier: &str,
        name: &str,
        image: Option<&str>,
    ) -> Result<User> {
        let user = self.repo.upsert(token_identifier, name, image).await?;
        info!("Synced user {} ({})", user.id, user.token_identifier);
        Ok(user)
    }

    /// Record that the user belongs to `org_id`; repeated calls are no-ops
    pub async fn add_org_membership(&self, token_identifier: &str, org_id: &str) -> Result<User> {
        let user = self
            .repo
            .add_org_id(token_identifier, org_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!("User {} is a member of organization {}", user.id, org_id);
        Ok(user)
    }
}
