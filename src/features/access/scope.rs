use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::shared::constants::{ORG_SCOPE_PREFIX, PERSONAL_SCOPE_PREFIX};
use crate::shared::validation::is_valid_org_id;

/// Discriminant of a scope as stored in the `scope_kind` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "scope_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Organization,
    Personal,
}

/// Namespace that owns a set of files.
///
/// Textual form is `org:<org_id>` or `user:<user uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scope {
    Organization(String),
    Personal(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeParseError {
    #[error("Scope must start with '{}' or '{}'", ORG_SCOPE_PREFIX, PERSONAL_SCOPE_PREFIX)]
    UnknownKind,

    #[error("Invalid organization id: {0:?}")]
    InvalidOrgId(String),

    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Organization(_) => ScopeKind::Organization,
            Scope::Personal(_) => ScopeKind::Personal,
        }
    }

    /// Value stored in the `scope_id` column
    pub fn id(&self) -> String {
        match self {
            Scope::Organization(org_id) => org_id.clone(),
            Scope::Personal(user_id) => user_id.to_string(),
        }
    }

    /// Rebuild a scope from its stored columns
    pub fn from_parts(kind: ScopeKind, id: &str) -> Result<Self, ScopeParseError> {
        match kind {
            ScopeKind::Organization if is_valid_org_id(id) => {
                Ok(Scope::Organization(id.to_string()))
            }
            ScopeKind::Organization => Err(ScopeParseError::InvalidOrgId(id.to_string())),
            ScopeKind::Personal => Uuid::parse_str(id)
                .map(Scope::Personal)
                .map_err(|_| ScopeParseError::InvalidUserId(id.to_string())),
        }
    }
}

impl FromStr for Scope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(org_id) = s.strip_prefix(ORG_SCOPE_PREFIX) {
            Scope::from_parts(ScopeKind::Organization, org_id)
        } else if let Some(user_id) = s.strip_prefix(PERSONAL_SCOPE_PREFIX) {
            Scope::from_parts(ScopeKind::Personal, user_id)
        } else {
            Err(ScopeParseError::UnknownKind)
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Organization(org_id) => write!(f, "{}{}", ORG_SCOPE_PREFIX, org_id),
            Scope::Personal(user_id) => write!(f, "{}{}", PERSONAL_SCOPE_PREFIX, user_id),
        }
    }
}

impl TryFrom<String> for Scope {
    type Error = ScopeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl From<ScopeParseError> for AppError {
    fn from(err: ScopeParseError) -> Self {
        AppError::Validation(err.to_string())
    }
}
