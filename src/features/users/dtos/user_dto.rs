use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::User;
use crate::shared::validation::ORG_ID_REGEX;

/// User record as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub token_identifier: String,
    pub name: String,
    pub image: Option<String>,
    /// Organizations the user belongs to
    pub org_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            token_identifier: user.token_identifier,
            name: user.name,
            image: user.image,
            org_ids: user.org_ids,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Identity-provider payload creating or refreshing a user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertUserDto {
    /// `"{issuer}|{subject}"` of the identity
    #[validate(length(min = 1, max = 512, message = "token_identifier is required"))]
    pub token_identifier: String,
    #[validate(length(max = 255, message = "Name must not exceed 255 characters"))]
    #[serde(default)]
    pub name: String,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Identity-provider payload adding an organization membership
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddOrgMembershipDto {
    #[validate(length(min = 1, max = 512, message = "token_identifier is required"))]
    pub token_identifier: String,
    #[validate(
        length(min = 1, max = 128),
        regex(path = *ORG_ID_REGEX, message = "org_id may only contain letters, digits, '_' and '-'")
    )]
    #[schema(example = "org_2abcXYZ")]
    pub org_id: String,
}
