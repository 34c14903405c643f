use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller identity derived from a validated bearer token.
///
/// `token_identifier` is the opaque key used to look up the internal user
/// record; it is never parsed by the rest of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub token_identifier: String,
    pub sub: String,
}

impl AuthenticatedUser {
    pub fn new(issuer: &str, sub: impl Into<String>) -> Self {
        let sub = sub.into();
        Self {
            token_identifier: format!("{}|{}", issuer.trim_end_matches('/'), sub),
            sub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_identifier_joins_issuer_and_subject() {
        let user = AuthenticatedUser::new("https://auth.example.com/", "user_2abc");
        assert_eq!(user.token_identifier, "https://auth.example.com|user_2abc");
        assert_eq!(user.sub, "user_2abc");
    }
}
