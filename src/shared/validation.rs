use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::MAX_ORG_ID_LENGTH;

lazy_static! {
    /// Regex for organization ids handed out by the identity provider
    /// Must be ASCII alphanumeric plus `_` and `-`
    /// - Valid: "org_2abcXYZ", "acme-co", "team42"
    /// - Invalid: "", "org 1", "org:1", "org/1", "ôrg"
    pub static ref ORG_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Check an organization id's syntax and length
pub fn is_valid_org_id(org_id: &str) -> bool {
    org_id.len() <= MAX_ORG_ID_LENGTH && ORG_ID_REGEX.is_match(org_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_id_regex_valid() {
        assert!(ORG_ID_REGEX.is_match("org_2abcXYZ"));
        assert!(ORG_ID_REGEX.is_match("acme-co"));
        assert!(ORG_ID_REGEX.is_match("team42"));
        assert!(ORG_ID_REGEX.is_match("a"));
    }

    #[test]
    fn test_org_id_regex_invalid() {
        assert!(!ORG_ID_REGEX.is_match("")); // empty
        assert!(!ORG_ID_REGEX.is_match("org 1")); // space
        assert!(!ORG_ID_REGEX.is_match("org:1")); // scope separator
        assert!(!ORG_ID_REGEX.is_match("org/1")); // path separator
        assert!(!ORG_ID_REGEX.is_match("ôrg")); // non-ascii
    }

    #[test]
    fn test_org_id_length_limit() {
        assert!(is_valid_org_id(&"a".repeat(MAX_ORG_ID_LENGTH)));
        assert!(!is_valid_org_id(&"a".repeat(MAX_ORG_ID_LENGTH + 1)));
    }
}
