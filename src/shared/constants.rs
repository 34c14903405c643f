/// Maximum length of a file's display name (in characters)
pub const MAX_FILE_NAME_LENGTH: u64 = 255;

/// Maximum length of an opaque blob handle
pub const MAX_BLOB_HANDLE_LENGTH: u64 = 512;

/// Maximum length of an organization id issued by the identity provider
pub const MAX_ORG_ID_LENGTH: usize = 128;

/// Prefix of the textual form of an organization scope (`org:<id>`)
pub const ORG_SCOPE_PREFIX: &str = "org:";

/// Prefix of the textual form of a personal scope (`user:<uuid>`)
pub const PERSONAL_SCOPE_PREFIX: &str = "user:";
