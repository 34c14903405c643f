mod policy;
mod scope;

pub use policy::has_access;
pub use scope::{Scope, ScopeKind, ScopeParseError};
