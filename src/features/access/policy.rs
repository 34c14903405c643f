use super::scope::Scope;
use crate::features::users::User;

/// Whether `user` may read and mutate files in `scope`.
///
/// Organization scopes require exact membership; personal scopes belong to
/// exactly one user.
pub fn has_access(user: &User, scope: &Scope) -> bool {
    match scope {
        Scope::Organization(org_id) => user.is_member_of(org_id),
        Scope::Personal(user_id) => *user_id == user.id,
    }
}
