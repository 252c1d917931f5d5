use scribe_types::models::{Post, SessionUser};

/// Whether `session` may edit or delete `post`.
///
/// Ownership is decided by user id alone. Display names are not unique and
/// never grant access; posts without an owner cannot be changed by anyone.
pub fn can_mutate(session: Option<&SessionUser>, post: &Post) -> bool {
    match (session, post.owner_id) {
        (Some(user), Some(owner)) => user.id == owner,
        _ => false,
    }
}
