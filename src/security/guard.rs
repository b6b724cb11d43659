use crate::core::errors::BoardError;
use crate::models::models::Post;
use crate::security::identity::AuthenticatedIdentity;

/// A resource that belongs to exactly one user.
pub trait Owned {
    fn owner_username(&self) -> &str;
}

impl Owned for Post {
    fn owner_username(&self) -> &str {
        &self.author_username
    }
}

pub fn is_owner<T: Owned + ?Sized>(resource: &T, identity: &AuthenticatedIdentity) -> bool {
    resource.owner_username() == identity.username
}

pub fn ensure_owner<T: Owned + ?Sized>(
    resource: &T,
    identity: &AuthenticatedIdentity,
) -> Result<(), BoardError> {
    if is_owner(resource, identity) {
        Ok(())
    } else {
        Err(BoardError::Forbidden)
    }
}

/// Ownership check run by post update and delete after the post was found.
pub fn assert_post_owner(post: &Post, identity: &AuthenticatedIdentity) -> Result<(), BoardError> {
    ensure_owner(post, identity).inspect_err(|_| {
        tracing::info!(
            post_id = post.id,
            owner = %post.author_username,
            requester = %identity.username,
            "refusing to modify another user's post"
        );
    })
}
