use crate::config::MAX_POST_LENGTH;
use crate::core::db::Repository;
use crate::core::errors::BoardError;
use crate::core::helpers::now;
use crate::models::models::{NewPost, Post};
use crate::security::guard::assert_post_owner;
use crate::security::identity::{AuthenticatedIdentity, RequestContext};

fn validate_content(content: &str) -> Result<(), BoardError> {
    if content.trim().is_empty() {
        return Err(BoardError::Validation("Post content is required".to_string()));
    }
    if content.chars().count() > MAX_POST_LENGTH {
        return Err(BoardError::Validation(format!(
            "Post content must be at most {} characters",
            MAX_POST_LENGTH
        )));
    }
    Ok(())
}

fn post_not_found(id: u64) -> BoardError {
    BoardError::NotFound(format!("Post not found with id: {}", id))
}

pub fn require_identity(ctx: &RequestContext) -> Result<&AuthenticatedIdentity, BoardError> {
    ctx.identity().ok_or(BoardError::Unauthenticated)
}

pub fn list_posts<R: Repository + ?Sized>(repo: &R) -> Result<Vec<Post>, BoardError> {
    Ok(repo.list_posts_newest_first()?)
}

pub fn find_post<R: Repository + ?Sized>(repo: &R, id: u64) -> Result<Post, BoardError> {
    repo.find_post_by_id(id)?.ok_or_else(|| post_not_found(id))
}

pub fn create_post<R: Repository + ?Sized>(
    repo: &mut R,
    identity: &AuthenticatedIdentity,
    content: &str,
) -> Result<Post, BoardError> {
    validate_content(content)?;

    // The token may outlive the account it was issued for.
    let author = repo
        .find_user_by_username(&identity.username)?
        .ok_or_else(|| BoardError::NotFound("User not found".to_string()))?;

    let post = repo.insert_post(NewPost {
        user_id: author.id,
        author_username: author.username,
        content: content.to_string(),
        created_at: now(),
    })?;

    tracing::info!(post_id = post.id, author = %post.author_username, "post created");
    Ok(post)
}

/// Lookup, then ownership check, then write. Must run on a single
/// connection so the three steps are not interleaved with other writers.
pub fn update_post<R: Repository + ?Sized>(
    repo: &mut R,
    id: u64,
    content: &str,
    identity: &AuthenticatedIdentity,
) -> Result<Post, BoardError> {
    validate_content(content)?;

    let mut post = find_post(repo, id)?;
    assert_post_owner(&post, identity)?;

    if post.content == content {
        return Ok(post);
    }

    post.content = content.to_string();
    post.updated_at = Some(now());
    let post = repo.save_post(post)?;

    tracing::info!(post_id = post.id, "post updated");
    Ok(post)
}

pub fn delete_post<R: Repository + ?Sized>(
    repo: &mut R,
    id: u64,
    identity: &AuthenticatedIdentity,
) -> Result<(), BoardError> {
    let post = find_post(repo, id)?;
    assert_post_owner(&post, identity)?;

    repo.delete_post(&post)?;

    tracing::info!(post_id = post.id, "post deleted");
    Ok(())
}
