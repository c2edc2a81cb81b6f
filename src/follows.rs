//! Subscribing to and unsubscribing from authors.
use crate::auth::SessionUser;
use crate::datastore::{
    structs::{Follow, User},
    Datastore,
};
use crate::twoface::{Fallible, OrNotFound};
use tracing::info;

/// Make `follower` follow the user called `username`. Following yourself does nothing, and so
/// does following someone twice.
pub async fn follow<DS: Datastore>(
    ds: &DS,
    follower: &SessionUser,
    username: &str,
) -> Fallible<User> {
    let author = ds
        .find_user_by_name(username)
        .await?
        .or_not_found("User not found")?;
    if author.id == follower.id {
        return Ok(author);
    }
    let created = ds
        .follow(Follow {
            user_id: follower.id,
            author_id: author.id,
        })
        .await?;
    if created {
        info!(follower = %follower.username, author = %author.username, "followed");
    }
    Ok(author)
}

/// Stop `follower` following the user called `username`, if they were.
pub async fn unfollow<DS: Datastore>(
    ds: &DS,
    follower: &SessionUser,
    username: &str,
) -> Fallible<User> {
    let author = ds
        .find_user_by_name(username)
        .await?
        .or_not_found("User not found")?;
    let removed = ds
        .unfollow(Follow {
            user_id: follower.id,
            author_id: author.id,
        })
        .await?;
    if removed {
        info!(follower = %follower.username, author = %author.username, "unfollowed");
    }
    Ok(author)
}
