#[cfg(test)]
pub mod mock;
pub mod postfilters;
pub mod postgres;
pub mod structs;
pub mod tables;

use crate::datastore::structs::{
    Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost, Post, PostChanges,
    PostView, User,
};
use crate::twoface::Fallible;
use async_trait::async_trait;
use postfilters::PostFilters;

#[async_trait]
/// The interface for storing blog data. Every listing comes back newest first, with its related
/// rows already loaded.
pub trait Datastore: Send + Sync + 'static {
    async fn find_user_by_name(&self, username: &str) -> Fallible<Option<User>>;

    async fn find_group_by_slug(&self, slug: &str) -> Fallible<Option<Group>>;
    async fn list_groups(&self) -> Fallible<Vec<Group>>;
    /// Fails with `UserConflict` if the slug is taken.
    async fn new_group(&self, new_group: NewGroup) -> Fallible<Group>;

    async fn count_posts(&self, filters: PostFilters) -> Fallible<i64>;
    /// Posts matching `filters`, ordered by creation time descending, with author and group.
    async fn list_posts(
        &self,
        filters: PostFilters,
        limit: i64,
        offset: i64,
    ) -> Fallible<Vec<PostView>>;
    async fn find_post(&self, id: i32) -> Fallible<Option<PostView>>;
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post>;
    /// Returns `None` if there is no post with that id.
    async fn update_post(&self, id: i32, changes: PostChanges) -> Fallible<Option<Post>>;

    /// Comments on a post, newest first, with their authors.
    async fn list_comments(&self, post_id: i32) -> Fallible<Vec<CommentView>>;
    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment>;

    /// Insert the edge unless it exists. Returns whether a row was created.
    async fn follow(&self, follow: Follow) -> Fallible<bool>;
    /// Remove the edge if it exists. Returns whether a row was deleted.
    async fn unfollow(&self, follow: Follow) -> Fallible<bool>;
    async fn is_following(&self, follow: Follow) -> Fallible<bool>;
}
