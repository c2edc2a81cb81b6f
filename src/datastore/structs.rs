use crate::datastore::tables::{comments, follows, groups, posts, users};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A user of the website. Rows are written by the identity service.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// A topic posts can be filed under.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Parameters for the database statement which inserts new groups.
#[derive(Insertable, Deserialize, Clone, Debug)]
#[table_name = "groups"]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// A post from a user
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Post {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub group_id: Option<i32>,
    pub author_id: Option<Uuid>,
    /// Reference returned by the image store, if the post has an image.
    pub image: Option<String>,
}

impl Post {
    /// Was this post written by `user_id`? Author-less posts belong to nobody.
    pub fn is_by(&self, user_id: Uuid) -> bool {
        self.author_id == Some(user_id)
    }
}

/// Parameters for the database statement which inserts new posts.
#[derive(Insertable, Clone, Debug)]
#[table_name = "posts"]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub author_id: Option<Uuid>,
    pub image: Option<String>,
}

/// An in-place edit of a post. Id, author and creation time never change.
#[derive(Clone, Debug)]
pub struct PostChanges {
    pub text: String,
    /// `None` detaches the post from its group.
    pub group_id: Option<i32>,
    /// `None` keeps the current image.
    pub image: Option<String>,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Comment {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub post_id: i32,
    pub author_id: Uuid,
    pub text: String,
}

#[derive(Insertable, Clone, Debug)]
#[table_name = "comments"]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: Uuid,
    pub text: String,
}

/// A follow edge: `user_id` reads posts by `author_id`.
#[derive(Queryable, Insertable, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[table_name = "follows"]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

/// A post with its author and group already loaded.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub author: Option<User>,
    pub group: Option<Group>,
}

impl PostView {
    /// Attach authors and groups (each fetched in one batch) to a page of posts, keeping the
    /// order of `posts`.
    pub fn assemble(posts: Vec<Post>, authors: Vec<User>, groups: Vec<Group>) -> Vec<PostView> {
        let authors: HashMap<Uuid, User> = authors.into_iter().map(|u| (u.id, u)).collect();
        let groups: HashMap<i32, Group> = groups.into_iter().map(|g| (g.id, g)).collect();
        posts
            .into_iter()
            .map(|post| PostView {
                author: post.author_id.and_then(|id| authors.get(&id).cloned()),
                group: post.group_id.and_then(|id| groups.get(&id).cloned()),
                post,
            })
            .collect()
    }
}

/// A comment with its author already loaded.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Option<User>,
}

impl CommentView {
    pub fn assemble(comments: Vec<Comment>, authors: Vec<User>) -> Vec<CommentView> {
        let authors: HashMap<Uuid, User> = authors.into_iter().map(|u| (u.id, u)).collect();
        comments
            .into_iter()
            .map(|comment| CommentView {
                author: authors.get(&comment.author_id).cloned(),
                comment,
            })
            .collect()
    }
}

/// Ids of the authors referenced by `posts`, without repeats.
pub fn author_ids(posts: &[Post]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = posts.iter().filter_map(|p| p.author_id).collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Ids of the groups referenced by `posts`, without repeats.
pub fn group_ids(posts: &[Post]) -> Vec<i32> {
    let mut ids: Vec<i32> = posts.iter().filter_map(|p| p.group_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
