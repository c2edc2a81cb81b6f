use crate::datastore::{
    postfilters::PostFilters,
    structs::{
        author_ids, group_ids, Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost,
        Post, PostChanges, PostView, User,
    },
};
use crate::twoface::{Cause, ExternalError, Fallible, TfError};
use async_trait::async_trait;
use chrono::{offset::Utc, DateTime, Duration};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default, Debug)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    next_id: i32,
    /// Every insert is one tick later than the previous one, so ordering by time is stable.
    ticks: i64,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::<Utc>::from(std::time::UNIX_EPOCH) + Duration::seconds(1_600_000_000 + self.ticks)
    }

    fn users_by_id(&self, ids: &[Uuid]) -> Vec<User> {
        self.users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect()
    }

    fn with_author_and_group(&self, posts: Vec<Post>) -> Vec<PostView> {
        let authors = self.users_by_id(&author_ids(&posts));
        let wanted = group_ids(&posts);
        let groups = self
            .groups
            .iter()
            .filter(|g| wanted.contains(&g.id))
            .cloned()
            .collect();
        PostView::assemble(posts, authors, groups)
    }

    /// Matching posts, newest first.
    fn matching(&self, filters: &PostFilters) -> Vec<Post> {
        let followed: Option<Vec<Uuid>> = filters.followed_by.map(|user_id| {
            self.follows
                .iter()
                .filter(|f| f.user_id == user_id)
                .map(|f| f.author_id)
                .collect()
        });
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| post_matches(p, filters))
            .filter(|p| match (&followed, p.author_id) {
                (None, _) => true,
                (Some(authors), Some(author_id)) => authors.contains(&author_id),
                (Some(_), None) => false,
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        posts
    }
}

/// Does `post` match all specified filters? `followed_by` is not a property of the post and is
/// ignored here.
fn post_matches(post: &Post, filters: &PostFilters) -> bool {
    if let Some(id) = filters.id {
        if id != post.id {
            return false;
        }
    }
    if let Some(group_id) = filters.group_id {
        if Some(group_id) != post.group_id {
            return false;
        }
    }
    if let Some(author_id) = filters.author_id {
        if Some(author_id) != post.author_id {
            return false;
        }
    }
    if let Some(substring) = &filters.text_contains {
        if !post.text.contains(substring) {
            return false;
        }
    }
    true
}

/// A mock implementation of datastore::Datastore
#[derive(Clone, Default, Debug)]
pub struct Client {
    tables: Arc<Mutex<Tables>>,
}

impl Client {
    /// Stand-in for the identity service creating an account.
    pub fn add_user(&self, username: &str) -> User {
        let mut tables = self.tables.lock().unwrap();
        let user = User {
            id: Uuid::new_v4(),
            created_at: tables.now(),
            username: username.to_owned(),
        };
        tables.users.push(user.clone());
        user
    }

    pub fn add_group(&self, title: &str, slug: &str) -> Group {
        let mut tables = self.tables.lock().unwrap();
        let group = Group {
            id: tables.next_id(),
            title: title.to_owned(),
            slug: slug.to_owned(),
            description: format!("All about {}", title),
        };
        tables.groups.push(group.clone());
        group
    }

    pub fn add_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let mut tables = self.tables.lock().unwrap();
        let post = Post {
            id: tables.next_id(),
            created_at: tables.now(),
            text: text.to_owned(),
            group_id: group.map(|g| g.id),
            author_id: Some(author.id),
            image: None,
        };
        tables.posts.push(post.clone());
        post
    }

    /// Deletes a post and, like the foreign key, its comments.
    pub fn delete_post(&self, id: i32) {
        let mut tables = self.tables.lock().unwrap();
        tables.posts.retain(|p| p.id != id);
        tables.comments.retain(|c| c.post_id != id);
    }

    pub fn posts(&self) -> Vec<Post> {
        self.tables.lock().unwrap().posts.clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.tables.lock().unwrap().comments.clone()
    }

    pub fn follows(&self) -> Vec<Follow> {
        self.tables.lock().unwrap().follows.clone()
    }
}

#[async_trait]
impl super::Datastore for Client {
    async fn find_user_by_name(&self, username: &str) -> Fallible<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Fallible<Option<Group>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Fallible<Vec<Group>> {
        let mut groups = self.tables.lock().unwrap().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn new_group(&self, new_group: NewGroup) -> Fallible<Group> {
        let mut tables = self.tables.lock().unwrap();
        if tables.groups.iter().any(|g| g.slug == new_group.slug) {
            return Err(TfError {
                internal: anyhow::anyhow!("duplicate slug {}", new_group.slug),
                external: ExternalError {
                    cause: Cause::UserConflict,
                    text: "A group with this slug already exists",
                },
            });
        }
        let group = Group {
            id: tables.next_id(),
            title: new_group.title,
            slug: new_group.slug,
            description: new_group.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn count_posts(&self, filters: PostFilters) -> Fallible<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.matching(&filters).len() as i64)
    }

    async fn list_posts(
        &self,
        filters: PostFilters,
        limit: i64,
        offset: i64,
    ) -> Fallible<Vec<PostView>> {
        let tables = self.tables.lock().unwrap();
        let page = tables
            .matching(&filters)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(tables.with_author_and_group(page))
    }

    async fn find_post(&self, id: i32) -> Fallible<Option<PostView>> {
        let tables = self.tables.lock().unwrap();
        let post = tables.posts.iter().find(|p| p.id == id).cloned();

        guard!(let Some(post) = post else {
            return Ok(None)
        });

        Ok(tables.with_author_and_group(vec![post]).pop())
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let mut tables = self.tables.lock().unwrap();
        let post = Post {
            id: tables.next_id(),
            created_at: tables.now(),
            text: new_post.text,
            group_id: new_post.group_id,
            author_id: new_post.author_id,
            image: new_post.image,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i32, changes: PostChanges) -> Fallible<Option<Post>> {
        let mut tables = self.tables.lock().unwrap();
        let post = tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.text = changes.text;
            post.group_id = changes.group_id;
            if changes.image.is_some() {
                post.image = changes.image;
            }
            post.clone()
        });
        Ok(post)
    }

    async fn list_comments(&self, post_id: i32) -> Fallible<Vec<CommentView>> {
        let tables = self.tables.lock().unwrap();
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
        let authors = tables.users_by_id(&ids);
        Ok(CommentView::assemble(comments, authors))
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let mut tables = self.tables.lock().unwrap();
        let comment = Comment {
            id: tables.next_id(),
            created_at: tables.now(),
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            text: new_comment.text,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn follow(&self, follow: Follow) -> Fallible<bool> {
        let mut tables = self.tables.lock().unwrap();
        // Mirrors the table's CHECK and primary key constraints.
        if follow.user_id == follow.author_id {
            return Err(anyhow::anyhow!("follows_no_self_follow violated").into());
        }
        if tables.follows.contains(&follow) {
            return Ok(false);
        }
        tables.follows.push(follow);
        Ok(true)
    }

    async fn unfollow(&self, follow: Follow) -> Fallible<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.follows.len();
        tables.follows.retain(|f| f != &follow);
        Ok(tables.follows.len() < before)
    }

    async fn is_following(&self, follow: Follow) -> Fallible<bool> {
        Ok(self.tables.lock().unwrap().follows.contains(&follow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_matches() {
        let ds = Client::default();
        let alice = ds.add_user("alice");
        let news = ds.add_group("News", "news");
        let p = ds.add_post(&alice, "post number 7", Some(&news));

        assert!(post_matches(&p, &PostFilters::default()));
        assert!(post_matches(&p, &PostFilters::author(alice.id)));
        assert!(post_matches(&p, &PostFilters::group(news.id)));
        assert!(post_matches(
            &p,
            &PostFilters {
                text_contains: Some("number 7".to_owned()),
                ..Default::default()
            }
        ));

        assert!(!post_matches(&p, &PostFilters::author(Uuid::new_v4())));
        assert!(!post_matches(&p, &PostFilters::group(news.id + 1)));
        assert!(!post_matches(
            &p,
            &PostFilters {
                id: Some(p.id + 1),
                ..Default::default()
            }
        ));

        // Posts without a group never match a group filter.
        let ungrouped = ds.add_post(&alice, "loose", None);
        assert!(!post_matches(&ungrouped, &PostFilters::group(news.id)));
    }
}
