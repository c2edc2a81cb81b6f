//! The post listings the site shows, built on the datastore. Every listing is newest first and
//! loads each post's author and group up front; post detail also loads each comment's author.
use crate::datastore::{
    postfilters::PostFilters,
    structs::{CommentView, Follow, Group, PostView, User},
    Datastore,
};
use crate::pagination::{Page, Paginator};
use crate::twoface::{Fallible, OrNotFound};
use serde::Serialize;
use uuid::Uuid;

/// A page of posts with nothing else attached.
#[derive(Serialize, Debug, Clone)]
pub struct Listing {
    pub page: Page<PostView>,
}

#[derive(Serialize, Debug, Clone)]
pub struct GroupListing {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ProfileListing {
    pub author: User,
    pub page: Page<PostView>,
    /// Does the viewer follow this author?
    pub following: bool,
    /// Is the viewer this author?
    pub is_self: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    /// Is the viewer the post's author? Decides whether the edit link is shown.
    pub is_author: bool,
    /// Whether to show the comment form.
    pub can_comment: bool,
}

async fn paginated<DS: Datastore>(
    ds: &DS,
    paginator: &Paginator,
    filters: PostFilters,
    page: Option<&str>,
) -> Fallible<Page<PostView>> {
    let count = ds.count_posts(filters.clone()).await?;
    let window = paginator.window(count as usize, page);
    let items = ds
        .list_posts(filters, paginator.per_page() as i64, window.offset as i64)
        .await?;
    Ok(Page::new(items, window))
}

/// Every post.
pub async fn index<DS: Datastore>(
    ds: &DS,
    paginator: &Paginator,
    page: Option<&str>,
) -> Fallible<Listing> {
    let page = paginated(ds, paginator, PostFilters::default(), page).await?;
    Ok(Listing { page })
}

/// Posts filed under the group with this slug.
pub async fn group<DS: Datastore>(
    ds: &DS,
    paginator: &Paginator,
    slug: &str,
    page: Option<&str>,
) -> Fallible<GroupListing> {
    let group = ds
        .find_group_by_slug(slug)
        .await?
        .or_not_found("Group not found")?;
    let page = paginated(ds, paginator, PostFilters::group(group.id), page).await?;
    Ok(GroupListing { group, page })
}

/// Posts written by the user with this username.
pub async fn profile<DS: Datastore>(
    ds: &DS,
    paginator: &Paginator,
    username: &str,
    page: Option<&str>,
    viewer: Option<Uuid>,
) -> Fallible<ProfileListing> {
    let author = ds
        .find_user_by_name(username)
        .await?
        .or_not_found("User not found")?;
    let page = paginated(ds, paginator, PostFilters::author(author.id), page).await?;
    let is_self = viewer == Some(author.id);
    let following = match viewer {
        Some(user_id) if !is_self => {
            ds.is_following(Follow {
                user_id,
                author_id: author.id,
            })
            .await?
        }
        _ => false,
    };
    Ok(ProfileListing {
        author,
        page,
        following,
        is_self,
    })
}

/// Posts by every author `user_id` follows.
pub async fn follow_feed<DS: Datastore>(
    ds: &DS,
    paginator: &Paginator,
    user_id: Uuid,
    page: Option<&str>,
) -> Fallible<Listing> {
    let page = paginated(ds, paginator, PostFilters::followed_by(user_id), page).await?;
    Ok(Listing { page })
}

/// One post and its comments.
pub async fn post_detail<DS: Datastore>(
    ds: &DS,
    id: i32,
    viewer: Option<Uuid>,
) -> Fallible<PostDetail> {
    let post = ds.find_post(id).await?.or_not_found("Post not found")?;
    let comments = ds.list_comments(id).await?;
    let is_author = viewer.map_or(false, |v| post.post.is_by(v));
    Ok(PostDetail {
        post,
        comments,
        is_author,
        can_comment: viewer.is_some(),
    })
}
