use crate::datastore::{
    postfilters::PostFilters,
    postgres::PostgresStore,
    structs::{
        author_ids, group_ids, Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost,
        Post, PostChanges, PostView, User,
    },
    tables::{comments, follows, groups, posts, users},
    Datastore,
};
use crate::twoface::{Cause, Describe, ExternalError, Fallible, TfError};
use async_trait::async_trait;
use diesel::{
    dsl::exists,
    expression::BoxableExpression,
    pg::{Pg, PgConnection},
    query_dsl::{QueryDsl, RunQueryDsl},
    result::{DatabaseErrorKind, Error as DieselError, QueryResult},
    sql_types::Bool,
    ExpressionMethods, NullableExpressionMethods, OptionalExtension, TextExpressionMethods,
};
use uuid::Uuid;

#[async_trait]
impl Datastore for PostgresStore {
    async fn find_user_by_name(&self, username: &str) -> Fallible<Option<User>> {
        let username = username.to_owned();
        self.with_conn(move |conn| {
            users::table
                .filter(users::username.eq(username))
                .first::<User>(conn)
                .optional()
        })
        .await
    }

    async fn find_group_by_slug(&self, slug: &str) -> Fallible<Option<Group>> {
        let slug = slug.to_owned();
        self.with_conn(move |conn| {
            groups::table
                .filter(groups::slug.eq(slug))
                .first::<Group>(conn)
                .optional()
        })
        .await
    }

    async fn list_groups(&self) -> Fallible<Vec<Group>> {
        self.with_conn(|conn| groups::table.order(groups::title).load::<Group>(conn))
            .await
    }

    async fn new_group(&self, new_group: NewGroup) -> Fallible<Group> {
        self.with_conn(move |conn| {
            diesel::insert_into(groups::table)
                .values(&new_group)
                .get_result::<Group>(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        e.describe(ExternalError {
                            cause: Cause::UserConflict,
                            text: "A group with this slug already exists",
                        })
                    }
                    e => TfError::from(e),
                })
        })
        .await
    }

    async fn count_posts(&self, filters: PostFilters) -> Fallible<i64> {
        self.with_conn(move |conn| {
            let mut query = posts::table.into_boxed();
            for filter in filters.as_sql_where() {
                query = query.filter(filter);
            }
            query.count().get_result::<i64>(conn)
        })
        .await
    }

    async fn list_posts(
        &self,
        filters: PostFilters,
        limit: i64,
        offset: i64,
    ) -> Fallible<Vec<PostView>> {
        self.with_conn(move |conn| {
            let mut query = posts::table.into_boxed();
            for filter in filters.as_sql_where() {
                query = query.filter(filter);
            }
            let page: Vec<Post> = query
                .order((posts::created_at.desc(), posts::id.desc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;
            with_author_and_group(conn, page)
        })
        .await
    }

    async fn find_post(&self, id: i32) -> Fallible<Option<PostView>> {
        self.with_conn(move |conn| {
            let post: Option<Post> = posts::table.find(id).first(conn).optional()?;

            guard!(let Some(post) = post else {
                return Ok(None);
            });

            Ok::<_, DieselError>(with_author_and_group(conn, vec![post])?.pop())
        })
        .await
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        self.with_conn(move |conn| {
            diesel::insert_into(posts::table)
                .values(&new_post)
                .get_result::<Post>(conn)
        })
        .await
    }

    async fn update_post(&self, id: i32, changes: PostChanges) -> Fallible<Option<Post>> {
        self.with_conn(move |conn| {
            let target = posts::table.find(id);
            let text = posts::text.eq(changes.text);
            let group = posts::group_id.eq(changes.group_id);
            match changes.image {
                Some(image) => diesel::update(target)
                    .set((text, group, posts::image.eq(Some(image))))
                    .get_result::<Post>(conn)
                    .optional(),
                None => diesel::update(target)
                    .set((text, group))
                    .get_result::<Post>(conn)
                    .optional(),
            }
        })
        .await
    }

    async fn list_comments(&self, post_id: i32) -> Fallible<Vec<CommentView>> {
        self.with_conn(move |conn| {
            let comments: Vec<Comment> = comments::table
                .filter(comments::post_id.eq(post_id))
                .order((comments::created_at.desc(), comments::id.desc()))
                .load(conn)?;
            let mut ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
            ids.sort();
            ids.dedup();
            let authors: Vec<User> = users::table.filter(users::id.eq_any(ids)).load(conn)?;
            Ok::<_, DieselError>(CommentView::assemble(comments, authors))
        })
        .await
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        self.with_conn(move |conn| {
            diesel::insert_into(comments::table)
                .values(&new_comment)
                .get_result::<Comment>(conn)
        })
        .await
    }

    async fn follow(&self, follow: Follow) -> Fallible<bool> {
        // The primary key makes concurrent identical follows collapse into one row.
        self.with_conn(move |conn| {
            let inserted = diesel::insert_into(follows::table)
                .values(&follow)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok::<_, DieselError>(inserted > 0)
        })
        .await
    }

    async fn unfollow(&self, follow: Follow) -> Fallible<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                follows::table
                    .filter(follows::user_id.eq(follow.user_id))
                    .filter(follows::author_id.eq(follow.author_id)),
            )
            .execute(conn)?;
            Ok::<_, DieselError>(deleted > 0)
        })
        .await
    }

    async fn is_following(&self, follow: Follow) -> Fallible<bool> {
        self.with_conn(move |conn| {
            diesel::select(exists(
                follows::table.find((follow.user_id, follow.author_id)),
            ))
            .get_result::<bool>(conn)
        })
        .await
    }
}

/// Load the authors and groups of a page of posts with one query each.
fn with_author_and_group(conn: &PgConnection, page: Vec<Post>) -> QueryResult<Vec<PostView>> {
    let authors: Vec<User> = users::table
        .filter(users::id.eq_any(author_ids(&page)))
        .load(conn)?;
    let groups: Vec<Group> = groups::table
        .filter(groups::id.eq_any(group_ids(&page)))
        .load(conn)?;
    Ok(PostView::assemble(page, authors, groups))
}

impl PostFilters {
    pub fn as_sql_where(
        &self,
    ) -> Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> {
        let mut wheres: Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> =
            Vec::new();
        if let Some(id) = self.id {
            wheres.push(Box::new(posts::id.eq(id)))
        }
        if let Some(group_id) = self.group_id {
            wheres.push(Box::new(posts::group_id.eq(group_id)))
        }
        if let Some(author_id) = self.author_id {
            wheres.push(Box::new(posts::author_id.eq(author_id)))
        }
        if let Some(user_id) = self.followed_by {
            let followed = follows::table
                .filter(follows::user_id.eq(user_id))
                .select(follows::author_id.nullable());
            wheres.push(Box::new(posts::author_id.eq_any(followed)))
        }
        if let Some(substring) = &self.text_contains {
            wheres.push(Box::new(posts::text.like(format!("%{}%", substring))))
        }
        wheres
    }
}
