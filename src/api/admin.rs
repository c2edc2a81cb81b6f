//! Endpoints for operators. Served on a separate listener that should only be reachable from a
//! trusted network; there is no authentication here.
use crate::api::{observe, State};
use crate::datastore::{
    structs::{Group, NewGroup, Post},
    Datastore,
};
use crate::twoface::{Cause, Describe, ExternalError, Fallible};
use actix_web::{web, HttpResponse};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

pub fn configure<DS: Datastore>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/cache/clear").route(web::post().to(clear_cache::<DS>)))
        .service(web::resource("/groups").route(web::post().to(new_group::<DS>)))
        .service(web::resource("/posts").route(web::get().to(list_all_posts::<DS>)));
}

async fn clear_cache<DS: Datastore>(state: web::Data<State<DS>>) -> HttpResponse {
    let entries = state.cache.len();
    state.cache.clear();
    info!(entries, "cleared page cache");
    HttpResponse::NoContent().finish()
}

fn invalid(text: &'static str, detail: String) -> crate::twoface::TfError {
    anyhow!(detail).describe(ExternalError {
        cause: Cause::UserInvalidField,
        text,
    })
}

fn validate_group(group: &NewGroup) -> Fallible<()> {
    let title = group.title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(invalid(
            "title must be between 1 and 200 characters",
            format!("bad group title {:?}", group.title),
        ));
    }
    let slug_ok = !group.slug.is_empty()
        && group.slug.len() <= 30
        && group
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !slug_ok {
        return Err(invalid(
            "slug must be 1 to 30 letters, digits, hyphens or underscores",
            format!("bad group slug {:?}", group.slug),
        ));
    }
    Ok(())
}

async fn new_group<DS: Datastore>(
    state: web::Data<State<DS>>,
    body: web::Json<NewGroup>,
) -> Fallible<web::Json<Group>> {
    observe("admin_new_group", || async {
        validate_group(&body)?;
        let group = state.ds.new_group(body.into_inner()).await?;
        info!(slug = %group.slug, id = group.id, "created group");
        Ok(web::Json(group))
    })
    .await
}

/// Filters operators can pass when listing posts.
#[derive(Default, Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct AdminPostQuery {
    pub id: Option<i32>,
    pub group_id: Option<i32>,
    pub author_id: Option<Uuid>,
    pub text_contains: Option<String>,
    pub limit: Option<i64>,
}

impl AdminPostQuery {
    pub fn into_datastore_filters(self) -> crate::datastore::postfilters::PostFilters {
        crate::datastore::postfilters::PostFilters {
            id: self.id,
            group_id: self.group_id,
            author_id: self.author_id,
            text_contains: self.text_contains,
            ..Default::default()
        }
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(1).min(MAX_LIMIT)
    }
}

async fn list_all_posts<DS: Datastore>(
    state: web::Data<State<DS>>,
    query: web::Query<AdminPostQuery>,
) -> Fallible<web::Json<Vec<Post>>> {
    observe("admin_list_posts", || async {
        let query = query.into_inner();
        let limit = query.limit();
        let views = state
            .ds
            .list_posts(query.into_datastore_filters(), limit, 0)
            .await?;
        Ok(web::Json(views.into_iter().map(|v| v.post).collect()))
    })
    .await
}
