//! The read-only pages: listings and post detail.
use crate::api::{html, observe, render, State};
use crate::auth::{LoggedIn, Viewer};
use crate::datastore::Datastore;
use crate::feed;
use crate::metrics;
use crate::pagination::{requested_number, PageQuery};
use crate::render::View;
use crate::twoface::Fallible;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use tracing::debug;

/// Cache entries are per page of the listing. Other query parameters don't select a different
/// page, so they don't get an entry of their own.
fn cache_key(req: &HttpRequest, page: usize) -> String {
    format!("{}?page={}", req.path(), page)
}

fn requested_page(req: &HttpRequest) -> PageQuery {
    PageQuery::from_query_string(req.query_string())
}

pub async fn index<DS: Datastore>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("index", || async {
        let query = requested_page(&req);
        let key = cache_key(&req, requested_number(query.page.as_deref()));
        if let Some(body) = state.cache.get(&key) {
            metrics::PAGE_CACHE.with_label_values(&["hit"]).inc();
            debug!(key = %key, "page cache hit");
            return Ok(html(body));
        }
        metrics::PAGE_CACHE.with_label_values(&["miss"]).inc();
        debug!(key = %key, "page cache miss");

        let listing = feed::index(&*state.ds, &state.paginator, query.page.as_deref()).await?;
        // Keyed by the page actually shown; out-of-range requests never add entries.
        let key = cache_key(&req, listing.page.number);
        let body = Bytes::from(state.renderer.render(&View::Index(listing))?);
        state.cache.set(&key, body.clone(), state.cache_ttl);
        Ok(html(body))
    })
    .await
}

pub async fn group<DS: Datastore>(
    state: web::Data<State<DS>>,
    slug: web::Path<String>,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("group", || async {
        let query = requested_page(&req);
        let listing =
            feed::group(&*state.ds, &state.paginator, &slug, query.page.as_deref()).await?;
        render(state.get_ref(), &View::Group(listing))
    })
    .await
}

pub async fn profile<DS: Datastore>(
    state: web::Data<State<DS>>,
    username: web::Path<String>,
    viewer: Viewer,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("profile", || async {
        let query = requested_page(&req);
        let listing = feed::profile(
            &*state.ds,
            &state.paginator,
            &username,
            query.page.as_deref(),
            viewer.id(),
        )
        .await?;
        render(state.get_ref(), &View::Profile(listing))
    })
    .await
}

pub async fn post_detail<DS: Datastore>(
    state: web::Data<State<DS>>,
    id: web::Path<i32>,
    viewer: Viewer,
) -> Fallible<HttpResponse> {
    observe("post_detail", || async {
        let detail = feed::post_detail(&*state.ds, *id, viewer.id()).await?;
        render(state.get_ref(), &View::PostDetail(detail))
    })
    .await
}

pub async fn follow_index<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: LoggedIn,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("follow_index", || async {
        let query = requested_page(&req);
        let listing = feed::follow_feed(
            &*state.ds,
            &state.paginator,
            user.0.id,
            query.page.as_deref(),
        )
        .await?;
        render(state.get_ref(), &View::Follow(listing))
    })
    .await
}
