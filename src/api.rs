use crate::cache::PageCache;
use crate::datastore::Datastore;
use crate::images::ImageStore;
use crate::metrics;
use crate::pagination::Paginator;
use crate::render::{Renderer, View};
use crate::twoface::{Fallible, TfError};
use actix_web::{http::header, web, HttpResponse};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod admin;
pub mod follow;
pub mod pages;
pub mod posts;

/// Everything the handlers share.
pub struct State<DS> {
    pub ds: Arc<DS>,
    pub cache: PageCache,
    /// How long a cached index page is served for.
    pub cache_ttl: Duration,
    pub renderer: Arc<dyn Renderer>,
    pub images: Arc<dyn ImageStore>,
    /// Largest image a post form may carry.
    pub max_upload_size: usize,
    pub paginator: Paginator,
}

impl<DS> Clone for State<DS> {
    fn clone(&self) -> Self {
        Self {
            ds: Arc::clone(&self.ds),
            cache: self.cache.clone(),
            cache_ttl: self.cache_ttl,
            renderer: Arc::clone(&self.renderer),
            images: Arc::clone(&self.images),
            max_upload_size: self.max_upload_size,
            paginator: self.paginator,
        }
    }
}

/// Routes of the public site.
pub fn configure<DS: Datastore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/", web::get().to(pages::index::<DS>))
            .route("/group/{slug}/", web::get().to(pages::group::<DS>))
            .route("/follow/", web::get().to(pages::follow_index::<DS>))
            .route("/profile/{username}/", web::get().to(pages::profile::<DS>))
            .service(
                web::resource("/profile/{username}/follow/")
                    .route(web::get().to(follow::follow::<DS>))
                    .route(web::post().to(follow::follow::<DS>)),
            )
            .service(
                web::resource("/profile/{username}/unfollow/")
                    .route(web::get().to(follow::unfollow::<DS>))
                    .route(web::post().to(follow::unfollow::<DS>)),
            )
            .route("/posts/{id}/", web::get().to(pages::post_detail::<DS>))
            .service(
                web::resource("/create/")
                    .route(web::get().to(posts::create_form::<DS>))
                    .route(web::post().to(posts::create_post::<DS>)),
            )
            .service(
                web::resource("/posts/{id}/edit/")
                    .route(web::get().to(posts::edit_form::<DS>))
                    .route(web::post().to(posts::edit_post::<DS>)),
            )
            .service(
                web::resource("/posts/{id}/comment/")
                    .route(web::get().to(posts::comment_redirect))
                    .route(web::post().to(posts::add_comment::<DS>)),
            )
            .default_service(web::route().to(not_found)),
    );
}

async fn not_found() -> Fallible<HttpResponse> {
    Err(TfError::not_found("Page not found"))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .header(header::LOCATION, location)
        .finish()
}

pub fn html<B: Into<actix_web::dev::Body>>(body: B) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Render `view` into a 200 response.
fn render<DS>(state: &State<DS>, view: &View) -> Fallible<HttpResponse> {
    Ok(html(state.renderer.render(view)?))
}

/// Execute the closure, then log its operational metrics, e.g. time taken, whether it returned Ok/Err, etc.
async fn observe<F, Fut, R>(name: &'static str, f: F) -> Fallible<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Fallible<R>>,
{
    let start = Instant::now();
    let return_val = f().await;
    let duration = start.elapsed();
    metrics::HANDLER_SECS
        .with_label_values(&[name])
        .observe(duration.as_secs_f64());
    metrics::RESPONSES
        .with_label_values(&[name, variant_name(&return_val)])
        .inc();
    return_val
}

fn variant_name<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "err"
    }
}
