mod api;
mod auth;
mod cache;
mod config;
mod datastore;
mod feed;
mod follows;
mod forms;
mod images;
mod metrics;
mod pagination;
mod render;
mod twoface;
mod urls;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate guard;
#[macro_use]
extern crate diesel;

use crate::auth::Sessions;
use crate::cache::PageCache;
use crate::config::Config;
use crate::datastore::postgres::PostgresStore;
use crate::images::{FsImageStore, ImageStore};
use crate::pagination::Paginator;
use crate::render::HtmlRenderer;
use actix_service::Service;
use actix_web::{dev::ServiceResponse, middleware, web, App, HttpServer};
use datastore::postgres;
use futures::future::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[allow(clippy::cognitive_complexity)]
fn main() {
    let args: Vec<_> = std::env::args().collect();
    guard!(let [_, config_file_path, ..] = &args[..] else {
        eprintln!("First argument should be path to config file");
        return
    });

    let config = Config::from_file(config_file_path);

    // Set up logger output
    let subscriber_builder = tracing_subscriber::fmt().with_max_level(Level::DEBUG);
    if config.human_logs {
        subscriber_builder.init();
    } else {
        subscriber_builder.json().init();
    }

    info!("starting inkwell");

    let sys = actix_rt::System::new("inkwell");

    // Build the postgres client
    let db = PostgresStore::new(
        postgres::Dsn::new(&config),
        config.db_pool_size,
        Duration::from_secs(config.db_connection_timeout),
    )
    .expect("couldn't connect to Postgres");
    prometheus::register(Box::new(db.clone())).expect("couldn't register DB metrics");

    // Build the app state shared by the site and admin servers
    let images: Arc<dyn ImageStore> =
        Arc::new(FsImageStore::new(&config.media_root, &config.media_url));
    let cache_ttl = Duration::from_secs(config.index_cache_secs);
    let state = api::State {
        ds: Arc::new(db),
        cache: PageCache::new(config.index_cache_capacity, cache_ttl),
        cache_ttl,
        renderer: Arc::new(HtmlRenderer::new(Arc::clone(&images))),
        images,
        max_upload_size: config.max_body_size,
        paginator: Paginator::default(),
    };
    let sessions = Sessions::new(config.session_secret.clone(), config.login_url.clone());

    // Start the site server
    info!(
        addr = &config.listen_address[..],
        "starting site server"
    );
    let max_body_size = config.max_body_size;
    let site_state = state.clone();
    HttpServer::new(move || {
        App::new()
            // Middleware for Prometheus
            .wrap_fn(|request, srv| srv.call(request).map(increment_response_metrics))
            .data(site_state.clone())
            .data(sessions.clone())
            // enable logger
            .wrap(middleware::Logger::default())
            // limit size of the payload (global configuration)
            .app_data(web::FormConfig::default().limit(max_body_size))
            .configure(api::configure::<PostgresStore>)
    })
    .bind(config.listen_address.clone())
    .expect("couldn't start site HTTP server")
    .run();

    // Start the admin server
    info!(
        addr = &config.admin_listen_address[..],
        "starting admin server"
    );
    HttpServer::new(move || {
        App::new()
            .wrap_fn(|request, srv| srv.call(request).map(increment_response_metrics))
            .data(state.clone())
            .wrap(middleware::Logger::default())
            .app_data(web::JsonConfig::default().limit(max_body_size))
            .service(web::scope("/admin").configure(api::admin::configure::<PostgresStore>))
    })
    .bind(config.admin_listen_address.clone())
    .expect("couldn't start admin HTTP server")
    .run();

    // Start the metrics server
    info!(
        addr = &config.metrics_address[..],
        "starting metrics server"
    );
    HttpServer::new(|| {
        App::new().service(
            web::scope("/metrics")
                .service(web::resource("/").route(web::get().to(metrics::endpoint::gather)))
                .service(web::resource("").route(web::get().to(metrics::endpoint::gather))),
        )
    })
    .bind(config.metrics_address)
    .expect("couldn't start metrics server")
    .run();

    sys.run().expect("actix runtime terminated");
}

/// If response is OK, increment the metrics for HTTP statuses.
fn increment_response_metrics<E, B>(
    response: Result<ServiceResponse<B>, E>,
) -> Result<ServiceResponse<B>, E> {
    match response {
        Ok(response) => {
            metrics::HTTP_RESPONSES
                .with_label_values(&[response.status().as_str()])
                .inc();
            Ok(response)
        }
        other => other,
    }
}
