mod auth;
mod cache;
mod config;
mod datastore;
mod forms;
mod media;
mod metrics;
mod pages;
mod paginator;
mod templates;
mod twoface;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate guard;
#[macro_use]
extern crate diesel;

use crate::cache::PageCache;
use crate::config::Config;
use crate::datastore::postgres::PostgresStore;
use actix_service::Service;
use actix_web::{dev::ServiceResponse, middleware, web, App, HttpServer};
use datastore::postgres;
use futures::future::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

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

    info!("starting yatube");

    let sys = actix_rt::System::new("yatube");

    // Build the postgres client
    let db = PostgresStore::new(
        postgres::Dsn::new(&config),
        config.db_pool_size,
        Duration::from_secs(config.db_connection_timeout),
    )
    .expect("couldn't connect to Postgres");
    prometheus::register(Box::new(db.clone())).expect("couldn't register DB metrics");

    std::fs::create_dir_all(&config.media_root).expect("couldn't create the media directory");

    // Build the shared page state
    let state = pages::State {
        ds: Arc::new(db),
        cache: PageCache::new(Duration::from_secs(config.cache_ttl_secs)),
        settings: pages::Settings {
            page_size: config.page_size,
            session_ttl_hours: config.session_ttl_hours,
            media_root: config.media_root.clone(),
            max_body_size: config.max_body_size,
        },
    };
    let media_root = media::MediaRoot(config.media_root.clone());

    // Start the site server
    info!(
        addr = &config.userfacing_listen_address[..],
        "starting site server"
    );
    let max_body_size = config.max_body_size;
    HttpServer::new(move || {
        App::new()
            // Middleware for Prometheus
            .wrap_fn(|request, srv| srv.call(request).map(increment_response_metrics))
            .data(state.clone())
            .data(media_root.clone())
            // enable logger
            .wrap(middleware::Logger::default())
            // limit size of the payload (global configuration)
            .data(web::JsonConfig::default().limit(max_body_size))
            .service(web::scope("/auth").configure(pages::users::configure::<PostgresStore>))
            .service(web::scope("/about").configure(pages::about::configure::<PostgresStore>))
            .service(web::scope("/admin").configure(pages::admin::configure::<PostgresStore>))
            .service(web::resource("/media/{path:.*}").route(web::get().to(media::serve)))
            .configure(pages::posts::configure::<PostgresStore>)
    })
    .bind(config.userfacing_listen_address.clone())
    .expect("couldn't start site server")
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
