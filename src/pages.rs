//! The server-rendered pages of the site, one module per Django-style "app".

pub mod about;
pub mod admin;
pub mod posts;
pub mod users;

use crate::auth;
use crate::cache::PageCache;
use crate::datastore::{structs::User, SessionStore};
use crate::metrics;
use crate::twoface::{externalerror::Cause, Describe, ExternalError, Fallible, TfError};
use actix_web::{http::header, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tera::Context;

/// Runtime knobs the page handlers need.
#[derive(Clone, Debug)]
pub struct Settings {
    pub page_size: i64,
    pub session_ttl_hours: i64,
    pub media_root: String,
    pub max_body_size: usize,
}

/// Everything the page handlers share: the datastore, the rendered-page
/// cache and the runtime settings.
pub struct State<DS> {
    pub ds: Arc<DS>,
    pub cache: PageCache,
    pub settings: Settings,
}

// Derived Clone would demand DS: Clone, but the Arc makes that unnecessary.
impl<DS> Clone for State<DS> {
    fn clone(&self) -> Self {
        Self {
            ds: Arc::clone(&self.ds),
            cache: self.cache.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// The `?page=` part of listing URLs. Kept as a raw string because the
/// paginator is lenient about junk values.
#[derive(Deserialize, Default, Clone, Debug)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// The template context every page starts from: who is looking at it.
pub async fn base_context<DS: SessionStore>(
    state: &State<DS>,
    req: &HttpRequest,
) -> Fallible<(Option<User>, Context)> {
    let viewer = auth::visitor(state.ds.as_ref(), req).await?;
    let mut context = Context::new();
    context.insert("viewer", &viewer);
    Ok((viewer, context))
}

/// A redirect to another page on the site.
pub fn redirect(to: &str) -> HttpResponse {
    HttpResponse::Found()
        .header(header::LOCATION, to)
        .finish()
}

/// A 404 whose internal error records what was being looked up.
pub fn not_found(what: &'static str) -> TfError {
    anyhow::anyhow!("lookup failed: {}", what).describe(ExternalError {
        cause: Cause::NotFound,
        text: what,
    })
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
