//! Tera templates, compiled once at startup.

use crate::twoface::{externalerror::Cause, Describe, ExternalError, Fallible};
use actix_web::HttpResponse;
use tera::{Context, Tera};

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let glob = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html");
        match Tera::new(glob) {
            Ok(templates) => templates,
            Err(e) => panic!("couldn't compile templates: {}", e),
        }
    };
}

/// Render the named template into an HTML string.
pub fn render(name: &str, context: &Context) -> Fallible<String> {
    TEMPLATES.render(name, context).map_err(|e| {
        e.describe(ExternalError {
            cause: Cause::ServerError,
            text: "Couldn't render this page",
        })
    })
}

/// Wrap a rendered body in a 200 HTML response.
pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}
