//! The static about pages.

use crate::datastore::Client;
use crate::pages::{base_context, observe, State};
use crate::templates;
use crate::twoface::Fallible;
use actix_web::{web, HttpRequest, HttpResponse};

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/author/").route(web::get().to(author::<DS>)))
        .service(web::resource("/tech/").route(web::get().to(tech::<DS>)));
}

async fn author<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("about_author", || async {
        let (_viewer, context) = base_context(&state, &req).await?;
        templates::render("about/author.html", &context).map(templates::html)
    })
    .await
}

async fn tech<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("about_tech", || async {
        let (_viewer, context) = base_context(&state, &req).await?;
        templates::render("about/tech.html", &context).map(templates::html)
    })
    .await
}
