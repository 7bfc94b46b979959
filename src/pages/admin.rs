//! Operator endpoints. Unlike the rest of the site these speak JSON, and the
//! listener is expected to be firewalled off from the public internet.

use crate::datastore::{
    postfilters::{PostFilters, Slice},
    structs::{FeedEntry, Group, NewGroup},
    Client,
};
use crate::pages::{observe, State};
use crate::twoface::Fallible;
use actix_web::web;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/posts").route(web::get().to(list_all_posts::<DS>)))
        .service(web::resource("/groups").route(web::post().to(create_group::<DS>)));
}

// Admin endpoint
async fn list_all_posts<DS: Client>(
    state: web::Data<State<DS>>,
    filters: web::Query<PostFilters>,
    slice: web::Query<Slice>,
) -> Fallible<web::Json<Vec<FeedEntry>>> {
    observe("admin_list_posts", || async {
        let data = state.ds.list_posts(filters.0.clone(), slice.0).await?;
        Ok(web::Json(data))
    })
    .await
}

// Groups have no self-serve creation flow, an operator sets them up here.
async fn create_group<DS: Client>(
    state: web::Data<State<DS>>,
    body: web::Json<NewGroup>,
) -> Fallible<web::Json<Group>> {
    observe("admin_create_group", || async {
        let group = state
            .ds
            .new_group(NewGroup {
                title: body.title.clone(),
                slug: body.slug.clone(),
                description: body.description.clone(),
            })
            .await?;
        Ok(web::Json(group))
    })
    .await
}
