//! Feed, group, profile and post pages, plus the post and comment forms.

use crate::auth;
use crate::datastore::{
    postfilters::PostFilters,
    structs::{Group, NewComment, NewPost, PostChange, User},
    Client,
};
use crate::forms::CommentForm;
use crate::media;
use crate::pages::{base_context, not_found, observe, redirect, PageQuery, State};
use crate::templates;
use crate::twoface::Fallible;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use tera::Context;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index::<DS>)))
        .service(web::resource("/follow/").route(web::get().to(follow_index::<DS>)))
        .service(web::resource("/group/{slug}/").route(web::get().to(group_list::<DS>)))
        // Registered before /posts/{post_id}/ so "create" never parses as an id.
        .service(
            web::resource("/posts/create/")
                .route(web::get().to(post_create_form::<DS>))
                .route(web::post().to(post_create::<DS>)),
        )
        .service(web::resource("/posts/{post_id}/").route(web::get().to(post_detail::<DS>)))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(post_edit_form::<DS>))
                .route(web::post().to(post_edit::<DS>)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/").route(web::post().to(add_comment::<DS>)),
        )
        .service(web::resource("/profile/{username}/").route(web::get().to(profile::<DS>)))
        .service(
            web::resource("/profile/{username}/follow/")
                .route(web::get().to(profile_follow::<DS>)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .route(web::get().to(profile_unfollow::<DS>)),
        );
}

/// Count, page and fetch one page of a filtered listing.
async fn fetch_page<DS: Client>(
    state: &State<DS>,
    filters: PostFilters,
    query: &PageQuery,
    context: &mut Context,
) -> Fallible<i64> {
    let total = state.ds.count_posts(filters.clone()).await?;
    let pages = crate::paginator::Paginator::new(total, state.settings.page_size);
    let number = pages.get_page(query.page.as_deref());
    let entries = state.ds.list_posts(filters, pages.slice(number)).await?;
    context.insert("page", &pages.page_of(number, entries));
    Ok(total)
}

/// The home page: every post on the site, newest first. The rendered page is
/// cached for a short TTL, keyed by the query string, and the cache is
/// checked before anything else happens.
async fn index<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Fallible<HttpResponse> {
    observe("index", || async {
        let cache_key = req.query_string().to_owned();
        if let Some(body) = state.cache.get(&cache_key) {
            return Ok(templates::html(body));
        }

        let (_viewer, mut context) = base_context(&state, &req).await?;
        fetch_page(&state, PostFilters::default(), &query, &mut context).await?;
        let body = templates::render("posts/index.html", &context)?;
        state.cache.put(&cache_key, body.clone());
        Ok(templates::html(body))
    })
    .await
}

/// All posts in one group.
async fn group_list<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Fallible<HttpResponse> {
    observe("group_list", || async {
        let (_viewer, mut context) = base_context(&state, &req).await?;
        guard!(let Some(group) = state.ds.find_group(&slug).await? else {
            return Err(not_found("No such group"))
        });
        fetch_page(&state, PostFilters::by_group(group.id), &query, &mut context).await?;
        context.insert("group", &group);
        templates::render("posts/group_list.html", &context).map(templates::html)
    })
    .await
}

/// One author's page: their posts, post count and a follow button.
async fn profile<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Fallible<HttpResponse> {
    observe("profile", || async {
        let (viewer, mut context) = base_context(&state, &req).await?;
        guard!(let Some(author) = state.ds.find_user(&username).await? else {
            return Err(not_found("No such user"))
        });
        let total = fetch_page(&state, PostFilters::by_author(author.id), &query, &mut context)
            .await?;

        let following = match &viewer {
            Some(viewer) if viewer.id != author.id => {
                state.ds.is_following(viewer.id, author.id).await?
            }
            _ => false,
        };
        context.insert("author", &author);
        context.insert("posts_count", &total);
        context.insert("following", &following);
        templates::render("posts/profile.html", &context).map(templates::html)
    })
    .await
}

/// One post with its comments.
async fn post_detail<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    post_id: web::Path<i32>,
) -> Fallible<HttpResponse> {
    observe("post_detail", || async {
        let (_viewer, mut context) = base_context(&state, &req).await?;
        guard!(let Some(entry) = state.ds.find_post(*post_id).await? else {
            return Err(not_found("No such post"))
        });
        let comments = state.ds.list_comments(entry.post.id).await?;
        let posts_count = state
            .ds
            .count_posts(PostFilters::by_author(entry.post.author_id))
            .await?;
        context.insert("entry", &entry);
        context.insert("comments", &comments);
        context.insert("posts_count", &posts_count);
        templates::render("posts/post_detail.html", &context).map(templates::html)
    })
    .await
}

/// Context shared by the blank and failed versions of the post form.
async fn post_form_context<DS: Client>(
    state: &State<DS>,
    viewer: &User,
    form: &media::PostForm,
    problems: Vec<String>,
) -> Fallible<Context> {
    let groups: Vec<Group> = state.ds.list_groups().await?;
    let mut context = Context::new();
    context.insert("viewer", viewer);
    context.insert("groups", &groups);
    context.insert("errors", &problems);
    context.insert("form_text", &form.text);
    context.insert("form_group", &form.group_id);
    Ok(context)
}

async fn post_create_form<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("post_create_form", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        let mut context =
            post_form_context(&state, &viewer, &media::PostForm::default(), Vec::new()).await?;
        context.insert("is_edit", &false);
        templates::render("posts/create_post.html", &context).map(templates::html)
    })
    .await
}

async fn post_create<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    payload: Multipart,
) -> Fallible<HttpResponse> {
    observe("post_create", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        let form = media::read_post_form(payload, state.settings.max_body_size).await?;
        let problems = form.validate();
        if !problems.is_empty() {
            let mut context = post_form_context(&state, &viewer, &form, problems).await?;
            context.insert("is_edit", &false);
            return templates::render("posts/create_post.html", &context).map(templates::html);
        }

        let image = match form.image {
            Some(upload) => Some(media::store_image(&state.settings.media_root, upload).await?),
            None => None,
        };
        state
            .ds
            .new_post(NewPost {
                text: form.text,
                author_id: viewer.id,
                group_id: form.group_id,
                image,
            })
            .await?;
        state.cache.clear();
        Ok(redirect(&format!("/profile/{}/", viewer.username)))
    })
    .await
}

async fn post_edit_form<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    post_id: web::Path<i32>,
) -> Fallible<HttpResponse> {
    observe("post_edit_form", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        guard!(let Some(entry) = state.ds.find_post(*post_id).await? else {
            return Err(not_found("No such post"))
        });
        // Only the author may edit. Everyone else goes back to the post.
        if entry.post.author_id != viewer.id {
            return Ok(redirect(&format!("/posts/{}/", entry.post.id)));
        }

        let prefill = media::PostForm {
            text: entry.post.text.clone(),
            group_id: entry.post.group_id,
            image: None,
        };
        let mut context = post_form_context(&state, &viewer, &prefill, Vec::new()).await?;
        context.insert("is_edit", &true);
        context.insert("post_id", &entry.post.id);
        templates::render("posts/create_post.html", &context).map(templates::html)
    })
    .await
}

async fn post_edit<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    post_id: web::Path<i32>,
    payload: Multipart,
) -> Fallible<HttpResponse> {
    observe("post_edit", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        guard!(let Some(entry) = state.ds.find_post(*post_id).await? else {
            return Err(not_found("No such post"))
        });
        if entry.post.author_id != viewer.id {
            return Ok(redirect(&format!("/posts/{}/", entry.post.id)));
        }

        let form = media::read_post_form(payload, state.settings.max_body_size).await?;
        let problems = form.validate();
        if !problems.is_empty() {
            let mut context = post_form_context(&state, &viewer, &form, problems).await?;
            context.insert("is_edit", &true);
            context.insert("post_id", &entry.post.id);
            return templates::render("posts/create_post.html", &context).map(templates::html);
        }

        // A post edited without a new upload keeps its stored image.
        let image = match form.image {
            Some(upload) => Some(media::store_image(&state.settings.media_root, upload).await?),
            None => None,
        };
        state
            .ds
            .update_post(
                entry.post.id,
                PostChange {
                    text: form.text,
                    group_id: form.group_id,
                    image,
                },
            )
            .await?;
        state.cache.clear();
        Ok(redirect(&format!("/posts/{}/", entry.post.id)))
    })
    .await
}

/// Attach a comment to a post. Invalid comments are quietly dropped and the
/// user lands back on the post either way.
async fn add_comment<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    post_id: web::Path<i32>,
    form: web::Form<CommentForm>,
) -> Fallible<HttpResponse> {
    observe("add_comment", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        guard!(let Some(entry) = state.ds.find_post(*post_id).await? else {
            return Err(not_found("No such post"))
        });
        if form.validate().is_empty() {
            state
                .ds
                .new_comment(NewComment {
                    text: form.text.clone(),
                    author_id: viewer.id,
                    post_id: entry.post.id,
                })
                .await?;
            state.cache.clear();
        }
        Ok(redirect(&format!("/posts/{}/", entry.post.id)))
    })
    .await
}

/// The personalized feed: posts by authors the viewer follows.
async fn follow_index<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Fallible<HttpResponse> {
    observe("follow_index", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        let mut context = Context::new();
        context.insert("viewer", &viewer);
        fetch_page(&state, PostFilters::feed_of(viewer.id), &query, &mut context).await?;
        templates::render("posts/follow.html", &context).map(templates::html)
    })
    .await
}

async fn profile_follow<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    username: web::Path<String>,
) -> Fallible<HttpResponse> {
    observe("profile_follow", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        guard!(let Some(author) = state.ds.find_user(&username).await? else {
            return Err(not_found("No such user"))
        });
        // Following yourself is a no-op.
        if author.id != viewer.id {
            state.ds.follow(viewer.id, author.id).await?;
            state.cache.clear();
        }
        Ok(redirect("/follow/"))
    })
    .await
}

async fn profile_unfollow<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
    username: web::Path<String>,
) -> Fallible<HttpResponse> {
    observe("profile_unfollow", || async {
        let viewer = match auth::require(state.ds.as_ref(), &req).await? {
            Ok(viewer) => viewer,
            Err(to_login) => return Ok(to_login),
        };
        guard!(let Some(author) = state.ds.find_user(&username).await? else {
            return Err(not_found("No such user"))
        });
        state.ds.unfollow(viewer.id, author.id).await?;
        state.cache.clear();
        Ok(redirect("/follow/"))
    })
    .await
}
