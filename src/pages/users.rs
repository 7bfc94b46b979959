//! Signup, login and logout, mounted under /auth.

use crate::auth;
use crate::datastore::{structs::NewUser, Client};
use crate::forms::{LoginForm, SignupForm};
use crate::pages::{observe, redirect, State};
use crate::templates;
use crate::twoface::Fallible;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tera::Context;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/signup/")
            .route(web::get().to(signup_form))
            .route(web::post().to(signup::<DS>)),
    )
    .service(
        web::resource("/login/")
            .route(web::get().to(login_form))
            .route(web::post().to(login::<DS>)),
    )
    .service(web::resource("/logout/").route(web::get().to(logout::<DS>)));
}

/// Where the login page should send the user afterwards.
#[derive(Deserialize, Default, Clone, Debug)]
struct NextQuery {
    next: Option<String>,
}

fn signup_context(errors: &[String], username: &str, email: &str) -> Context {
    let mut context = Context::new();
    context.insert("viewer", &None::<()>);
    context.insert("errors", errors);
    context.insert("form_username", username);
    context.insert("form_email", email);
    context
}

async fn signup_form() -> Fallible<HttpResponse> {
    observe("signup_form", || async {
        let context = signup_context(&[], "", "");
        templates::render("users/signup.html", &context).map(templates::html)
    })
    .await
}

async fn signup<DS: Client>(
    state: web::Data<State<DS>>,
    form: web::Form<SignupForm>,
) -> Fallible<HttpResponse> {
    observe("signup", || async {
        let mut problems = form.validate();
        if problems.is_empty() && state.ds.find_user(&form.username).await?.is_some() {
            problems.push("That username is taken".to_owned());
        }
        if !problems.is_empty() {
            let context = signup_context(&problems, &form.username, &form.email);
            return templates::render("users/signup.html", &context).map(templates::html);
        }

        let password_hash = auth::hash_password(&form.password1)?;
        state
            .ds
            .new_user(NewUser {
                username: form.username.clone(),
                email: form.email.clone(),
                password_hash,
            })
            .await?;
        Ok(redirect("/auth/login/"))
    })
    .await
}

fn login_context(errors: &[String], username: &str, next: &Option<String>) -> Context {
    let mut context = Context::new();
    context.insert("viewer", &None::<()>);
    context.insert("errors", errors);
    context.insert("form_username", username);
    context.insert("next", next);
    context
}

async fn login_form(query: web::Query<NextQuery>) -> Fallible<HttpResponse> {
    observe("login_form", || async {
        let context = login_context(&[], "", &query.next);
        templates::render("users/login.html", &context).map(templates::html)
    })
    .await
}

async fn login<DS: Client>(
    state: web::Data<State<DS>>,
    form: web::Form<LoginForm>,
) -> Fallible<HttpResponse> {
    observe("login", || async {
        let user = state.ds.find_user(&form.username).await?;
        let verified = user
            .as_ref()
            .map(|user| auth::verify_password(&form.password, &user.password_hash))
            .unwrap_or(false);

        guard!(let (Some(user), is_verified) if is_verified = (user, verified) else {
            let problems = vec!["Wrong username or password".to_owned()];
            let context = login_context(&problems, &form.username, &form.next);
            return templates::render("users/login.html", &context).map(templates::html)
        });

        let session = auth::new_session(user.id, state.settings.session_ttl_hours);
        let session = state.ds.open_session(session).await?;
        Ok(HttpResponse::Found()
            .header(header::LOCATION, form.destination())
            .cookie(auth::session_cookie(session.token))
            .finish())
    })
    .await
}

async fn logout<DS: Client>(
    state: web::Data<State<DS>>,
    req: HttpRequest,
) -> Fallible<HttpResponse> {
    observe("logout", || async {
        if let Some(token) = auth::session_token(&req) {
            state.ds.close_session(token).await?;
        }
        let mut context = Context::new();
        context.insert("viewer", &None::<()>);
        let body = templates::render("users/logged_out.html", &context)?;
        Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .del_cookie(&auth::removal_cookie())
            .body(body))
    })
    .await
}
