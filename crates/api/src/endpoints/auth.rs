//! Authentication endpoints.

use anifeed_common::{AppError, AppResult};
use anifeed_core::SignupInput;
use axum::{
    Form, Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    extractors::{AuthUser, LOGIN_PATH, MaybeAuthUser},
    flash::FlashLevel,
    middleware::AppState,
    response::{page, redirect, redirect_with_flash},
};

const SIGNUP_PATH: &str = "/signup";

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username, or email when it contains `@`.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
struct AuthPage {
    page: &'static str,
}

/// Login page; signed-in users go home.
async fn login_page(MaybeAuthUser(user): MaybeAuthUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return redirect("/");
    }
    page(jar, AuthPage { page: "login" })
}

/// Check credentials and start a session.
async fn login(
    State(state): State<AppState>,
    MaybeAuthUser(current): MaybeAuthUser,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(redirect("/"));
    }

    let user = match state
        .user_service
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AppError::UserNotFound(_)) => {
            return Ok(redirect_with_flash(
                jar,
                FlashLevel::Error,
                "Can't find account with this username. Create a new account.",
                SIGNUP_PATH,
            ));
        }
        Err(AppError::Unauthorized) => {
            debug!(identifier = %form.username, "Login rejected");
            return Ok(redirect_with_flash(
                jar,
                FlashLevel::Error,
                "Password is incorrect.",
                LOGIN_PATH,
            ));
        }
        Err(e) => return Err(e),
    };

    let token = state.user_service.start_session(user).await?;
    let cookie = Cookie::build((state.session.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(state.session.secure)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

/// Signup page; signed-in users go home.
async fn signup_page(MaybeAuthUser(user): MaybeAuthUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return redirect("/");
    }
    page(jar, AuthPage { page: "signup" })
}

/// Register a new account.
async fn signup(
    State(state): State<AppState>,
    MaybeAuthUser(current): MaybeAuthUser,
    jar: CookieJar,
    Form(form): Form<SignupInput>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(redirect("/"));
    }

    match state.user_service.signup(form).await {
        Ok(_) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Account created successfully!",
            LOGIN_PATH,
        )),
        Err(AppError::Validation(message)) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Error,
            message,
            SIGNUP_PATH,
        )),
        Err(e) => Err(e),
    }
}

/// End the session and drop the cookie.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    state.user_service.end_session(user).await?;

    let jar = jar.remove(Cookie::build(state.session.cookie_name.clone()).path("/"));
    Ok(redirect_with_flash(
        jar,
        FlashLevel::Success,
        "You've been logged out.",
        LOGIN_PATH,
    ))
}

#[derive(Debug, Deserialize)]
struct CheckUsernameQuery {
    #[serde(default)]
    username: String,
}

#[derive(Serialize)]
struct CheckUsernameResponse {
    available: bool,
}

/// Whether a username is still free.
async fn check_username(
    State(state): State<AppState>,
    Query(query): Query<CheckUsernameQuery>,
) -> AppResult<Json<CheckUsernameResponse>> {
    let available = state
        .user_service
        .is_username_available(&query.username)
        .await?;
    Ok(Json(CheckUsernameResponse { available }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/signup", get(signup_page).post(signup))
        .route("/logout", get(logout).post(logout))
        .route("/check-username/", get(check_username))
}
