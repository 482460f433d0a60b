//! Session authentication.
//!
//! Form-based login against the static users provider with an HMAC-signed
//! session cookie. The cookie carries the user id and a SHA-256 tag keyed
//! with the configured `cookie_secret`; anything that fails verification is
//! treated as an anonymous request.

use axum::extract::{Query, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use sqlgate_core::UserId;

use crate::state::AppState;
use crate::templates;

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name.
const SESSION_COOKIE: &str = "sqlgate_session";

/// The authenticated user of the current request, stored in request
/// extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

/// Build a signed session cookie value for a user.
pub fn issue_session(secret: &str, user: &UserId) -> String {
    let payload = URL_SAFE_NO_PAD.encode(user.as_str());
    format!("{payload}.{}", sign(secret, &payload))
}

/// Verify a session cookie value and recover the user id.
pub fn verify_session(secret: &str, value: &str) -> Option<UserId> {
    let (payload, tag) = value.split_once('.')?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
    mac.verify_slice(&tag).ok()?;

    let raw = URL_SAFE_NO_PAD.decode(payload).ok()?;
    Some(UserId::new(String::from_utf8(raw).ok()?))
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // Hmac accepts keys of any length; keep the signature infallible.
        Err(_) => return String::new(),
    };
    mac.update(payload.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

fn session_from_request(request: &Request) -> Option<String> {
    let cookies = request.headers().get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookies.split(';') {
        if let Some(value) = cookie.trim().strip_prefix(&format!("{SESSION_COOKIE}=")) {
            return Some(value.to_owned());
        }
    }
    None
}

/// Middleware: resolve the session cookie into a [`CurrentUser`] extension,
/// or redirect to the login page. The auth routes themselves pass through.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if path == "/auth" || path.starts_with("/auth/") {
        return next.run(request).await;
    }

    if let Some(value) = session_from_request(&request) {
        if let Some(user) = verify_session(state.cookie_secret(), &value) {
            request.extensions_mut().insert(CurrentUser(user));
            return next.run(request).await;
        }
    }

    let redirect_to = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&format!(
        "/auth?redirect={}",
        urlencoding::encode(redirect_to)
    ))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// `GET /auth`: the login form.
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(templates::login_page(
        None,
        query.redirect.as_deref().unwrap_or("/servers"),
    ))
}

/// `POST /auth`: check credentials and set the session cookie.
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let redirect = sanitize_redirect(form.redirect.as_deref());

    match state.auth_user(&form.username, &form.password) {
        Ok(user) => {
            tracing::info!(user = %user, "login");
            let cookie = format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
                issue_session(state.cookie_secret(), &user)
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to(redirect)).into_response()
        }
        Err(_) => {
            tracing::warn!(username = %form.username, "failed login");
            (
                axum::http::StatusCode::UNAUTHORIZED,
                Html(templates::login_page(Some("invalid credentials"), redirect)),
            )
                .into_response()
        }
    }
}

/// `GET /logout`: clear the session cookie.
pub async fn logout() -> Response {
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], Redirect::to("/auth")).into_response()
}

/// Only local paths are acceptable post-login destinations.
fn sanitize_redirect(redirect: Option<&str>) -> &str {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/servers",
    }
}
