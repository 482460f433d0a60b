//! Route definitions for the facade.

use axum::extract::{Request, State};
use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::auth;
use crate::handlers;
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/servers", get(handlers::servers))
        .route(
            "/servers/{id}",
            get(handlers::target).post(handlers::run_query),
        )
        .route("/servers/{id}/{qid}", get(handlers::result))
        .route("/auth", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .layer(middleware::from_fn_with_state::<_, _, (State<AppState>, Request)>(
            state.clone(),
            auth::require_session,
        ))
        .with_state(state)
}
