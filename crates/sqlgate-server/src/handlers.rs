//! Request handlers for the gateway surface.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form, Json};
use serde::Deserialize;
use sqlgate_core::TargetId;
use sqlgate_policy::{by_op, by_table, by_target, by_user, is_allowed, DbSchema};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::FacadeError;
use crate::state::AppState;
use crate::storage::{self, QueryRecord};
use crate::templates;
use crate::query;

/// `GET /`: the target list is the landing page.
pub async fn index() -> Redirect {
    Redirect::to("/servers")
}

/// `GET /servers`: targets visible to the current user.
pub async fn servers(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Html<String> {
    let targets = state.visible_targets(&user);
    Html(templates::servers_page(&targets))
}

/// `GET /servers/{id}`: query form and declared table sheet.
pub async fn target(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Html<String>, FacadeError> {
    let target_id = TargetId::new(id);
    let target = state.target_for(&user, &target_id)?;
    Ok(Html(templates::target_page(target)))
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub query: String,
    #[serde(default)]
    pub format: Option<String>,
}

/// `POST /servers/{id}`: run a query through the policy kernel and, when
/// it is allowed, against the target. The result is stored in history;
/// HTML clients are redirected to the permalink, JSON clients get the grid
/// inline.
pub async fn run_query(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(form): Form<QueryForm>,
) -> Result<Response, FacadeError> {
    let target_id = TargetId::new(id);
    let target = state.target_for(&user, &target_id)?;

    let schema = DbSchema::new(target.default_schema.clone(), target.tables.clone());
    let acls = state.acls();
    is_allowed(
        &schema,
        |vector| {
            acls.allow(&[
                by_user(&user),
                by_target(&target_id),
                by_op(vector.op),
                by_table(&vector.table),
            ])
        },
        &form.query,
    )?;

    tracing::info!(user = %user, target = %target_id, "query allowed");

    let pool = state.target_pool(target).await?;
    let grid = query::run(&pool, &form.query).await?;

    let record = QueryRecord::new(user, target_id.clone(), form.query, grid);
    storage::insert(state.storage(), &record).await?;

    if form.format.as_deref() == Some("json") {
        return Ok(Json(record.response).into_response());
    }

    Ok(Redirect::to(&format!("/servers/{target_id}/{}", record.id)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// `GET /servers/{id}/{qid}`: replay a stored result.
pub async fn result(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, qid)): Path<(String, String)>,
    Query(params): Query<ResultQuery>,
) -> Result<Response, FacadeError> {
    let target_id = TargetId::new(id);
    state.target_for(&user, &target_id)?;

    let qid = Uuid::parse_str(&qid).map_err(|_| FacadeError::NotFound)?;
    let record = storage::fetch(state.storage(), &target_id, qid)
        .await?
        .ok_or(FacadeError::NotFound)?;

    if params.format.as_deref() == Some("json") {
        return Ok(Json(record.response).into_response());
    }

    Ok(Html(templates::result_page(&record)).into_response())
}
