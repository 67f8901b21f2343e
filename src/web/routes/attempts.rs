use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Config,
    grading::{self, StartAttempt, SubmissionOutcome, SubmissionSettings, SubmitAttempt},
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceTyped, check_access,
        entity::{AttemptDetail, TestAttempt},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::attempt::{AttemptWithDetails, TestHistory, group_history},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(attempt_start_handler))
        .route("/history", get(attempt_history_handler))
        .route("/user/{user_id}", get(attempts_by_user_handler))
        .route("/{id}", get(attempt_get_handler))
        .route("/{id}/submit", post(attempt_submit_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub fn detail_routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(detail_list_handler))
        .route("/attempt/{attempt_id}/latest", get(detail_latest_handler))
        .route("/attempt/{attempt_id}", delete(detail_delete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn attempt_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(TestAttempt::get_resource_type(), e)
}

fn detail_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(AttemptDetail::get_resource_type(), e)
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DeletedDetails {
    pub deleted: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/attempts",
    request_body = StartAttempt,
    description = "Starts an attempt on a test, or on the base test of a pool",
    responses(
        (status = 201, description = "Attempt started", body = TestAttempt),
        (status = 400, description = "Neither a test nor a pool given", body = ErrorResponse),
        (status = 404, description = "Test or pool not found", body = ErrorResponse),
    ),
    tag = "attempts",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn attempt_start_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<StartAttempt>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let attempt = grading::start_attempt(state.pool(), user, payload).await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

#[utoipa::path(
    post,
    path = "/api/v1/attempts/{id}/submit",
    request_body = SubmitAttempt,
    description = "Scores the answers, asks the grading service for an analysis (falling back to local analysis) and stores the result",
    responses(
        (status = 200, description = "Submission graded", body = SubmissionOutcome),
        (status = 400, description = "No answers, or the test does not match the attempt", body = ErrorResponse),
        (status = 403, description = "Attempt of another user", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
        (status = 409, description = "Attempts exhausted", body = ErrorResponse),
    ),
    tag = "attempts",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn attempt_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAttempt>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let settings = SubmissionSettings::from_config(Config::current().await);

    let outcome =
        grading::submit_attempt(state.pool(), user, state.grader(), &settings, id, payload)
            .await?;

    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/v1/attempts/{id}",
    responses(
        (status = 200, description = "Attempt with every submission", body = AttemptWithDetails),
        (status = 403, description = "Attempt of another user", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
    ),
    tag = "attempts",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn attempt_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let attempt = TestAttempt::find_by_id(state.pool(), user, id)
        .await
        .map_err(attempt_error)?
        .ok_or(WebError::resource_not_found(TestAttempt::get_resource_type()))?;
    check_access(state.pool(), user, &attempt, user.user_id())
        .await
        .map_err(|e| WebError::resource_access(TestAttempt::get_resource_type(), e))?;

    let details = AttemptDetail::list_for_attempt(state.pool(), user, id)
        .await
        .map_err(detail_error)?;

    Ok((StatusCode::OK, Json(AttemptWithDetails { attempt, details })))
}

#[utoipa::path(
    get,
    path = "/api/v1/attempts/user/{user_id}",
    responses(
        (status = 200, description = "Attempts of the user, newest first", body = Vec<TestAttempt>),
        (status = 403, description = "Only the user or an admin", body = ErrorResponse),
    ),
    tag = "attempts",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn attempts_by_user_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_admin() && user.user_id() != user_id {
        return Err(WebError::resource_forbidden(TestAttempt::get_resource_type()));
    }

    let attempts = TestAttempt::list_by_user(state.pool(), user, user_id)
        .await
        .map_err(attempt_error)?;

    Ok((StatusCode::OK, Json(attempts)))
}

#[utoipa::path(
    get,
    path = "/api/v1/attempts/history",
    description = "Attempts of the caller grouped by test",
    responses(
        (status = 200, description = "History", body = Vec<TestHistory>),
    ),
    tag = "attempts",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn attempt_history_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rows = TestAttempt::history_rows(state.pool(), user, user.user_id())
        .await
        .map_err(attempt_error)?;

    Ok((StatusCode::OK, Json(group_history(rows))))
}

#[utoipa::path(
    get,
    path = "/api/v1/attempt-details",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<AttemptDetail>),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
    ),
    tag = "attempt-details",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn detail_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(AttemptDetail::get_resource_type())?;
    let details = AttemptDetail::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(detail_error)?;

    Ok((StatusCode::OK, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/v1/attempt-details/attempt/{attempt_id}/latest",
    responses(
        (status = 200, description = "Latest submission of the attempt", body = AttemptDetail),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 404, description = "Nothing submitted yet", body = ErrorResponse),
    ),
    tag = "attempt-details",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn detail_latest_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(AttemptDetail::get_resource_type())?;
    let detail = AttemptDetail::latest_for_attempt(state.pool(), user, attempt_id)
        .await
        .map_err(detail_error)?
        .ok_or(WebError::resource_not_found(AttemptDetail::get_resource_type()))?;

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/attempt-details/attempt/{attempt_id}",
    responses(
        (status = 200, description = "Snapshots removed", body = DeletedDetails),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
    ),
    tag = "attempt-details",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn detail_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(AttemptDetail::get_resource_type())?;
    let deleted = AttemptDetail::delete_for_attempt(state.pool(), user, attempt_id)
        .await
        .map_err(detail_error)?;

    Ok((StatusCode::OK, Json(DeletedDetails { deleted })))
}
