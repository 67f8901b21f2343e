use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    model::{CrudRepository, ResourceTyped, entity::StudyLog},
    study::{self, StudyStats},
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::study::{StatsQuery, StudyLogBody},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/log", post(study_log_handler))
        .route("/stats", get(study_stats_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/study/log",
    request_body = StudyLogBody,
    responses(
        (status = 201, description = "Study session recorded", body = StudyLog),
        (status = 400, description = "Duration must be positive", body = ErrorResponse),
    ),
    tag = "study",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn study_log_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<StudyLogBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;

    let log = StudyLog::create(state.pool(), user, payload.into_create(user.user_id()))
        .await
        .map_err(|e| WebError::resource_fetch_error(StudyLog::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(log)))
}

#[utoipa::path(
    get,
    path = "/api/v1/study/stats",
    params(StatsQuery),
    description = "Monthly statistics of the caller: lessons, minutes, streaks and a per-day breakdown",
    responses(
        (status = 200, description = "Statistics for the month", body = StudyStats),
        (status = 400, description = "Month or year out of range", body = ErrorResponse),
    ),
    tag = "study",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn study_stats_handler(
    ctx: RequestContext,
    Query(query): Query<StatsQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let resource = StudyLog::get_resource_type();

    let stats = study::monthly_stats(state.pool(), user, query.month, query.year)
        .await
        .map_err(|e| WebError::resource_fetch_error(resource, e))?
        .ok_or_else(|| WebError::resource_bad_request(resource, "invalid month or year"))?;

    Ok((StatusCode::OK, Json(stats)))
}
