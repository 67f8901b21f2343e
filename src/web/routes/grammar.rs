use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseError, ResourceTyped, entity::GrammarLesson},
    utils::validation::validate_level,
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::grammar::{GrammarFilter, GrammarLessonBody},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(grammar_list_handler).post(grammar_create_handler))
        .route("/slug/{slug}", get(grammar_by_slug_handler))
        .route(
            "/{id}",
            get(grammar_get_handler)
                .put(grammar_update_handler)
                .delete(grammar_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn lesson_error(e: DatabaseError) -> WebError {
    let resource = GrammarLesson::get_resource_type();
    if e.is_unique_violation() {
        WebError::resource_conflict(resource, "slug is already taken")
    } else {
        WebError::resource_fetch_error(resource, e)
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/grammar-lessons",
    params(GrammarFilter),
    responses(
        (status = 200, description = "Lessons ordered by level and position", body = Vec<GrammarLesson>),
        (status = 400, description = "Unknown level", body = ErrorResponse),
    ),
    tag = "grammar",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn grammar_list_handler(
    ctx: RequestContext,
    Query(filter): Query<GrammarFilter>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let level = filter.level.as_deref().map(str::trim);
    if let Some(level) = level {
        validate_level(level)?;
    }

    let lessons = GrammarLesson::list_filtered(state.pool(), user, level, filter.course_id)
        .await
        .map_err(lesson_error)?;

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    post,
    path = "/api/v1/grammar-lessons",
    request_body = GrammarLessonBody,
    responses(
        (status = 201, description = "Lesson created", body = GrammarLesson),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 409, description = "Slug is already taken", body = ErrorResponse),
    ),
    tag = "grammar",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn grammar_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<GrammarLessonBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(GrammarLesson::get_resource_type())?;
    payload.validate()?;

    let created = GrammarLesson::create(state.pool(), user, payload.into_create())
        .await
        .map_err(lesson_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/grammar-lessons/slug/{slug}",
    responses(
        (status = 200, description = "Lesson found", body = GrammarLesson),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "grammar",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn grammar_by_slug_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = GrammarLesson::find_by_slug(state.pool(), user, slug.trim())
        .await
        .map_err(lesson_error)?
        .ok_or(WebError::resource_not_found(GrammarLesson::get_resource_type()))?;

    Ok((StatusCode::OK, Json(lesson)))
}

#[utoipa::path(
    get,
    path = "/api/v1/grammar-lessons/{id}",
    responses(
        (status = 200, description = "Lesson found", body = GrammarLesson),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "grammar",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn grammar_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = GrammarLesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(lesson_error)?
        .ok_or(WebError::resource_not_found(GrammarLesson::get_resource_type()))?;

    Ok((StatusCode::OK, Json(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/v1/grammar-lessons/{id}",
    request_body = GrammarLessonBody,
    responses(
        (status = 200, description = "Lesson updated", body = GrammarLesson),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 409, description = "Slug is already taken", body = ErrorResponse),
    ),
    tag = "grammar",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn grammar_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GrammarLessonBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(GrammarLesson::get_resource_type())?;
    payload.validate()?;

    let lesson = GrammarLesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(lesson_error)?
        .ok_or(WebError::resource_not_found(GrammarLesson::get_resource_type()))?;
    let updated = lesson
        .update(state.pool(), user, payload.into_create())
        .await
        .map_err(lesson_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/grammar-lessons/{id}",
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "grammar",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn grammar_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(GrammarLesson::get_resource_type())?;
    let lesson = GrammarLesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(lesson_error)?
        .ok_or(WebError::resource_not_found(GrammarLesson::get_resource_type()))?;
    lesson.delete(state.pool(), user).await.map_err(lesson_error)?;

    Ok(StatusCode::OK)
}
