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
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceTyped, check_access,
        entity::{Course, CourseOverview, CourseRating, GrammarLesson, TestEntity},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::course::{CourseBody, CourseDetails, RatingBody},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(course_list_handler).post(course_create_handler))
        .route(
            "/{id}",
            get(course_get_handler)
                .put(course_update_handler)
                .delete(course_delete_handler),
        )
        .route(
            "/{id}/ratings",
            get(course_ratings_handler).post(course_rate_handler),
        )
        .route("/{id}/tests", get(course_tests_handler))
        .route("/{id}/grammar-lessons", get(course_grammar_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn fetch_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Course::get_resource_type(), e)
}

async fn owned_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(state.pool(), user, &course, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access(Course::get_resource_type(), e))?;

    Ok(course)
}

async fn existing_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<()> {
    Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let courses = Course::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CourseBody,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Only teachers and admins create courses", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Course::get_resource_type())?;
    payload.validate()?;

    let created = Course::create(
        state.pool(),
        user,
        payload.into_create(user.user_id(), user.is_admin()),
    )
    .await
    .map_err(fetch_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    description = "Course with its average rating and the ratings themselves",
    responses(
        (status = 200, description = "Course found", body = CourseDetails),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let overview = CourseOverview::find(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;
    let ratings = CourseRating::list_for_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseRating::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CourseDetails { overview, ratings })))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseBody,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the owner of the course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Course::get_resource_type())?;
    payload.validate()?;

    let course = owned_course(&state, user, id).await?;
    let owner = course.teacher_id().unwrap_or(user.user_id());
    let data = payload.into_create(owner, user.is_admin());

    let updated = course
        .update(state.pool(), user, data)
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Not the owner of the course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Course::get_resource_type())?;
    let course = owned_course(&state, user, id).await?;
    course.delete(state.pool(), user).await.map_err(fetch_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/ratings",
    request_body = RatingBody,
    description = "Rates a course. Rating it again replaces the previous rating",
    responses(
        (status = 201, description = "Rating stored", body = CourseRating),
        (status = 400, description = "Rating must be 1..5 with some content", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_rate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RatingBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;
    existing_course(&state, user, id).await?;

    let rating = CourseRating::create(state.pool(), user, payload.into_create(id, user.user_id()))
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseRating::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(rating)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/ratings",
    responses(
        (status = 200, description = "Ratings, newest first", body = Vec<CourseRating>),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_ratings_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let ratings = CourseRating::list_for_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseRating::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(ratings)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/tests",
    responses(
        (status = 200, description = "Tests of the course, final test last", body = Vec<TestEntity>),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_tests_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    existing_course(&state, user, id).await?;

    let tests = TestEntity::list_for_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(TestEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(tests)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/grammar-lessons",
    responses(
        (status = 200, description = "Grammar lessons of the course", body = Vec<GrammarLesson>),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn course_grammar_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    existing_course(&state, user, id).await?;

    let lessons = GrammarLesson::list_filtered(state.pool(), user, None, Some(id))
        .await
        .map_err(|e| WebError::resource_fetch_error(GrammarLesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(lessons)))
}
