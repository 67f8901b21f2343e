use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceTyped, check_access,
        entity::{Question, QuestionWithOptions, TestAttempt, TestEntity, TestPool},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            attempt::AttemptInfo,
            test::{BulkQuestionsBody, QuestionView, TestBody},
        },
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(test_list_handler).post(test_create_handler))
        .route(
            "/{id}",
            get(test_get_handler)
                .put(test_update_handler)
                .delete(test_delete_handler),
        )
        .route("/{id}/questions", get(test_questions_handler))
        .route("/{id}/questions/bulk", post(test_bulk_questions_handler))
        .route("/{id}/attempt-info", get(test_attempt_info_handler))
        .route("/{id}/latest-attempt", get(test_latest_attempt_handler))
        .route("/{id}/attempts", get(test_attempts_handler))
        .route("/{id}/pool", get(test_active_pool_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn fetch_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(TestEntity::get_resource_type(), e)
}

pub(crate) async fn find_test(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<TestEntity> {
    TestEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(TestEntity::get_resource_type()))
}

pub(crate) async fn owned_test(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<TestEntity> {
    let test = find_test(state, user, id).await?;
    check_access(state.pool(), user, &test, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access(TestEntity::get_resource_type(), e))?;
    Ok(test)
}

#[utoipa::path(
    get,
    path = "/api/v1/tests",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<TestEntity>),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let tests = TestEntity::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(tests)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tests",
    request_body = TestBody,
    responses(
        (status = 201, description = "Test created", body = TestEntity),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<TestBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestEntity::get_resource_type())?;
    payload.validate()?;

    let created = TestEntity::create(state.pool(), user, payload.into_create(user.user_id()))
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}",
    responses(
        (status = 200, description = "Test found", body = TestEntity),
        (status = 404, description = "Test not found", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let test = find_test(&state, user, id).await?;
    Ok((StatusCode::OK, Json(test)))
}

#[utoipa::path(
    put,
    path = "/api/v1/tests/{id}",
    request_body = TestBody,
    responses(
        (status = 200, description = "Test updated", body = TestEntity),
        (status = 403, description = "Not the author of the test", body = ErrorResponse),
        (status = 404, description = "Test not found", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TestBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestEntity::get_resource_type())?;
    payload.validate()?;

    let test = owned_test(&state, user, id).await?;
    let author = test.created_by().unwrap_or(user.user_id());
    let updated = test
        .update(state.pool(), user, payload.into_create(author))
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tests/{id}",
    responses(
        (status = 200, description = "Test deleted with its questions and attempts"),
        (status = 403, description = "Not the author of the test", body = ErrorResponse),
        (status = 404, description = "Test not found", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestEntity::get_resource_type())?;
    let test = owned_test(&state, user, id).await?;
    test.delete(state.pool(), user).await.map_err(fetch_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}/questions",
    description = "Questions in order with their options. `is_correct` is only shown to teachers and admins",
    responses(
        (status = 200, description = "Questions of the test", body = Vec<QuestionView>),
        (status = 404, description = "Test not found", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_questions_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    find_test(&state, user, id).await?;

    let questions = QuestionWithOptions::fetch_for_test(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
    let reveal = user.is_staff();
    let views: Vec<QuestionView> = questions
        .into_iter()
        .map(|q| QuestionView::new(q, reveal))
        .collect();

    Ok((StatusCode::OK, Json(views)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tests/{id}/questions/bulk",
    request_body = BulkQuestionsBody,
    description = "Inserts a generated question set. Points are split evenly over 10",
    responses(
        (status = 201, description = "Questions created", body = Vec<Question>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not the author of the test", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_bulk_questions_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BulkQuestionsBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Question::get_resource_type())?;
    payload.validate()?;
    owned_test(&state, user, id).await?;

    let created = Question::bulk_create(state.pool(), user, id, payload.questions)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}/attempt-info",
    description = "Attempt counters of the caller on this test. Defaults when nothing was started yet",
    responses(
        (status = 200, description = "Attempt summary", body = AttemptInfo),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_attempt_info_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let latest = TestAttempt::latest_for_test(state.pool(), user, user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(TestAttempt::get_resource_type(), e))?;

    let info = latest.as_ref().map(AttemptInfo::from).unwrap_or_default();
    Ok((StatusCode::OK, Json(info)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}/latest-attempt",
    responses(
        (status = 200, description = "Most recent attempt of the caller", body = TestAttempt),
        (status = 404, description = "No attempt yet", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_latest_attempt_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let latest = TestAttempt::latest_for_test(state.pool(), user, user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(TestAttempt::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(TestAttempt::get_resource_type()))?;

    Ok((StatusCode::OK, Json(latest)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}/attempts",
    responses(
        (status = 200, description = "Every attempt on the test", body = Vec<TestAttempt>),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_attempts_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestAttempt::get_resource_type())?;
    let attempts = TestAttempt::list_by_test(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(TestAttempt::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(attempts)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}/pool",
    responses(
        (status = 200, description = "Active pool built on this test", body = TestPool),
        (status = 404, description = "No active pool", body = ErrorResponse),
    ),
    tag = "tests",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn test_active_pool_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let pool = TestPool::find_active_for_test(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(TestPool::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(TestPool::get_resource_type()))?;

    Ok((StatusCode::OK, Json(pool)))
}
