use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseError, ResourceTyped, check_access, entity::TestPool},
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::test::TestPoolBody,
        error::ErrorResponse,
        middlewares,
        routes::tests::owned_test,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(pool_create_handler))
        .route(
            "/{id}",
            get(pool_get_handler)
                .put(pool_update_handler)
                .delete(pool_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn fetch_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(TestPool::get_resource_type(), e)
}

async fn find_pool(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<TestPool> {
    TestPool::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(TestPool::get_resource_type()))
}

async fn owned_pool(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<TestPool> {
    let pool = find_pool(state, user, id).await?;
    check_access(state.pool(), user, &pool, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access(TestPool::get_resource_type(), e))?;
    Ok(pool)
}

#[utoipa::path(
    post,
    path = "/api/v1/test-pools",
    request_body = TestPoolBody,
    responses(
        (status = 201, description = "Pool created", body = TestPool),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not the author of the base test", body = ErrorResponse),
        (status = 404, description = "Base test not found", body = ErrorResponse),
    ),
    tag = "test-pools",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn pool_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<TestPoolBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestPool::get_resource_type())?;
    payload.validate()?;
    owned_test(&state, user, payload.base_test_id).await?;

    let created = TestPool::create(state.pool(), user, payload.into_create(user.user_id()))
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/test-pools/{id}",
    responses(
        (status = 200, description = "Pool found", body = TestPool),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    ),
    tag = "test-pools",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn pool_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let pool = find_pool(&state, user, id).await?;
    Ok((StatusCode::OK, Json(pool)))
}

#[utoipa::path(
    put,
    path = "/api/v1/test-pools/{id}",
    request_body = TestPoolBody,
    responses(
        (status = 200, description = "Pool updated", body = TestPool),
        (status = 403, description = "Not the author of the pool", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    ),
    tag = "test-pools",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn pool_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TestPoolBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestPool::get_resource_type())?;
    payload.validate()?;

    // the base test of a pool is fixed
    let pool = owned_pool(&state, user, id).await?;

    let updated = pool
        .update(state.pool(), user, payload.into_create(user.user_id()))
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/test-pools/{id}",
    responses(
        (status = 200, description = "Pool deleted"),
        (status = 403, description = "Not the author of the pool", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    ),
    tag = "test-pools",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn pool_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(TestPool::get_resource_type())?;
    let pool = owned_pool(&state, user, id).await?;
    pool.delete(state.pool(), user).await.map_err(fetch_error)?;

    Ok(StatusCode::OK)
}
