use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    Config,
    model::{DatabaseError, PaginatableRepository, ResourceTyped, entity::Payment},
    payment::{self, PaymentRequest, PaymentStats, WebhookPayload},
    web::{
        AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/", get(payment_list_handler).post(payment_create_handler))
        .route("/me", get(payment_mine_handler))
        .route("/stats", get(payment_stats_handler))
        .route("/course/{course_id}", get(payment_by_course_handler))
        .route("/{id}/cancel", put(payment_cancel_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    // the gateway authenticates with the payload signature, not a token
    Router::new()
        .route("/webhook", post(payment_webhook_handler))
        .merge(protected)
        .with_state(state)
}

fn fetch_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Payment::get_resource_type(), e)
}

#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Pending payment created", body = Payment),
        (status = 400, description = "Amount must be positive", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "payments",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn payment_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<PaymentRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let currency = Config::current().await.payment().currency();
    let created = payment::create_payment(state.pool(), user, payload, currency).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = WebhookPayload,
    description = "Gateway callback. `signature` is the hex HMAC-SHA256 of the sorted `data` fields",
    responses(
        (status = 200, description = "Payment settled, or returned unchanged when already settled", body = Payment),
        (status = 400, description = "Invalid signature or payload", body = ErrorResponse),
        (status = 404, description = "Unknown order", body = ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn payment_webhook_handler(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> WebResult<impl IntoResponse> {
    let key = Config::current().await.payment().checksum_key();
    let settled = payment::process_webhook(state.pool(), &payload, key).await?;

    Ok((StatusCode::OK, Json(settled)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/me",
    responses(
        (status = 200, description = "Payments of the caller, newest first", body = Vec<Payment>),
    ),
    tag = "payments",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn payment_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let payments = Payment::list_for_user(state.pool(), user, user.user_id())
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(payments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/course/{course_id}",
    responses(
        (status = 200, description = "Payments for the course", body = Vec<Payment>),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
    ),
    tag = "payments",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn payment_by_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Payment::get_resource_type())?;
    let payments = Payment::list_for_course(state.pool(), user, course_id)
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(payments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Payment>),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "payments",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn payment_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user(Payment::get_resource_type())?;
    let payments = Payment::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(payments)))
}

#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}/cancel",
    responses(
        (status = 200, description = "Payment cancelled", body = Payment),
        (status = 403, description = "Payment of another user", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment is no longer pending", body = ErrorResponse),
    ),
    tag = "payments",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn payment_cancel_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let cancelled = payment::cancel_payment(state.pool(), user, id).await?;

    Ok((StatusCode::OK, Json(cancelled)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/stats",
    responses(
        (status = 200, description = "Revenue and status counters", body = PaymentStats),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "payments",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn payment_stats_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user(Payment::get_resource_type())?;
    let stats = payment::stats(state.pool(), user).await?;

    Ok((StatusCode::OK, Json(stats)))
}
