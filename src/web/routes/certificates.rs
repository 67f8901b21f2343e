use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    Config,
    certificate::{self, CertificateOverview, Issuer, VerifiedCertificate},
    model::{CrudRepository, ResourceTyped, entity::Certificate},
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::certificate::IssueCertificateBody,
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(certificate_list_handler).post(certificate_issue_handler))
        .route("/me", get(certificate_mine_handler))
        .route("/code/{code}", get(certificate_by_code_handler))
        .route("/hash/{hash}", get(certificate_by_hash_handler))
        .route("/{id}/revoke", put(certificate_revoke_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/certificates",
    request_body = IssueCertificateBody,
    description = "Issues a signed certificate. Students may only request their own, after passing the final test of the course",
    responses(
        (status = 201, description = "Certificate issued", body = Certificate),
        (status = 403, description = "Not eligible", body = ErrorResponse),
        (status = 404, description = "Course or learner not found", body = ErrorResponse),
        (status = 409, description = "Already certified for this course", body = ErrorResponse),
    ),
    tag = "certificates",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn certificate_issue_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<IssueCertificateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let config = Config::current().await.certificate();
    let learner = payload.user_id.unwrap_or(user.user_id());

    let issued = certificate::request_certificate(
        state.pool(),
        user,
        learner,
        payload.course_id,
        &Issuer::from(config),
        config.signing_key(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(issued)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/code/{code}",
    description = "Public verification by certificate code",
    responses(
        (status = 200, description = "Certificate with its trust evaluation", body = VerifiedCertificate),
        (status = 403, description = "Signature rejected", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
    ),
    tag = "certificates"
)]
pub async fn certificate_by_code_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> WebResult<impl IntoResponse> {
    let key = Config::current().await.certificate().signing_key();
    let found =
        certificate::find_by_code(state.pool(), &AuthenticatedUser::admin(), &code, key).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/hash/{hash}",
    description = "Public verification by `0x` prefixed SHA-256 hash",
    responses(
        (status = 200, description = "Certificate with its trust evaluation", body = VerifiedCertificate),
        (status = 400, description = "Malformed hash", body = ErrorResponse),
        (status = 403, description = "Signature rejected", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
    ),
    tag = "certificates"
)]
pub async fn certificate_by_hash_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> WebResult<impl IntoResponse> {
    let key = Config::current().await.certificate().signing_key();
    let found =
        certificate::find_by_hash(state.pool(), &AuthenticatedUser::admin(), &hash, key).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/me",
    responses(
        (status = 200, description = "Certificates of the caller, newest first", body = CertificateOverview),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "certificates",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn certificate_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let key = Config::current().await.certificate().signing_key();
    let overview =
        certificate::overview_for_user(state.pool(), user, user.user_id(), key).await?;

    Ok((StatusCode::OK, Json(overview)))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates",
    responses(
        (status = 200, description = "Every certificate with a health summary", body = CertificateOverview),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "certificates",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn certificate_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user(Certificate::get_resource_type())?;
    let key = Config::current().await.certificate().signing_key();
    let overview = certificate::overview_all(state.pool(), user, key).await?;

    Ok((StatusCode::OK, Json(overview)))
}

#[utoipa::path(
    put,
    path = "/api/v1/certificates/{id}/revoke",
    responses(
        (status = 200, description = "Certificate revoked", body = Certificate),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
    ),
    tag = "certificates",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn certificate_revoke_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user(Certificate::get_resource_type())?;
    let resource = Certificate::get_resource_type();

    let found = Certificate::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(resource, e))?
        .ok_or(WebError::resource_not_found(resource))?;
    let revoked = found
        .revoke(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(resource, e))?;

    tracing::info!(certificate_id = %id, "certificate revoked");
    Ok((StatusCode::OK, Json(revoked)))
}
