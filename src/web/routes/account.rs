use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Duration;
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use tracing::info;
use uuid::Uuid;

use crate::{
    Config,
    auth::{self, UserClaims, generate_opaque_token, hash_password, verify_password},
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{Session, SessionCreate, UserEntity},
    },
    utils::validation::validate_password,
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::account::{
            ChangePasswordBody, LoginBody, LoginResponse, LogoutAllResponse, LogoutBody,
            RefreshBody, RefreshResponse, RegisterBody, RoleBody, SessionCount, UpdateUserBody,
        },
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(me_handler))
        .route("/page", get(user_list_handler))
        .route("/verify", get(user_verify_handler))
        .route("/logout", post(logout_handler))
        .route("/logout-all", post(logout_all_handler))
        .route("/sessions", get(sessions_handler))
        .route("/change-password", put(change_password_handler))
        .route(
            "/{id}",
            put(user_update_handler).delete(user_delete_handler),
        )
        .route("/{id}/role", put(user_role_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .merge(protected)
        .with_state(state)
}

fn fetch_error(e: crate::model::DatabaseError) -> WebError {
    WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
}

fn session_error(e: crate::model::DatabaseError) -> WebError {
    WebError::resource_fetch_error(Session::get_resource_type(), e)
}

async fn access_token_for(user_id: Uuid, role: UserRole) -> WebResult<String> {
    let app = Config::current().await.app();
    let claims = UserClaims::new(
        user_id,
        role.to_string(),
        Duration::minutes(app.access_token_minutes()),
    );
    auth::generate_token(claims, app.jwt()).map_err(|e| WebError::server_crypt_error(e.into()))
}

fn set_auth_cookie(cookies: &Cookies, token: String) {
    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
}

fn clear_auth_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
}

#[utoipa::path(
    post,
    path = "/api/v1/account/register",
    request_body = RegisterBody,
    description = "Registers a new student account",
    responses(
        (status = 201, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email or phone already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate()?;

    let admin = AuthenticatedUser::admin();
    let conflict = UserEntity::find_conflicting(
        state.pool(),
        &admin,
        payload.email.trim(),
        payload.phone.trim(),
        None,
    )
    .await
    .map_err(fetch_error)?;
    if conflict.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let created = UserEntity::create(state.pool(), &admin, payload.into_entity(hash))
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                fetch_error(e)
            }
        })?;

    info!(user_id = %created.id(), "user registered");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/login",
    description = "Authorizes user in the system. Sets the `SID` cookie and returns an access and a refresh token",
    request_body = LoginBody,
    responses(
        (status = 200, description = "User signed in", body = LoginResponse),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
pub async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_email(state.pool(), &admin, payload.email.trim())
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::auth_invalid_credentials())?;

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    let access_token = access_token_for(found.id(), found.role()).await?;
    let refresh_token = generate_opaque_token();
    let hours = Config::current().await.app().refresh_token_hours();

    Session::create(
        state.pool(),
        &admin,
        SessionCreate {
            token: refresh_token.clone(),
            user_id: found.id(),
            expires_at: chrono::Utc::now() + Duration::hours(hours),
        },
    )
    .await
    .map_err(session_error)?;

    set_auth_cookie(&cookies, access_token.clone());

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token,
            refresh_token,
            user: found,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/refresh",
    description = "Exchanges a refresh token for a new access token",
    request_body = RefreshBody,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Refresh token invalid or expired", body = ErrorResponse),
    ),
    tag = "account",
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RefreshBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let session = Session::find_by_token(state.pool(), &admin, payload.refresh_token.trim())
        .await
        .map_err(session_error)?
        .ok_or(WebError::auth_refresh_invalid())?;

    if session.is_expired() {
        session
            .delete(state.pool(), &admin)
            .await
            .map_err(session_error)?;
        return Err(WebError::auth_refresh_invalid());
    }

    let user = UserEntity::find_by_id(state.pool(), &admin, session.user_id())
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::auth_refresh_invalid())?;

    let access_token = access_token_for(user.id(), user.role()).await?;
    set_auth_cookie(&cookies, access_token.clone());

    Ok((StatusCode::OK, Json(RefreshResponse { access_token })))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/logout",
    description = "Drops the given refresh token and the `SID` cookie",
    request_body = LogoutBody,
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn logout_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    body: Option<Json<LogoutBody>>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let body = body.map(|Json(b)| b).unwrap_or_default();

    if let Some(token) = body.refresh_token {
        let session = Session::find_by_token(state.pool(), user, token.trim())
            .await
            .map_err(session_error)?;
        if let Some(session) = session.filter(|s| s.user_id() == user.user_id()) {
            session
                .delete(state.pool(), user)
                .await
                .map_err(session_error)?;
        }
    }

    clear_auth_cookie(&cookies);
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/logout-all",
    description = "Drops every refresh token of the current user",
    responses(
        (status = 200, description = "Sessions removed", body = LogoutAllResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn logout_all_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let deleted = Session::delete_all_for_user(state.pool(), user, user.user_id())
        .await
        .map_err(session_error)?;

    clear_auth_cookie(&cookies);
    Ok((StatusCode::OK, Json(LogoutAllResponse { deleted })))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/sessions",
    responses(
        (status = 200, description = "Number of active sessions", body = SessionCount),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn sessions_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let active = Session::count_active_for_user(state.pool(), user, user.user_id())
        .await
        .map_err(session_error)?;
    Ok((StatusCode::OK, Json(SessionCount { active })))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/change-password",
    request_body = ChangePasswordBody,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password is too weak", body = ErrorResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn change_password_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mut found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let is_verified = verify_password(found.hash(), &payload.current_password)
        .map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }
    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password).map_err(WebError::server_crypt_error)?;
    found
        .set_password(state.pool(), user, hash)
        .await
        .map_err(fetch_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
    Ok((StatusCode::OK, Json(found)))
}

async fn user_verify_handler(ctx: RequestContext) -> WebResult<impl IntoResponse> {
    if ctx.maybe_user().is_none() {
        return Ok(StatusCode::UNAUTHORIZED);
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user(UserEntity::get_resource_type())?;

    let users = UserEntity::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You doesn't have enough permissions to do this", body = ErrorResponse),
        (status = 409, description = "Email or phone already in use", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::resource_access(UserEntity::get_resource_type(), e))?;

    let conflict = UserEntity::find_conflicting(
        state.pool(),
        user,
        payload.email.trim(),
        payload.phone.trim(),
        Some(id),
    )
    .await
    .map_err(fetch_error)?;
    if conflict.is_some() {
        return Err(WebError::registration_conflict());
    }

    let updated = found
        .update(state.pool(), user, payload.into_entity())
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}/role",
    request_body = RoleBody,
    responses(
        (status = 200, description = "Role changed", body = UserEntity),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn user_role_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user(UserEntity::get_resource_type())?;
    let mut found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    found
        .set_role(state.pool(), user, UserRole::from(payload.role.as_str()))
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user",
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::resource_access(UserEntity::get_resource_type(), e))?;

    found.delete(state.pool(), user).await.map_err(fetch_error)?;

    Ok(StatusCode::OK)
}
