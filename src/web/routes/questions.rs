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
    model::{
        CrudRepository, DatabaseError, ResourceTyped,
        entity::{Question, QuestionCreate, QuestionWithOptions},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::test::{QuestionView, validate_question},
        error::ErrorResponse,
        middlewares,
        routes::tests::owned_test,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(question_create_handler))
        .route(
            "/{id}",
            get(question_get_handler)
                .put(question_update_handler)
                .delete(question_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn fetch_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Question::get_resource_type(), e)
}

async fn find_question(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Question> {
    Question::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_error)?
        .ok_or(WebError::resource_not_found(Question::get_resource_type()))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions",
    request_body = QuestionCreate,
    responses(
        (status = 201, description = "Question created with its options", body = Question),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not the author of the test", body = ErrorResponse),
        (status = 404, description = "Test not found", body = ErrorResponse),
    ),
    tag = "questions",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn question_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Question::get_resource_type())?;
    validate_question(&payload)?;
    owned_test(&state, user, payload.test_id).await?;

    let created = Question::create(state.pool(), user, payload)
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    responses(
        (status = 200, description = "Question with its options", body = QuestionView),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "questions",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn question_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let question = find_question(&state, user, id).await?;

    let view = QuestionWithOptions::fetch_for_test(state.pool(), user, question.test_id())
        .await
        .map_err(fetch_error)?
        .into_iter()
        .find(|q| q.question.id() == id)
        .map(|q| QuestionView::new(q, user.is_staff()))
        .ok_or(WebError::resource_not_found(Question::get_resource_type()))?;

    Ok((StatusCode::OK, Json(view)))
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/{id}",
    request_body = QuestionCreate,
    description = "Updates a question. Given `options` replace the stored ones",
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 403, description = "Not the author of the test", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "questions",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn question_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Question::get_resource_type())?;
    validate_question(&payload)?;

    let question = find_question(&state, user, id).await?;
    owned_test(&state, user, question.test_id()).await?;
    if payload.test_id != question.test_id() {
        owned_test(&state, user, payload.test_id).await?;
    }

    let updated = question
        .update(state.pool(), user, payload)
        .await
        .map_err(fetch_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/{id}",
    responses(
        (status = 200, description = "Question deleted"),
        (status = 403, description = "Not the author of the test", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "questions",
    security(("bearer" = []), ("cookie" = []))
)]
pub async fn question_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff(Question::get_resource_type())?;
    let question = find_question(&state, user, id).await?;
    owned_test(&state, user, question.test_id()).await?;

    question.delete(state.pool(), user).await.map_err(fetch_error)?;
    Ok(StatusCode::OK)
}
