use crate::{
    Config,
    web::{AppState, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod account;
pub mod attempts;
pub mod certificates;
pub mod courses;
pub mod grammar;
pub mod payments;
pub mod pools;
pub mod questions;
pub mod study;
pub mod tests;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub fn build_app<S: Send + Sync + Clone + 'static>(
    state: AppState,
    config: &'static Config,
) -> Router<S> {
    let mut router = Router::new()
        .nest("/api/v1/account", account::routes(state.clone()))
        .nest("/api/v1/courses", courses::routes(state.clone()))
        .nest("/api/v1/grammar-lessons", grammar::routes(state.clone()))
        .nest("/api/v1/tests", tests::routes(state.clone()))
        .nest("/api/v1/questions", questions::routes(state.clone()))
        .nest("/api/v1/test-pools", pools::routes(state.clone()))
        .nest("/api/v1/attempts", attempts::routes(state.clone()))
        .nest("/api/v1/attempt-details", attempts::detail_routes(state.clone()))
        .nest("/api/v1/certificates", certificates::routes(state.clone()))
        .nest("/api/v1/payments", payments::routes(state.clone()))
        .nest("/api/v1/study", study::routes(state.clone()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let query = PaginationQuery {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(query.limit(), 20);
    }
}
