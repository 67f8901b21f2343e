use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::routes::{
    account, attempts, certificates, courses, grammar, payments, pools, questions, study, tests,
};

pub struct AuthModifier;

impl Modify for AuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT access token for current user",
                ))),
            );
            schema.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        account::register_handler,
        account::login_handler,
        account::refresh_handler,
        account::logout_handler,
        account::logout_all_handler,
        account::sessions_handler,
        account::change_password_handler,
        account::me_handler,
        account::user_list_handler,
        account::user_update_handler,
        account::user_role_handler,
        account::user_delete_handler,
        courses::course_list_handler,
        courses::course_create_handler,
        courses::course_get_handler,
        courses::course_update_handler,
        courses::course_delete_handler,
        courses::course_rate_handler,
        courses::course_ratings_handler,
        courses::course_tests_handler,
        courses::course_grammar_handler,
        grammar::grammar_list_handler,
        grammar::grammar_create_handler,
        grammar::grammar_by_slug_handler,
        grammar::grammar_get_handler,
        grammar::grammar_update_handler,
        grammar::grammar_delete_handler,
        tests::test_list_handler,
        tests::test_create_handler,
        tests::test_get_handler,
        tests::test_update_handler,
        tests::test_delete_handler,
        tests::test_questions_handler,
        tests::test_bulk_questions_handler,
        tests::test_attempt_info_handler,
        tests::test_latest_attempt_handler,
        tests::test_attempts_handler,
        tests::test_active_pool_handler,
        questions::question_create_handler,
        questions::question_get_handler,
        questions::question_update_handler,
        questions::question_delete_handler,
        pools::pool_create_handler,
        pools::pool_get_handler,
        pools::pool_update_handler,
        pools::pool_delete_handler,
        attempts::attempt_start_handler,
        attempts::attempt_submit_handler,
        attempts::attempt_get_handler,
        attempts::attempts_by_user_handler,
        attempts::attempt_history_handler,
        attempts::detail_list_handler,
        attempts::detail_latest_handler,
        attempts::detail_delete_handler,
        certificates::certificate_issue_handler,
        certificates::certificate_by_code_handler,
        certificates::certificate_by_hash_handler,
        certificates::certificate_mine_handler,
        certificates::certificate_list_handler,
        certificates::certificate_revoke_handler,
        payments::payment_create_handler,
        payments::payment_webhook_handler,
        payments::payment_mine_handler,
        payments::payment_by_course_handler,
        payments::payment_list_handler,
        payments::payment_cancel_handler,
        payments::payment_stats_handler,
        study::study_log_handler,
        study::study_stats_handler,
    ),
    modifiers(&AuthModifier),
)]
pub struct ApiDoc;
