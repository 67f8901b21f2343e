mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{Action, Flow, PASSWORD, create_user, login_action, setup_server, setup_test_db};

#[tokio::test]
async fn route_study_log_and_stats_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    create_user(&server, &pool, "teacher@example.com", "teacher").await;
    create_user(&server, &pool, "student@example.com", "student").await;

    Flow::new()
        .step(login_action("teacher@example.com", PASSWORD))
        .step(
            Action::new("create lesson", "POST", "/api/v1/grammar-lessons")
                .with_body(json!({
                    "title": "Articles",
                    "slug": "articles",
                    "level": "A1",
                    "content": "a, an, the",
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("lesson"),
        )
        .step(login_action("student@example.com", PASSWORD))
        .step(
            Action::new("zero minutes", "POST", "/api/v1/study/log")
                .with_body(json!({ "duration_minutes": 0 }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("free study", "POST", "/api/v1/study/log")
                .with_body(json!({ "duration_minutes": 50 }))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("lesson study", "POST", "/api/v1/study/log")
                .with_dyn_body(|ctx| {
                    json!({ "lesson_id": ctx.get("lesson")["id"], "duration_minutes": 25 })
                })
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("stats", "GET", "/api/v1/study/stats").assert_body(|body| {
                let stats: Value = serde_json::from_str(body).unwrap();
                assert_eq!(stats["study_time_this_month_minutes"], 75);
                assert_eq!(stats["study_time_this_month"], "1h 15m");
                assert_eq!(stats["completed_lessons"], 1);
                assert_eq!(stats["current_streak"], 1);
            }),
        )
        .step(
            Action::new("invalid month", "GET", "/api/v1/study/stats")
                .with_param("month", "13")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("empty month", "GET", "/api/v1/study/stats")
                .with_param("month", "1")
                .with_param("year", "2001")
                .assert_body(|body| {
                    let stats: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(stats["study_time_this_month_minutes"], 0);
                    assert_eq!(stats["longest_streak"], 0);
                }),
        )
        .run(&mut server, &pool)
        .await;
}
