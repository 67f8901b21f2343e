mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, PASSWORD, create_user, id_of, login_action, setup_server, setup_test_db,
};

fn code_path(ctx: &common::FlowContext) -> String {
    let code = ctx.get("certificate")["cert_code"].as_str().unwrap();
    format!("/api/v1/certificates/code/{code}")
}

#[tokio::test]
async fn route_certificate_lifecycle_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    create_user(&server, &pool, "admin@example.com", "admin").await;
    let student = create_user(&server, &pool, "student@example.com", "student").await;
    let student_id = student["id"].clone();

    let ctx = Flow::new()
        .step(login_action("admin@example.com", PASSWORD))
        .step(
            Action::new("create course", "POST", "/api/v1/courses")
                .with_body(json!({
                    "title": "IELTS Academic",
                    "description": "",
                    "category": "ielts",
                    "level": "B2",
                    "cost": 0,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("course"),
        )
        .step(
            Action::new("create second course", "POST", "/api/v1/courses")
                .with_body(json!({
                    "title": "IELTS General",
                    "description": "",
                    "category": "ielts",
                    "cost": 0,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("other_course"),
        )
        .step({
            let student_id = student_id.clone();
            Action::new("issue", "POST", "/api/v1/certificates")
                .with_dyn_body(move |ctx| {
                    json!({ "user_id": student_id, "course_id": ctx.get("course")["id"] })
                })
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    let cert: Value = serde_json::from_str(body).unwrap();
                    let hash = cert["cert_hash"].as_str().unwrap();
                    assert!(hash.starts_with("0x"));
                    assert_eq!(hash.len(), 66);
                    assert_eq!(cert["is_revoked"], false);
                })
                .with_save_as("certificate")
        })
        .step({
            let student_id = student_id.clone();
            Action::new("issue twice", "POST", "/api/v1/certificates")
                .with_dyn_body(move |ctx| {
                    json!({ "user_id": student_id, "course_id": ctx.get("course")["id"] })
                })
                .with_expect(StatusCode::CONFLICT)
        })
        // verification is public
        .step(
            Action::new("lookup by code", "GET", "")
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_dyn_path(code_path)
                .assert_body(|body| {
                    let found: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(found["verification"]["trust_level"], "trusted");
                    assert_eq!(found["verification"]["status"]["code"], "VERIFIED");
                }),
        )
        .step(
            Action::new("lookup by hash", "GET", "")
                .with_save_cookies(false)
                .with_dyn_path(|ctx| {
                    let hash = ctx.get("certificate")["cert_hash"].as_str().unwrap();
                    format!("/api/v1/certificates/hash/{hash}")
                })
                .assert_body(|body| assert!(body.contains("IELTS Academic"))),
        )
        .step(
            Action::new("malformed hash", "GET", "/api/v1/certificates/hash/0x1234")
                .with_save_cookies(false)
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("unknown code", "GET", "/api/v1/certificates/code/CERT-NOPE")
                .with_save_cookies(false)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(login_action("student@example.com", PASSWORD))
        .step(
            Action::new("request without passing", "POST", "/api/v1/certificates")
                .with_dyn_body(|ctx| json!({ "course_id": ctx.get("other_course")["id"] }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("student lists all", "GET", "/api/v1/certificates")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("student revokes", "PUT", "")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/certificates/{}/revoke", id_of(ctx, "certificate"))
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("mine", "GET", "/api/v1/certificates/me").assert_body(|body| {
                let mine: Value = serde_json::from_str(body).unwrap();
                assert_eq!(mine["summary"]["total"], 1);
                assert_eq!(mine["summary"]["health_score"], 100.0);
            }),
        )
        .step(login_action("admin@example.com", PASSWORD))
        .step(
            Action::new("revoke", "PUT", "")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/certificates/{}/revoke", id_of(ctx, "certificate"))
                })
                .assert_body(|body| assert!(body.contains(r#""is_revoked":true"#))),
        )
        // the signed metadata still says "valid"
        .step(
            Action::new("lookup revoked", "GET", "")
                .with_dyn_path(code_path)
                .assert_body(|body| {
                    let found: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(found["verification"]["trust_level"], "warning");
                    assert!(!found["verification"]["warnings"].as_array().unwrap().is_empty());
                }),
        )
        .step(
            Action::new("overview", "GET", "/api/v1/certificates").assert_body(|body| {
                let all: Value = serde_json::from_str(body).unwrap();
                assert_eq!(all["summary"]["total"], 1);
                assert_eq!(all["summary"]["warning"], 1);
                assert_eq!(all["summary"]["health_score"], 0.0);
            }),
        )
        .run(&mut server, &pool)
        .await;

    // altering the signed metadata makes the certificate unacceptable
    sqlx::query(
        "UPDATE certificates SET metadata = jsonb_set(metadata, '{course,title}', '\"Forged\"')",
    )
    .execute(pool.pool())
    .await
    .unwrap();

    let code = ctx.get("certificate")["cert_code"].as_str().unwrap().to_string();
    server.clear_cookies();
    server
        .get(&format!("/api/v1/certificates/code/{code}"))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
