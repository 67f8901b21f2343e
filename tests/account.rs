mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};
use studyhub::model::entity::UserEntity;
use studyhub::web::{UserRole, middlewares::AUTH_TOKEN};
use tower_cookies::cookie::SameSite;

use crate::common::{
    Action, Flow, PASSWORD, create_user, login_action, register_action, setup_server,
    setup_test_db,
};

#[tokio::test]
async fn route_register_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action("lan@example.com").assert_body(|body| {
            let ent: UserEntity = serde_json::from_str(body).expect("Invalid body format");
            assert_eq!(ent.email(), "lan@example.com");
            assert_eq!(ent.role(), UserRole::Student);
            assert!(!body.contains("password"));
        }))
        // same email again
        .step(register_action("lan@example.com").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("weak password", "POST", "/api/v1/account/register")
                .with_body(json!({
                    "email": "weak@example.com",
                    "password": "password",
                    "full_name": "Weak",
                    "phone": "+84900000001",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("bad email", "POST", "/api/v1/account/register")
                .with_body(json!({
                    "email": "not-an-email",
                    "password": PASSWORD,
                    "full_name": "Nobody",
                    "phone": "+84900000002",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_login_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action("login@example.com"))
        .step(
            login_action("login@example.com", "Wr0ng!password")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            login_action("Login@Example.com", PASSWORD)
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let body: Value = serde_json::from_str(body).unwrap();
                    assert!(body["access_token"].as_str().is_some());
                    assert!(body["refresh_token"].as_str().is_some());
                    assert_eq!(body["user"]["email"], "login@example.com");
                }),
        )
        .step(
            Action::new("me", "GET", "/api/v1/account/me").assert_body(|body| {
                let ent: UserEntity = serde_json::from_str(body).unwrap();
                assert_eq!(ent.email(), "login@example.com");
            }),
        )
        .step(Action::new("verify", "GET", "/api/v1/account/verify"))
        .step(
            Action::new("sessions", "GET", "/api/v1/account/sessions")
                .assert_body(|body| assert_eq!(body, r#"{"active":1}"#)),
        )
        .step(
            Action::new("logout", "POST", "/api/v1/account/logout")
                .with_body(json!({})),
        )
        .step(
            Action::new("me after logout", "GET", "/api/v1/account/me")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_anonymous_and_invalid_token_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("anonymous me", "GET", "/api/v1/account/me")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("anonymous verify", "GET", "/api/v1/account/verify")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("garbage bearer", "GET", "/api/v1/courses")
                .with_dyn_bearer(|_| "not.a.jwt".to_string())
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_refresh_and_bearer_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action("refresh@example.com"))
        .step(login_action("refresh@example.com", PASSWORD).with_save_as("login"))
        .step(
            Action::new("refresh", "POST", "/api/v1/account/refresh")
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_dyn_body(|ctx| json!({ "refresh_token": ctx.get("login")["refresh_token"] }))
                .with_save_as("refreshed"),
        )
        // no cookie at all, only the fresh access token
        .step(
            Action::new("me with bearer", "GET", "/api/v1/account/me")
                .with_save_cookies(false)
                .with_dyn_bearer(|ctx| {
                    ctx.get("refreshed")["access_token"]
                        .as_str()
                        .unwrap()
                        .to_string()
                })
                .assert_body(|body| assert!(body.contains("refresh@example.com"))),
        )
        .step(
            Action::new("unknown refresh token", "POST", "/api/v1/account/refresh")
                .with_save_cookies(false)
                .with_body(json!({ "refresh_token": "nope" }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("logout everywhere", "POST", "/api/v1/account/logout-all")
                .with_save_cookies(false)
                .with_dyn_bearer(|ctx| {
                    ctx.get("login")["access_token"].as_str().unwrap().to_string()
                })
                .assert_body(|body| assert_eq!(body, r#"{"deleted":1}"#)),
        )
        .step(
            Action::new("refresh after logout-all", "POST", "/api/v1/account/refresh")
                .with_save_cookies(false)
                .with_dyn_body(|ctx| json!({ "refresh_token": ctx.get("login")["refresh_token"] }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_change_password_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action("pw@example.com"))
        .step(login_action("pw@example.com", PASSWORD))
        .step(
            Action::new("wrong current password", "PUT", "/api/v1/account/change-password")
                .with_body(json!({
                    "current_password": "Wr0ng!password",
                    "new_password": "N3w!password",
                }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("weak new password", "PUT", "/api/v1/account/change-password")
                .with_body(json!({
                    "current_password": PASSWORD,
                    "new_password": "short",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("change password", "PUT", "/api/v1/account/change-password").with_body(
                json!({
                    "current_password": PASSWORD,
                    "new_password": "N3w!password",
                }),
            ),
        )
        .step(login_action("pw@example.com", PASSWORD).with_expect(StatusCode::UNAUTHORIZED))
        .step(login_action("pw@example.com", "N3w!password"))
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_admin_users_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    create_user(&server, &pool, "admin@example.com", "admin").await;
    let student = create_user(&server, &pool, "student@example.com", "student").await;
    let student_id = student["id"].as_str().unwrap().to_string();
    let role_path = format!("/api/v1/account/{student_id}/role");

    let role_path_student = role_path.clone();
    Flow::new()
        .step(login_action("student@example.com", PASSWORD))
        .step(
            Action::new("student lists users", "GET", "/api/v1/account/page")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("student promotes itself", "PUT", "")
                .with_dyn_path(move |_| role_path_student.clone())
                .with_body(json!({ "role": "admin" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_action("admin@example.com", PASSWORD))
        .step(
            Action::new("admin lists users", "GET", "/api/v1/account/page")
                .with_param("limit", "10")
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 2);
                }),
        )
        .step(
            Action::new("admin promotes student", "PUT", "")
                .with_dyn_path(move |_| role_path.clone())
                .with_body(json!({ "role": "teacher" }))
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).unwrap();
                    assert_eq!(ent.role(), UserRole::Teacher);
                }),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn expired_sessions_are_swept_test() {
    use studyhub::model::{DbConnection, ModelManager, entity::Session};
    use studyhub::web::AuthenticatedUser;

    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let ctx = Flow::new()
        .step(register_action("sweep@example.com"))
        .step(login_action("sweep@example.com", PASSWORD).with_save_as("first"))
        .step(login_action("sweep@example.com", PASSWORD).with_save_as("second"))
        .run(&mut server, &pool)
        .await;

    let expired = ctx.get("first")["refresh_token"].as_str().unwrap().to_string();
    sqlx::query("UPDATE sessions SET expires_at = now() - interval '1 hour' WHERE token = $1")
        .bind(&expired)
        .execute(pool.pool())
        .await
        .unwrap();

    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let removed = Session::cleanup_expired(&mm, &AuthenticatedUser::admin())
        .await
        .unwrap();
    assert_eq!(removed, 1);

    server
        .post("/api/v1/account/refresh")
        .json(&json!({ "refresh_token": expired }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/v1/account/refresh")
        .json(&json!({ "refresh_token": ctx.get("second")["refresh_token"] }))
        .await
        .assert_status_ok();
}
