use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::impl_paginatable_for;
use crate::{
    model::{CrudRepository, DatabaseResult, HasOwner, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

pub const DEFAULT_EVALUATION_MODEL: &str = "gemini";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct TestAttempt {
    id: Uuid,
    user_id: Uuid,
    test_id: Uuid,
    test_pool_id: Option<Uuid>,
    attempt_number: i32,
    max_attempts: i32,
    score: Option<f64>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    feedback: Option<String>,
    evaluation_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TestAttemptCreate {
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub test_pool_id: Option<Uuid>,
    pub max_attempts: i32,
    pub evaluation_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttemptSubmission {
    pub score: f64,
    pub attempt_number: i32,
    pub feedback: Option<String>,
    pub end_time: DateTime<Utc>,
}

impl ResourceTyped for TestAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Attempt
    }
}

impl TestAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn test_id(&self) -> Uuid {
        self.test_id
    }

    pub fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn start_time(&self) -> &DateTime<Utc> {
        &self.start_time
    }

    pub fn end_time(&self) -> Option<&DateTime<Utc>> {
        self.end_time.as_ref()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn evaluation_model(&self) -> &str {
        &self.evaluation_model
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_number >= self.max_attempts
    }
}

#[async_trait]
impl CrudRepository<TestAttempt, TestAttemptCreate, Uuid> for TestAttempt {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TestAttemptCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO test_attempts (id, user_id, test_id, test_pool_id, attempt_number, max_attempts, evaluation_model) \
             VALUES ($1,$2,$3,$4,0,$5,$6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.test_id)
        .bind(data.test_pool_id)
        .bind(data.max_attempts)
        .bind(
            data.evaluation_model
                .as_deref()
                .unwrap_or(DEFAULT_EVALUATION_MODEL),
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TestAttemptCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE test_attempts SET test_pool_id = $1, max_attempts = $2, evaluation_model = $3 WHERE id = $4 RETURNING *",
        )
        .bind(data.test_pool_id)
        .bind(data.max_attempts)
        .bind(data.evaluation_model.unwrap_or(self.evaluation_model))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM test_attempts WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM test_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM test_attempts ORDER BY start_time DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_attempts")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(TestAttempt, TestAttemptCreate, Uuid);

#[async_trait]
impl HasOwner for TestAttempt {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct AttemptHistoryRow {
    pub attempt_id: Uuid,
    pub test_id: Uuid,
    pub test_title: String,
    pub skill: String,
    pub level: String,
    pub duration_min: i32,
    pub attempt_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub detail_total_score: Option<f64>,
    pub answer_count: Option<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TestAttempt {
    pub async fn record_submission(
        &self,
        conn: &mut sqlx::PgConnection,
        submission: &AttemptSubmission,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE test_attempts SET score = $1, end_time = $2, attempt_number = $3, feedback = $4 WHERE id = $5 RETURNING *",
        )
        .bind(submission.score)
        .bind(submission.end_time)
        .bind(submission.attempt_number)
        .bind(&submission.feedback)
        .bind(self.id)
        .fetch_one(conn)
        .await?;
        Ok(result)
    }

    /// Re-reads the attempt under a row lock so concurrent submissions serialize.
    pub async fn lock_for_update(
        &self,
        conn: &mut sqlx::PgConnection,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as("SELECT * FROM test_attempts WHERE id = $1 FOR UPDATE")
            .bind(self.id)
            .fetch_one(conn)
            .await?;
        Ok(result)
    }

    pub async fn list_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM test_attempts WHERE user_id = $1 ORDER BY start_time DESC",
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn list_by_test(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        test_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM test_attempts WHERE test_id = $1 ORDER BY start_time DESC",
        )
        .bind(test_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn latest_for_test(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        test_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM test_attempts WHERE user_id = $1 AND test_id = $2 ORDER BY start_time DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(test_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn finished_with_tests(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<(Self, String)>> {
        #[derive(FromRow)]
        struct Row {
            #[sqlx(flatten)]
            attempt: TestAttempt,
            level: String,
        }

        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT a.*, t.level
            FROM test_attempts a
            JOIN tests t ON t.id = a.test_id
            WHERE a.user_id = $1 AND a.end_time IS NOT NULL
            ORDER BY a.end_time
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows.into_iter().map(|r| (r.attempt, r.level)).collect())
    }

    pub async fn history_rows(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<AttemptHistoryRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                a.id AS attempt_id,
                t.id AS test_id,
                t.title AS test_title,
                t.skill,
                t.level,
                t.duration_min,
                a.attempt_number,
                a.start_time,
                a.end_time,
                a.score,
                d.total_score AS detail_total_score,
                jsonb_array_length(d.answers)::bigint AS answer_count,
                d.submitted_at
            FROM test_attempts a
            JOIN tests t ON t.id = a.test_id
            LEFT JOIN LATERAL (
                SELECT total_score, answers, submitted_at
                FROM attempt_details
                WHERE attempt_id = a.id
                ORDER BY submitted_at DESC
                LIMIT 1
            ) d ON true
            WHERE a.user_id = $1
            ORDER BY t.title, a.start_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
