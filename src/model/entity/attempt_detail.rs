use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct AttemptDetail {
    id: Uuid,
    attempt_id: Uuid,
    attempt_number: i32,
    answers: serde_json::Value,
    analysis: serde_json::Value,
    total_score: f64,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptDetailCreate {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub answers: serde_json::Value,
    pub analysis: serde_json::Value,
    pub total_score: f64,
    pub submitted_at: DateTime<Utc>,
}

impl ResourceTyped for AttemptDetail {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::AttemptDetail
    }
}

impl AttemptDetail {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    pub fn answers(&self) -> &serde_json::Value {
        &self.answers
    }

    pub fn analysis(&self) -> &serde_json::Value {
        &self.analysis
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub async fn insert(
        conn: &mut sqlx::PgConnection,
        data: &AttemptDetailCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO attempt_details (id, attempt_id, attempt_number, answers, analysis, total_score, submitted_at) \
             VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.attempt_id)
        .bind(data.attempt_number)
        .bind(&data.answers)
        .bind(&data.analysis)
        .bind(data.total_score)
        .bind(data.submitted_at)
        .fetch_one(conn)
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl CrudRepository<AttemptDetail, AttemptDetailCreate, Uuid> for AttemptDetail {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AttemptDetailCreate,
    ) -> DatabaseResult<Self> {
        let mut conn = mm.executor().acquire().await?;
        Self::insert(&mut conn, &data).await
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AttemptDetailCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE attempt_details SET answers = $1, analysis = $2, total_score = $3 WHERE id = $4 RETURNING *",
        )
        .bind(&data.answers)
        .bind(&data.analysis)
        .bind(data.total_score)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM attempt_details WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM attempt_details WHERE id = $1")
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
            "SELECT * FROM attempt_details ORDER BY submitted_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attempt_details")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

crate::impl_paginatable_for!(AttemptDetail, AttemptDetailCreate, Uuid);

impl AttemptDetail {
    pub async fn list_for_attempt(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        attempt_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM attempt_details WHERE attempt_id = $1 ORDER BY submitted_at",
        )
        .bind(attempt_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn latest_for_attempt(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        attempt_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM attempt_details WHERE attempt_id = $1 ORDER BY submitted_at DESC LIMIT 1",
        )
        .bind(attempt_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn delete_for_attempt(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        attempt_id: Uuid,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM attempt_details WHERE attempt_id = $1")
            .bind(attempt_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected())
    }
}
