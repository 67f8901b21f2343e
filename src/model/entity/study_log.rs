use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseResult, HasOwner, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct StudyLog {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Option<Uuid>,
    duration_minutes: i32,
    studied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyLogCreate {
    pub user_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub duration_minutes: i32,
    pub studied_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for StudyLog {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::StudyLog
    }
}

impl StudyLog {
    pub fn new(
        user_id: Uuid,
        lesson_id: Option<Uuid>,
        duration_minutes: i32,
        studied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            lesson_id,
            duration_minutes,
            studied_at,
        }
    }

    pub fn lesson_id(&self) -> Option<Uuid> {
        self.lesson_id
    }

    pub fn duration_minutes(&self) -> i32 {
        self.duration_minutes
    }

    pub fn studied_at(&self) -> &DateTime<Utc> {
        &self.studied_at
    }
}

#[async_trait]
impl CrudRepository<StudyLog, StudyLogCreate, Uuid> for StudyLog {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: StudyLogCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO study_logs (id, user_id, lesson_id, duration_minutes, studied_at) \
             VALUES ($1,$2,$3,$4,COALESCE($5, now())) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.lesson_id)
        .bind(data.duration_minutes)
        .bind(data.studied_at)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: StudyLogCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE study_logs SET lesson_id = $1, duration_minutes = $2 WHERE id = $3 RETURNING *",
        )
        .bind(data.lesson_id)
        .bind(data.duration_minutes)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM study_logs WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM study_logs WHERE id = $1")
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
            "SELECT * FROM study_logs ORDER BY studied_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM study_logs")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for StudyLog {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl StudyLog {
    pub async fn list_between(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM study_logs WHERE user_id = $1 AND studied_at >= $2 AND studied_at < $3 ORDER BY studied_at",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn minutes_since(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(duration_minutes), 0)::bigint FROM study_logs WHERE user_id = $1 AND studied_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
