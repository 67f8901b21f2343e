use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct TestEntity {
    id: Uuid,
    title: String,
    description: String,
    skill: String,
    level: String,
    duration_min: i32,
    passing_score: f64,
    max_attempts: i32,
    is_final: bool,
    course_id: Option<Uuid>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TestCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub skill: String,
    pub level: String,
    pub duration_min: i32,
    pub passing_score: f64,
    pub max_attempts: Option<i32>,
    #[serde(default)]
    pub is_final: bool,
    pub course_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl ResourceTyped for TestEntity {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Test
    }
}

impl TestEntity {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn skill(&self) -> &str {
        &self.skill
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn duration_min(&self) -> i32 {
        self.duration_min
    }

    pub fn passing_score(&self) -> f64 {
        self.passing_score
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn course_id(&self) -> Option<Uuid> {
        self.course_id
    }

    pub fn created_by(&self) -> Option<Uuid> {
        self.created_by
    }
}

#[async_trait]
impl CrudRepository<TestEntity, TestCreate, Uuid> for TestEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TestCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO tests (id, title, description, skill, level, duration_min, passing_score, max_attempts, is_final, course_id, created_by) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.skill)
        .bind(&data.level)
        .bind(data.duration_min)
        .bind(data.passing_score)
        .bind(data.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS))
        .bind(data.is_final)
        .bind(data.course_id)
        .bind(data.created_by)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TestCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE tests SET title = $1, description = $2, skill = $3, level = $4, duration_min = $5, \
             passing_score = $6, max_attempts = $7, is_final = $8, course_id = $9 WHERE id = $10 RETURNING *",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.skill)
        .bind(&data.level)
        .bind(data.duration_min)
        .bind(data.passing_score)
        .bind(data.max_attempts.unwrap_or(self.max_attempts))
        .bind(data.is_final)
        .bind(data.course_id)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM tests WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM tests WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM tests ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tests")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(TestEntity, TestCreate, Uuid);

#[async_trait]
impl HasOwner for TestEntity {
    type OwnerId = Option<Uuid>;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.created_by)
    }
}

impl TestEntity {
    pub async fn list_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM tests WHERE course_id = $1 ORDER BY is_final, created_at")
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_final_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM tests WHERE course_id = $1 AND is_final ORDER BY created_at DESC LIMIT 1",
        )
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }
}
