use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseResult, HasOwner, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseRating {
    id: Uuid,
    course_id: Uuid,
    user_id: Uuid,
    rating: i32,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseRatingCreate {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub content: String,
}

impl ResourceTyped for CourseRating {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::CourseRating
    }
}

impl CourseRating {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[async_trait]
impl CrudRepository<CourseRating, CourseRatingCreate, Uuid> for CourseRating {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseRatingCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO course_ratings (id, course_id, user_id, rating, content)
            VALUES ($1,$2,$3,$4,$5)
            ON CONFLICT (course_id, user_id)
            DO UPDATE SET rating = EXCLUDED.rating, content = EXCLUDED.content, created_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(data.user_id)
        .bind(data.rating)
        .bind(&data.content)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseRatingCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE course_ratings SET rating = $1, content = $2 WHERE id = $3 RETURNING *",
        )
        .bind(data.rating)
        .bind(&data.content)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM course_ratings WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM course_ratings WHERE id = $1")
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
            "SELECT * FROM course_ratings ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_ratings")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for CourseRating {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl CourseRating {
    pub async fn list_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM course_ratings WHERE course_id = $1 ORDER BY created_at DESC",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
