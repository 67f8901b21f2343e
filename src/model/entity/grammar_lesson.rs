use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::impl_paginatable_for;
use crate::{
    model::{CrudRepository, DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct GrammarLesson {
    id: Uuid,
    course_id: Option<Uuid>,
    title: String,
    slug: String,
    level: String,
    content: String,
    order_index: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GrammarLessonCreate {
    pub course_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub level: String,
    #[serde(default)]
    pub content: String,
    pub order_index: Option<i32>,
}

impl ResourceTyped for GrammarLesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::GrammarLesson
    }
}

impl GrammarLesson {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

#[async_trait]
impl CrudRepository<GrammarLesson, GrammarLessonCreate, Uuid> for GrammarLesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: GrammarLessonCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO grammar_lessons (id, course_id, title, slug, level, content, order_index) \
             VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.slug)
        .bind(&data.level)
        .bind(&data.content)
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: GrammarLessonCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE grammar_lessons SET course_id = $1, title = $2, slug = $3, level = $4, content = $5, \
             order_index = $6, updated_at = now() WHERE id = $7 RETURNING *",
        )
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.slug)
        .bind(&data.level)
        .bind(&data.content)
        .bind(data.order_index.unwrap_or(self.order_index))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM grammar_lessons WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM grammar_lessons WHERE id = $1")
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
            "SELECT * FROM grammar_lessons ORDER BY level, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grammar_lessons")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(GrammarLesson, GrammarLessonCreate, Uuid);

impl GrammarLesson {
    pub async fn find_by_slug(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        slug: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM grammar_lessons WHERE slug = $1")
            .bind(slug)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn list_filtered(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        level: Option<&str>,
        course_id: Option<Uuid>,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM grammar_lessons
            WHERE ($1::text IS NULL OR level = $1)
              AND ($2::uuid IS NULL OR course_id = $2)
            ORDER BY level, order_index
            "#,
        )
        .bind(level)
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
