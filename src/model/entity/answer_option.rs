use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct AnswerOption {
    id: Uuid,
    question_id: Uuid,
    option_text: String,
    is_correct: bool,
    order_index: i32,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AnswerOptionCreate {
    pub question_id: Uuid,
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub order_index: Option<i32>,
}

impl ResourceTyped for AnswerOption {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::AnswerOption
    }
}

impl AnswerOption {
    pub fn new(id: Uuid, question_id: Uuid, option_text: &str, is_correct: bool, order_index: i32) -> Self {
        Self {
            id,
            question_id,
            option_text: option_text.to_string(),
            is_correct,
            order_index,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn option_text(&self) -> &str {
        &self.option_text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[async_trait]
impl CrudRepository<AnswerOption, AnswerOptionCreate, Uuid> for AnswerOption {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerOptionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO answer_options (id, question_id, option_text, is_correct, order_index)
            VALUES ($1, $2, $3, $4,
                COALESCE($5, (SELECT COALESCE(MAX(order_index) + 1, 0) FROM answer_options WHERE question_id = $2)))
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.question_id)
        .bind(&data.option_text)
        .bind(data.is_correct)
        .bind(data.order_index)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerOptionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE answer_options SET option_text = $1, is_correct = $2, order_index = $3 WHERE id = $4 RETURNING *",
        )
        .bind(&data.option_text)
        .bind(data.is_correct)
        .bind(data.order_index.unwrap_or(self.order_index))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM answer_options WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM answer_options WHERE id = $1")
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
            "SELECT * FROM answer_options ORDER BY question_id, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answer_options")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}
