use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseResult, ModelManager, ResourceTyped, entity::AnswerOption,
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    FillBlank,
    Essay,
    Speaking,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::FillBlank => "fill_blank",
            Self::Essay => "essay",
            Self::Speaking => "speaking",
        }
    }

    pub fn is_auto_graded(&self) -> bool {
        matches!(self, Self::Mcq | Self::FillBlank)
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" | "multiple_choice" => Ok(Self::Mcq),
            "fill_blank" => Ok(Self::FillBlank),
            "essay" => Ok(Self::Essay),
            "speaking" => Ok(Self::Speaking),
            other => Err(format!("unknown question type `{other}`")),
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    test_id: Uuid,
    question_text: String,
    question_type: String,
    points: f64,
    skill: Option<String>,
    topic: Vec<String>,
    explanation: Option<String>,
    audio_url: Option<String>,
    image_url: Option<String>,
    order_index: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AnswerOptionInput {
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionCreate {
    pub test_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: Option<f64>,
    pub skill: Option<String>,
    #[serde(default)]
    pub topic: Vec<String>,
    pub explanation: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub order_index: Option<i32>,
    pub options: Option<Vec<AnswerOptionInput>>,
}

/// One question produced by a test generator: options as plain strings and
/// the correct answer as the text of one of them.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeneratedQuestion {
    pub question_text: String,
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    pub skill: Option<String>,
    #[serde(default)]
    pub topic: Vec<String>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuestionWithOptions {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub question: Question,
    #[schema(value_type = Vec<AnswerOption>)]
    pub options: Json<Vec<AnswerOption>>,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn test_id(&self) -> Uuid {
        self.test_id
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type.parse().unwrap_or(QuestionType::Mcq)
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn skill(&self) -> Option<&str> {
        self.skill.as_deref()
    }

    pub fn topic(&self) -> &[String] {
        &self.topic
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

pub fn points_per_question(count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (10.0 / count as f64 * 100.0).round() / 100.0
}

async fn insert_options(
    conn: &mut sqlx::PgConnection,
    question_id: Uuid,
    options: &[AnswerOptionInput],
) -> DatabaseResult<()> {
    for (index, option) in options.iter().enumerate() {
        sqlx::query(
            "INSERT INTO answer_options (id, question_id, option_text, is_correct, order_index) VALUES ($1,$2,$3,$4,$5)",
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(&option.option_text)
        .bind(option.is_correct)
        .bind(index as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;

        let order_index = match data.order_index {
            Some(index) => index,
            None => {
                sqlx::query_scalar(
                    "SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE test_id = $1",
                )
                .bind(data.test_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let question: Question = sqlx::query_as(
            "INSERT INTO questions (id, test_id, question_text, question_type, points, skill, topic, explanation, audio_url, image_url, order_index) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.test_id)
        .bind(&data.question_text)
        .bind(data.question_type.as_str())
        .bind(data.points.unwrap_or(1.0))
        .bind(&data.skill)
        .bind(&data.topic)
        .bind(&data.explanation)
        .bind(&data.audio_url)
        .bind(&data.image_url)
        .bind(order_index)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(options) = &data.options {
            insert_options(&mut tx, question.id, options).await?;
        }

        tx.commit().await?;
        Ok(question)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;

        let question: Question = sqlx::query_as(
            "UPDATE questions SET question_text = $1, question_type = $2, points = $3, skill = $4, topic = $5, \
             explanation = $6, audio_url = $7, image_url = $8, order_index = $9 WHERE id = $10 RETURNING *",
        )
        .bind(&data.question_text)
        .bind(data.question_type.as_str())
        .bind(data.points.unwrap_or(self.points))
        .bind(&data.skill)
        .bind(&data.topic)
        .bind(&data.explanation)
        .bind(&data.audio_url)
        .bind(&data.image_url)
        .bind(data.order_index.unwrap_or(self.order_index))
        .bind(self.id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(options) = &data.options {
            sqlx::query("DELETE FROM answer_options WHERE question_id = $1")
                .bind(self.id)
                .execute(&mut *tx)
                .await?;
            insert_options(&mut tx, self.id, options).await?;
        }

        tx.commit().await?;
        Ok(question)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = $1")
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
            "SELECT * FROM questions ORDER BY test_id, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl Question {
    /// Inserts a generated question set in one transaction. Points are split
    /// evenly over a 10 point scale and an option is correct iff it equals the answer.
    pub async fn bulk_create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        test_id: Uuid,
        items: Vec<GeneratedQuestion>,
    ) -> DatabaseResult<Vec<Self>> {
        let points = points_per_question(items.len());
        let mut tx = mm.begin().await?;
        let mut created = Vec::with_capacity(items.len());

        // appended after whatever the test already holds
        let first_index: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE test_id = $1",
        )
        .bind(test_id)
        .fetch_one(&mut *tx)
        .await?;

        for (offset, item) in (0i32..).zip(items) {
            let question_type = item.question_type.unwrap_or(if item.options.is_empty() {
                QuestionType::FillBlank
            } else {
                QuestionType::Mcq
            });

            let question: Question = sqlx::query_as(
                "INSERT INTO questions (id, test_id, question_text, question_type, points, skill, topic, explanation, order_index) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9) RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(test_id)
            .bind(&item.question_text)
            .bind(question_type.as_str())
            .bind(points)
            .bind(&item.skill)
            .bind(&item.topic)
            .bind(&item.explanation)
            .bind(first_index + offset)
            .fetch_one(&mut *tx)
            .await?;

            let mut options: Vec<AnswerOptionInput> = item
                .options
                .iter()
                .map(|text| AnswerOptionInput {
                    option_text: text.clone(),
                    is_correct: text.trim() == item.answer.trim(),
                })
                .collect();

            // fill-in questions keep their answer as the single correct option
            if options.is_empty() && !item.answer.trim().is_empty() {
                options.push(AnswerOptionInput {
                    option_text: item.answer.clone(),
                    is_correct: true,
                });
            }

            insert_options(&mut tx, question.id, &options).await?;
            created.push(question);
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn list_for_test(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        test_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM questions WHERE test_id = $1 ORDER BY order_index, created_at",
        )
        .bind(test_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

impl QuestionWithOptions {
    pub async fn fetch_for_test(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        test_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT q.*,
                COALESCE(
                    json_agg(
                        json_build_object(
                            'id', o.id,
                            'question_id', o.question_id,
                            'option_text', o.option_text,
                            'is_correct', o.is_correct,
                            'order_index', o.order_index
                        ) ORDER BY o.order_index
                    ) FILTER (WHERE o.id IS NOT NULL),
                    '[]'
                ) AS options
            FROM questions q
            LEFT JOIN answer_options o ON o.question_id = q.id
            WHERE q.test_id = $1
            GROUP BY q.id
            ORDER BY q.order_index, q.created_at
            "#,
        )
        .bind(test_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    pub fn options(&self) -> &[AnswerOption] {
        &self.options.0
    }

    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.0.iter().find(|o| o.is_correct())
    }
}
