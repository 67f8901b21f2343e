use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseResult, HasOwner, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value {
            "PAID" => Self::Paid,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Payment {
    id: Uuid,
    order_code: i64,
    user_id: Uuid,
    course_id: Uuid,
    amount: i64,
    currency: String,
    status: String,
    description: String,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub order_code: i64,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseRevenue {
    pub course_id: Uuid,
    pub title: String,
    pub revenue: i64,
    pub paid_count: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct PaymentTotals {
    pub total_revenue: i64,
    pub total: i64,
    pub pending: i64,
    pub paid: i64,
    pub cancelled: i64,
}

impl ResourceTyped for Payment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Payment
    }
}

impl Payment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn order_code(&self) -> i64 {
        self.order_code
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from(self.status.as_str())
    }
}

#[async_trait]
impl CrudRepository<Payment, PaymentCreate, Uuid> for Payment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: PaymentCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO payments (id, order_code, user_id, course_id, amount, currency, status, description) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.order_code)
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(data.amount)
        .bind(&data.currency)
        .bind(PaymentStatus::Pending.as_str())
        .bind(&data.description)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: PaymentCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE payments SET amount = $1, description = $2, updated_at = now() WHERE id = $3 RETURNING *",
        )
        .bind(data.amount)
        .bind(&data.description)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM payments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM payments WHERE id = $1")
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
            "SELECT * FROM payments ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

crate::impl_paginatable_for!(Payment, PaymentCreate, Uuid);

#[async_trait]
impl HasOwner for Payment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Payment {
    pub async fn find_by_order_code(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        order_code: i64,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM payments WHERE order_code = $1")
            .bind(order_code)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Moves a pending payment to `status`. Returns `None` when the row is no
    /// longer pending, so a repeated webhook never flips a settled payment.
    pub async fn settle(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: PaymentStatus,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            UPDATE payments
            SET status = $1,
                paid_at = CASE WHEN $1 = 'PAID' THEN now() ELSE paid_at END,
                updated_at = now()
            WHERE id = $2 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(self.id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn list_for_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn list_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM payments WHERE course_id = $1 ORDER BY created_at DESC",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn totals(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<PaymentTotals> {
        let result = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE status = 'PAID'), 0)::bigint AS total_revenue,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending,
                COUNT(*) FILTER (WHERE status = 'PAID') AS paid,
                COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled
            FROM payments
            "#,
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn top_courses(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
    ) -> DatabaseResult<Vec<CourseRevenue>> {
        let result = sqlx::query_as(
            r#"
            SELECT c.id AS course_id, c.title,
                SUM(p.amount)::bigint AS revenue,
                COUNT(*) AS paid_count
            FROM payments p
            JOIN courses c ON c.id = p.course_id
            WHERE p.status = 'PAID'
            GROUP BY c.id, c.title
            ORDER BY revenue DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
