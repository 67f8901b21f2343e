use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{CrudRepository, DatabaseResult, HasOwner, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

pub const POOL_ACTIVE: &str = "active";
pub const POOL_ARCHIVED: &str = "archived";

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct TestPool {
    id: Uuid,
    base_test_id: Uuid,
    created_by: Option<Uuid>,
    title: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TestPoolCreate {
    pub base_test_id: Uuid,
    pub created_by: Option<Uuid>,
    pub title: String,
    pub status: Option<String>,
}

impl ResourceTyped for TestPool {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::TestPool
    }
}

impl TestPool {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn base_test_id(&self) -> Uuid {
        self.base_test_id
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

#[async_trait]
impl CrudRepository<TestPool, TestPoolCreate, Uuid> for TestPool {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TestPoolCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO test_pools (id, base_test_id, created_by, title, status) VALUES ($1,$2,$3,$4,$5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.base_test_id)
        .bind(data.created_by)
        .bind(&data.title)
        .bind(data.status.as_deref().unwrap_or(POOL_ACTIVE))
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TestPoolCreate,
    ) -> DatabaseResult<Self> {
        let status = data.status.unwrap_or(self.status);
        let result = sqlx::query_as(
            "UPDATE test_pools SET title = $1, status = $2 WHERE id = $3 RETURNING *",
        )
        .bind(&data.title)
        .bind(&status)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM test_pools WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM test_pools WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM test_pools ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_pools")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for TestPool {
    type OwnerId = Option<Uuid>;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.created_by)
    }
}

impl TestPool {
    pub async fn find_active_for_test(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        base_test_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM test_pools WHERE base_test_id = $1 AND status = $2 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(base_test_id)
        .bind(POOL_ACTIVE)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }
}
