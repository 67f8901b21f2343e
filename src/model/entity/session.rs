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
pub struct Session {
    id: Uuid,
    #[serde(skip)]
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreate {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl ResourceTyped for Session {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Session
    }
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn expires_at(&self) -> &DateTime<Utc> {
        &self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[async_trait]
impl CrudRepository<Session, SessionCreate, Uuid> for Session {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SessionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as("INSERT INTO sessions (id, token, user_id, expires_at) VALUES ($1,$2,$3,$4) RETURNING id, token, user_id, expires_at, created_at")
            .bind(Uuid::new_v4())
            .bind(data.token)
            .bind(data.user_id)
            .bind(data.expires_at)
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SessionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE sessions SET expires_at = $1 WHERE id = $2")
            .bind(data.expires_at)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.expires_at = data.expires_at;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM sessions ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Session {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Session {
    pub async fn find_by_token(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        token: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    pub async fn delete_all_for_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(mm.executor())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_active_for_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND expires_at > now()")
                .bind(user_id)
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }

    pub async fn cleanup_expired(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE expires_at < now()"#)
            .execute(mm.executor())
            .await?;

        Ok(result.rows_affected())
    }
}
