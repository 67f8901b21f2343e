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
pub struct Certificate {
    id: Uuid,
    cert_code: String,
    cert_hash: String,
    user_id: Uuid,
    course_id: Uuid,
    metadata: Option<serde_json::Value>,
    signature: Option<String>,
    signed_by: Option<String>,
    issue_date: DateTime<Utc>,
    expire_date: Option<DateTime<Utc>>,
    is_revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateCreate {
    pub cert_code: String,
    pub cert_hash: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub metadata: serde_json::Value,
    pub signature: String,
    pub signed_by: String,
    pub issue_date: DateTime<Utc>,
    pub expire_date: Option<DateTime<Utc>>,
}

impl ResourceTyped for Certificate {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Certificate
    }
}

impl Certificate {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cert_code(&self) -> &str {
        &self.cert_code
    }

    pub fn cert_hash(&self) -> &str {
        &self.cert_hash
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn signed_by(&self) -> Option<&str> {
        self.signed_by.as_deref()
    }

    pub fn expire_date(&self) -> Option<&DateTime<Utc>> {
        self.expire_date.as_ref()
    }

    pub fn issue_date(&self) -> &DateTime<Utc> {
        &self.issue_date
    }

    pub fn is_revoked(&self) -> bool {
        self.is_revoked
    }
}

#[async_trait]
impl CrudRepository<Certificate, CertificateCreate, Uuid> for Certificate {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CertificateCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO certificates (id, cert_code, cert_hash, user_id, course_id, metadata, signature, signed_by, issue_date, expire_date) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.cert_code)
        .bind(&data.cert_hash)
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(&data.metadata)
        .bind(&data.signature)
        .bind(&data.signed_by)
        .bind(data.issue_date)
        .bind(data.expire_date)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CertificateCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE certificates SET cert_hash = $1, metadata = $2, signature = $3, signed_by = $4, expire_date = $5 \
             WHERE id = $6 RETURNING *",
        )
        .bind(&data.cert_hash)
        .bind(&data.metadata)
        .bind(&data.signature)
        .bind(&data.signed_by)
        .bind(data.expire_date)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM certificates WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM certificates WHERE id = $1")
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
            "SELECT * FROM certificates ORDER BY issue_date DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Certificate {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Certificate {
    pub async fn find_by_code(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        code: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM certificates WHERE cert_code = $1")
            .bind(code)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_hash(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        hash: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM certificates WHERE lower(cert_hash) = lower($1)")
            .bind(hash)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_for_user_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM certificates WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
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
            "SELECT * FROM certificates WHERE user_id = $1 ORDER BY issue_date DESC",
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM certificates ORDER BY issue_date DESC")
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn revoke(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "UPDATE certificates SET is_revoked = true, revoked_at = COALESCE(revoked_at, now()) WHERE id = $1 RETURNING *",
        )
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
