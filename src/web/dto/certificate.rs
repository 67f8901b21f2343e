use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct IssueCertificateBody {
    pub user_id: Option<Uuid>,
    pub course_id: Uuid,
}
