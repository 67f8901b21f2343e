use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::entity::StudyLogCreate,
    utils::validation::{ValidationError, ValidationResult},
};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StudyLogBody {
    pub lesson_id: Option<Uuid>,
    pub duration_minutes: i32,
}

impl StudyLogBody {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.duration_minutes <= 0 {
            return Err(ValidationError::Other(String::from(
                "duration_minutes must be positive",
            )));
        }
        Ok(())
    }

    pub fn into_create(self, user_id: Uuid) -> StudyLogCreate {
        StudyLogCreate {
            user_id,
            lesson_id: self.lesson_id,
            duration_minutes: self.duration_minutes,
            studied_at: None,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}
