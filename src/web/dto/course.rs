use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::entity::{CourseCreate, CourseOverview, CourseRating, CourseRatingCreate},
    utils::validation::{
        ValidationError, ValidationResult, require, validate_level, validate_range,
    },
};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub level: Option<String>,
    #[serde(default)]
    pub cost: i64,
    pub teacher_id: Option<Uuid>,
}

impl CourseBody {
    pub fn validate(&self) -> ValidationResult<()> {
        require("title", &self.title)?;
        if let Some(level) = &self.level {
            validate_level(level.trim())?;
        }
        if self.cost < 0 {
            return Err(ValidationError::Other(String::from("cost must not be negative")));
        }
        Ok(())
    }

    pub fn into_create(self, teacher_id: Uuid, is_admin: bool) -> CourseCreate {
        let teacher_id = match self.teacher_id {
            Some(id) if is_admin => id,
            _ => teacher_id,
        };

        CourseCreate {
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category.trim().to_string(),
            level: self.level.map(|l| l.trim().to_string()),
            cost: self.cost,
            teacher_id: Some(teacher_id),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RatingBody {
    pub rating: i32,
    pub content: String,
}

impl RatingBody {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_range("rating", f64::from(self.rating), 1.0, 5.0)?;
        require("content", &self.content)
    }

    pub fn into_create(self, course_id: Uuid, user_id: Uuid) -> CourseRatingCreate {
        CourseRatingCreate {
            course_id,
            user_id,
            rating: self.rating,
            content: self.content.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub overview: CourseOverview,
    pub ratings: Vec<CourseRating>,
}
