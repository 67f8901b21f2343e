use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::entity::GrammarLessonCreate,
    utils::validation::{ValidationResult, require, validate_level, validate_slug},
};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GrammarLessonBody {
    pub course_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub level: String,
    #[serde(default)]
    pub content: String,
    pub order_index: Option<i32>,
}

impl GrammarLessonBody {
    pub fn validate(&self) -> ValidationResult<()> {
        require("title", &self.title)?;
        require("slug", &self.slug)?;
        validate_slug(self.slug.trim())?;
        validate_level(self.level.trim())
    }

    pub fn into_create(self) -> GrammarLessonCreate {
        GrammarLessonCreate {
            course_id: self.course_id,
            title: self.title.trim().to_string(),
            slug: self.slug.trim().to_string(),
            level: self.level.trim().to_string(),
            content: self.content,
            order_index: self.order_index,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GrammarFilter {
    pub level: Option<String>,
    pub course_id: Option<Uuid>,
}
