use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::entity::QuestionWithOptions;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestInfo {
    pub title: String,
    pub total_questions: usize,
}

/// One answer key entry; `id` is the 1-based position of the question in its test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerKeyEntry {
    pub id: u32,
    pub question: String,
    pub answer: Option<String>,
    pub skill: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestHistoryItem {
    pub test_date: String,
    pub level_at_test: String,
    pub score: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningProfile {
    pub student_id: String,
    pub name: String,
    pub current_level: String,
    pub study_hours_per_week: i64,
    pub learning_goals: String,
    pub learning_preferences: Vec<String>,
    pub study_methods: Vec<String>,
    pub test_history: Vec<TestHistoryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    pub test_info: TestInfo,
    pub answer_key: Vec<AnswerKeyEntry>,
    pub student_answers: BTreeMap<u32, String>,
    pub use_gemini: bool,
    pub profile: LearningProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct PerQuestionResult {
    pub id: u32,
    #[serde(default)]
    pub question: Option<String>,
    pub correct: bool,
    #[serde(default)]
    pub expected_answer: String,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub explain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct SkillSummary {
    pub skill: String,
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeResponse {
    pub total_score: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub per_question: Vec<PerQuestionResult>,
    #[serde(default)]
    pub skill_summary: Vec<SkillSummary>,
    #[serde(default)]
    pub weak_topics: Vec<String>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
    #[serde(default)]
    pub personalized_plan: Option<serde_json::Value>,
}

/// The service answers either with the bare response or wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GradeEnvelope {
    Wrapped { data: GradeResponse },
    Bare(GradeResponse),
}

impl GradeEnvelope {
    pub fn into_inner(self) -> GradeResponse {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(response) => response,
        }
    }
}

pub fn build_answer_key(questions: &[QuestionWithOptions]) -> Vec<AnswerKeyEntry> {
    questions
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let topic = q.question.topic();
            AnswerKeyEntry {
                id: index as u32 + 1,
                question: q.question.question_text().to_string(),
                answer: q.correct_option().map(|o| o.option_text().to_string()),
                skill: q.question.skill().map(str::to_string),
                topic: if topic.is_empty() {
                    None
                } else {
                    Some(topic.join(", "))
                },
            }
        })
        .collect()
}
