use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{AnswerOption, QuestionType, QuestionWithOptions};

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    /// `A` is the first option, case-insensitive.
    pub answer_letter: Option<String>,
    pub answer_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct ScoredAnswer {
    pub question_id: Uuid,
    pub question_number: u32,
    pub question_text: String,
    pub question_type: QuestionType,
    pub selected_option_id: Option<Uuid>,
    pub selected_option_text: String,
    pub is_correct: Option<bool>,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreSheet {
    pub answers: Vec<ScoredAnswer>,
    pub total_score: f64,
    pub max_score: f64,
}

impl ScoreSheet {
    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.is_correct == Some(true))
            .count()
    }

    pub fn scaled_score(&self) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        round2(self.total_score / self.max_score * 10.0)
    }

    pub fn student_answers(&self) -> BTreeMap<u32, String> {
        self.answers
            .iter()
            .filter(|a| !a.selected_option_text.trim().is_empty())
            .map(|a| (a.question_number, a.selected_option_text.clone()))
            .collect()
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn points_of(question: &QuestionWithOptions) -> f64 {
    let points = question.question.points();
    if points > 0.0 { points } else { 1.0 }
}

fn option_by_letter<'a>(options: &'a [AnswerOption], letter: &str) -> Option<&'a AnswerOption> {
    let mut chars = letter.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    options.get((c as u8 - b'A') as usize)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn score_one(number: u32, question: &QuestionWithOptions, answer: &SubmittedAnswer) -> ScoredAnswer {
    let options = question.options();

    let selected = answer
        .selected_option_id
        .and_then(|id| options.iter().find(|o| o.id() == id))
        .or_else(|| {
            answer
                .answer_letter
                .as_deref()
                .and_then(|letter| option_by_letter(options, letter))
        });

    let selected_option_text = selected
        .map(|o| o.option_text().to_string())
        .or_else(|| answer.answer_text.clone())
        .unwrap_or_default();

    let question_type = question.question.question_type();
    let points = points_of(question);

    let is_correct = match question_type {
        QuestionType::Mcq => Some(selected.map(|o| o.is_correct()).unwrap_or(false)),
        QuestionType::FillBlank => question.correct_option().map(|expected| {
            !selected_option_text.trim().is_empty()
                && normalize(&selected_option_text) == normalize(expected.option_text())
        }),
        QuestionType::Essay | QuestionType::Speaking => None,
    };

    ScoredAnswer {
        question_id: question.question.id(),
        question_number: number,
        question_text: question.question.question_text().to_string(),
        question_type,
        selected_option_id: selected.map(|o| o.id()),
        selected_option_text,
        score: if is_correct == Some(true) { points } else { 0.0 },
        is_correct,
    }
}

/// Scores `answers` against `questions` (the whole test, in order).
/// Unknown question ids are skipped and a repeated question keeps its last answer.
pub fn score_answers(questions: &[QuestionWithOptions], answers: &[SubmittedAnswer]) -> ScoreSheet {
    let by_id: HashMap<Uuid, (u32, &QuestionWithOptions)> = questions
        .iter()
        .enumerate()
        .map(|(index, q)| (q.question.id(), (index as u32 + 1, q)))
        .collect();

    let mut scored: BTreeMap<u32, ScoredAnswer> = BTreeMap::new();
    for answer in answers {
        let Some((number, question)) = by_id.get(&answer.question_id) else {
            tracing::debug!("skipping answer for unknown question {}", answer.question_id);
            continue;
        };
        scored.insert(*number, score_one(*number, question, answer));
    }

    let answers: Vec<ScoredAnswer> = scored.into_values().collect();
    let total_score = round2(answers.iter().map(|a| a.score).sum());
    let max_score = round2(questions.iter().map(points_of).sum());

    ScoreSheet {
        answers,
        total_score,
        max_score,
    }
}
