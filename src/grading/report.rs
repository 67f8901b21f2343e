use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    grading::{
        payload::{AnswerKeyEntry, GradeResponse, PerQuestionResult, SkillSummary},
        scoring::{ScoreSheet, round2},
    },
    model::entity::QuestionType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Ai,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct ReportRow {
    pub question_number: u32,
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub selected_option_id: Option<Uuid>,
    pub selected_option_text: String,
    pub expected_answer: Option<String>,
    pub is_correct: Option<bool>,
    pub score: f64,
    pub skill: Option<String>,
    pub topic: Option<String>,
    pub explain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct AttemptReport {
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub correct_count: usize,
    pub answered: usize,
    pub total_questions: usize,
    pub rows: Vec<ReportRow>,
    pub skill_summary: Vec<SkillSummary>,
    pub weak_topics: Vec<String>,
    pub recommendations: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub personalized_plan: Option<serde_json::Value>,
    pub source: ReportSource,
    /// Question numbers where the service and local scoring disagree.
    pub discrepancies: Vec<u32>,
}

impl AttemptReport {
    pub fn feedback(&self) -> Option<String> {
        if self.recommendations.is_empty() {
            None
        } else {
            Some(self.recommendations.join("\n"))
        }
    }
}

/// Merges local scoring with the analysis of the grading service, or with the
/// local fallback analysis when `ai` is `None`. Scores always come from the
/// local sheet.
pub fn format_attempt_result_for_report(
    sheet: &ScoreSheet,
    answer_key: &[AnswerKeyEntry],
    ai: Option<&GradeResponse>,
    local: &GradeResponse,
) -> AttemptReport {
    let analysis = ai.unwrap_or(local);
    let source = if ai.is_some() {
        ReportSource::Ai
    } else {
        ReportSource::Local
    };

    let keys: HashMap<u32, &AnswerKeyEntry> = answer_key.iter().map(|k| (k.id, k)).collect();
    let analysed: HashMap<u32, &PerQuestionResult> =
        analysis.per_question.iter().map(|p| (p.id, p)).collect();

    let mut discrepancies = Vec::new();
    let rows = sheet
        .answers
        .iter()
        .map(|answer| {
            let key = keys.get(&answer.question_number);
            let remote = analysed.get(&answer.question_number);

            if let (Some(_), Some(remote), Some(local_correct)) = (ai, remote, answer.is_correct) {
                if answer.question_type.is_auto_graded() && remote.correct != local_correct {
                    discrepancies.push(answer.question_number);
                }
            }

            ReportRow {
                question_number: answer.question_number,
                question_id: answer.question_id,
                question_text: answer.question_text.clone(),
                question_type: answer.question_type,
                selected_option_id: answer.selected_option_id,
                selected_option_text: answer.selected_option_text.clone(),
                expected_answer: key.and_then(|k| k.answer.clone()),
                is_correct: answer.is_correct,
                score: answer.score,
                skill: key.and_then(|k| k.skill.clone()),
                topic: key.and_then(|k| k.topic.clone()),
                explain: remote
                    .and_then(|r| r.explain.clone())
                    .filter(|e| !e.is_empty()),
            }
        })
        .collect();

    let percentage = if sheet.max_score > 0.0 {
        round2(sheet.total_score / sheet.max_score * 100.0)
    } else {
        0.0
    };

    AttemptReport {
        total_score: sheet.total_score,
        max_score: sheet.max_score,
        percentage,
        correct_count: sheet.correct_count(),
        answered: sheet.answers.len(),
        total_questions: answer_key.len(),
        rows,
        skill_summary: analysis.skill_summary.clone(),
        weak_topics: analysis.weak_topics.clone(),
        recommendations: analysis.recommendations.clone().unwrap_or_default(),
        personalized_plan: analysis.personalized_plan.clone(),
        source,
        discrepancies,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grading::{
        analysis::grade_locally,
        payload::build_answer_key,
        scoring::{SubmittedAnswer, fixtures::question, score_answers},
    };

    fn setup() -> (ScoreSheet, Vec<AnswerKeyEntry>) {
        let questions = vec![
            question("mcq", "She ___ a doctor", 1.0, Some("grammar"), &["to be"], &[("are", false), ("is", true)]),
            question("fill_blank", "I ___ coffee", 1.0, Some("grammar"), &["present simple"], &[("drink", true)]),
            question("essay", "Describe your city", 1.0, Some("writing"), &[], &[]),
        ];
        let answers = vec![
            SubmittedAnswer {
                question_id: questions[0].question.id(),
                selected_option_id: None,
                answer_letter: Some("B".into()),
                answer_text: None,
            },
            SubmittedAnswer {
                question_id: questions[1].question.id(),
                selected_option_id: None,
                answer_letter: None,
                answer_text: Some("drinks".into()),
            },
            SubmittedAnswer {
                question_id: questions[2].question.id(),
                selected_option_id: None,
                answer_letter: None,
                answer_text: Some("It is big".into()),
            },
        ];
        (score_answers(&questions, &answers), build_answer_key(&questions))
    }

    #[test]
    fn local_report_uses_fallback_analysis() {
        let (sheet, key) = setup();
        let local = grade_locally(&key, &sheet.student_answers());
        let report = format_attempt_result_for_report(&sheet, &key, None, &local);

        assert_eq!(report.source, ReportSource::Local);
        assert_eq!(report.total_score, 1.0);
        assert_eq!(report.max_score, 3.0);
        assert_eq!(report.percentage, 33.33);
        assert_eq!(report.correct_count, 1);
        assert_eq!(report.answered, 3);
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.rows[1].expected_answer.as_deref(), Some("drink"));
        assert_eq!(
            report.rows[1].explain.as_deref(),
            Some("Expected DRINK but got drinks")
        );
        assert!(report.rows[0].explain.is_none());
        assert_eq!(report.feedback(), None);
    }

    #[test]
    fn ai_report_keeps_local_scores_and_flags_disagreements() {
        let (sheet, key) = setup();
        let local = grade_locally(&key, &sheet.student_answers());

        let mut ai = local.clone();
        // service accepts "drinks" and rejects the essay
        ai.per_question[1].correct = true;
        ai.per_question[1].explain = Some("Close enough".into());
        ai.per_question[2].correct = false;
        ai.recommendations = Some(vec!["Practice verbs".into(), "Read more".into()]);

        let report = format_attempt_result_for_report(&sheet, &key, Some(&ai), &local);
        assert_eq!(report.source, ReportSource::Ai);
        assert_eq!(report.total_score, 1.0);
        assert_eq!(report.discrepancies, vec![2]);
        assert_eq!(report.rows[1].explain.as_deref(), Some("Close enough"));
        assert_eq!(report.feedback().as_deref(), Some("Practice verbs\nRead more"));
    }
}
