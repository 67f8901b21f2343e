use std::collections::{BTreeMap, HashMap, HashSet};

use crate::grading::{
    payload::{AnswerKeyEntry, GradeResponse, PerQuestionResult, SkillSummary},
    scoring::round2,
};

const UNKNOWN_SKILL: &str = "Unknown";
const WEAK_TOPICS_PER_SKILL: usize = 2;
const MAX_WEAK_TOPICS: usize = 3;

#[derive(Default)]
struct SkillStats {
    total: u32,
    correct: u32,
    topics: Vec<(String, u32)>,
}

pub fn grade_locally(
    answer_key: &[AnswerKeyEntry],
    student_answers: &BTreeMap<u32, String>,
) -> GradeResponse {
    let mut total_correct = 0;
    let mut per_question = Vec::with_capacity(answer_key.len());
    let mut skill_order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, SkillStats> = HashMap::new();

    for entry in answer_key {
        let expected = entry
            .answer
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        let given = student_answers.get(&entry.id).map(|s| s.trim().to_uppercase());

        let correct = given.as_deref() == Some(expected.as_str());
        if correct {
            total_correct += 1;
        }

        let explain = if correct {
            String::new()
        } else {
            let got = match student_answers.get(&entry.id) {
                Some(raw) if !raw.is_empty() => raw.as_str(),
                _ => "no answer",
            };
            format!("Expected {expected} but got {got}")
        };

        per_question.push(PerQuestionResult {
            id: entry.id,
            question: Some(entry.question.clone()),
            correct,
            expected_answer: expected,
            user_answer: given.filter(|g| !g.is_empty()),
            skill: entry.skill.clone(),
            topic: entry.topic.clone(),
            explain: Some(explain),
        });

        let skill = entry
            .skill
            .clone()
            .unwrap_or_else(|| UNKNOWN_SKILL.to_string());
        if !stats.contains_key(&skill) {
            skill_order.push(skill.clone());
        }
        let st = stats.entry(skill).or_default();
        st.total += 1;
        if correct {
            st.correct += 1;
        }
        if let Some(topic) = entry.topic.as_ref().filter(|t| !t.is_empty()) {
            let miss = if correct { 0 } else { 1 };
            match st.topics.iter_mut().find(|(name, _)| name == topic) {
                Some((_, count)) => *count += miss,
                None => st.topics.push((topic.clone(), miss)),
            }
        }
    }

    let mut skill_summary = Vec::with_capacity(skill_order.len());
    let mut weak_candidates = Vec::new();
    for skill in &skill_order {
        let Some(st) = stats.get(skill) else {
            continue;
        };
        let accuracy = if st.total > 0 {
            st.correct as f64 / st.total as f64 * 100.0
        } else {
            0.0
        };
        skill_summary.push(SkillSummary {
            skill: skill.clone(),
            total: st.total,
            correct: st.correct,
            accuracy: round2(accuracy),
        });

        // stable sort keeps first-seen order among equal counts
        let mut topics = st.topics.clone();
        topics.sort_by(|a, b| b.1.cmp(&a.1));
        for (topic, _) in topics.into_iter().take(WEAK_TOPICS_PER_SKILL) {
            weak_candidates.push(format!("{skill} - {topic}"));
        }
    }

    let mut seen = HashSet::new();
    let weak_topics: Vec<String> = weak_candidates
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_WEAK_TOPICS)
        .collect();

    GradeResponse {
        total_score: total_correct,
        total_questions: answer_key.len() as u32,
        per_question,
        skill_summary,
        weak_topics,
        recommendations: None,
        personalized_plan: None,
    }
}
