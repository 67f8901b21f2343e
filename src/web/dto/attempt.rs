use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{
    AttemptDetail, AttemptHistoryRow, DEFAULT_MAX_ATTEMPTS, TestAttempt,
};

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct AttemptInfo {
    pub attempt_id: Option<Uuid>,
    pub attempt_number: i32,
    pub max_attempts: i32,
    pub score: f64,
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for AttemptInfo {
    fn default() -> Self {
        Self {
            attempt_id: None,
            attempt_number: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            score: 0.0,
            end_time: None,
        }
    }
}

impl From<&TestAttempt> for AttemptInfo {
    fn from(attempt: &TestAttempt) -> Self {
        Self {
            attempt_id: Some(attempt.id()),
            attempt_number: attempt.attempt_number(),
            max_attempts: attempt.max_attempts(),
            score: attempt.score().unwrap_or(0.0),
            end_time: attempt.end_time().copied(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AttemptWithDetails {
    pub attempt: TestAttempt,
    pub details: Vec<AttemptDetail>,
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct HistoryAttempt {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub total_score: Option<f64>,
    pub answer_count: i64,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct TestHistory {
    pub test_id: Uuid,
    pub title: String,
    pub skill: String,
    pub level: String,
    pub duration_min: i32,
    pub attempts: Vec<HistoryAttempt>,
}

pub fn group_history(rows: Vec<AttemptHistoryRow>) -> Vec<TestHistory> {
    let mut groups: Vec<TestHistory> = Vec::new();

    for row in rows {
        let attempt = HistoryAttempt {
            attempt_id: row.attempt_id,
            attempt_number: row.attempt_number,
            start_time: row.start_time,
            end_time: row.end_time,
            score: row.score,
            total_score: row.detail_total_score,
            answer_count: row.answer_count.unwrap_or(0),
            submitted_at: row.submitted_at,
        };

        match groups.iter_mut().find(|g| g.test_id == row.test_id) {
            Some(group) => group.attempts.push(attempt),
            None => groups.push(TestHistory {
                test_id: row.test_id,
                title: row.test_title,
                skill: row.skill,
                level: row.level,
                duration_min: row.duration_min,
                attempts: vec![attempt],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(test_id: Uuid, title: &str, number: i32) -> AttemptHistoryRow {
        AttemptHistoryRow {
            attempt_id: Uuid::new_v4(),
            test_id,
            test_title: title.into(),
            skill: "reading".into(),
            level: "B1".into(),
            duration_min: 30,
            attempt_number: number,
            start_time: Utc::now(),
            end_time: None,
            score: None,
            detail_total_score: None,
            answer_count: None,
            submitted_at: None,
        }
    }

    #[test]
    fn history_is_grouped_by_test() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = group_history(vec![row(a, "A", 2), row(b, "B", 1), row(a, "A", 1)]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].test_id, a);
        assert_eq!(grouped[0].attempts.len(), 2);
        assert_eq!(grouped[0].attempts[1].attempt_number, 1);
        assert_eq!(grouped[1].title, "B");
        assert_eq!(grouped[1].attempts[0].answer_count, 0);
    }

    #[test]
    fn attempt_info_defaults() {
        let info = AttemptInfo::default();
        assert_eq!(info.attempt_number, 0);
        assert_eq!(info.max_attempts, 3);
        assert_eq!(info.score, 0.0);
    }
}
