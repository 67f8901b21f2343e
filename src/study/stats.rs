use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::StudyLog;

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub completed_lessons: usize,
    pub study_time_minutes: i64,
    pub cumulative_study_time_minutes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct StudyStats {
    pub month: u32,
    pub year: i32,
    pub completed_lessons: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub study_time_this_month: String,
    pub study_time_this_month_minutes: i64,
    pub daily_stats: Vec<DailyStat>,
}

pub fn format_study_time(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?),
    ))
}

/// Returns `(current, longest)`; `current` is the run ending on the last study day.
fn streaks(days: &BTreeSet<NaiveDate>) -> (u32, u32) {
    let mut current = 0;
    let mut longest = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        current = match previous {
            Some(prev) if (*day - prev).num_days() == 1 => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(*day);
    }

    (current, longest)
}

pub fn compute_stats(year: i32, month: u32, logs: &[StudyLog]) -> StudyStats {
    let empty = StudyStats {
        month,
        year,
        completed_lessons: 0,
        current_streak: 0,
        longest_streak: 0,
        study_time_this_month: format_study_time(0),
        study_time_this_month_minutes: 0,
        daily_stats: vec![],
    };
    let Some((start, end)) = month_bounds(year, month) else {
        return empty;
    };
    if logs.is_empty() {
        return empty;
    }

    let mut per_day: BTreeMap<NaiveDate, (HashSet<Uuid>, i64)> = BTreeMap::new();
    let mut lessons = HashSet::new();
    let mut total = 0;

    for log in logs {
        let day = log.studied_at().date_naive();
        let minutes = i64::from(log.duration_minutes());
        let entry = per_day.entry(day).or_default();
        entry.1 += minutes;
        if let Some(lesson) = log.lesson_id() {
            entry.0.insert(lesson);
            lessons.insert(lesson);
        }
        total += minutes;
    }

    let days: BTreeSet<NaiveDate> = per_day.keys().copied().collect();
    let (current_streak, longest_streak) = streaks(&days);

    let mut cumulative = 0;
    let daily_stats = start
        .date_naive()
        .iter_days()
        .take_while(|d| *d < end.date_naive())
        .map(|date| {
            let (lesson_count, minutes) = per_day
                .get(&date)
                .map(|(l, m)| (l.len(), *m))
                .unwrap_or_default();
            cumulative += minutes;
            DailyStat {
                date,
                completed_lessons: lesson_count,
                study_time_minutes: minutes,
                cumulative_study_time_minutes: cumulative,
            }
        })
        .collect();

    StudyStats {
        month: start.month(),
        year: start.year(),
        completed_lessons: lessons.len(),
        current_streak,
        longest_streak,
        study_time_this_month: format_study_time(total),
        study_time_this_month_minutes: total,
        daily_stats,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn log(day: u32, minutes: i32, lesson: Option<Uuid>) -> StudyLog {
        let at = Utc.with_ymd_and_hms(2025, 2, day, 10, 0, 0).unwrap();
        StudyLog::new(Uuid::nil(), lesson, minutes, at)
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_study_time(0), "0h 0m");
        assert_eq!(format_study_time(95), "1h 35m");
        assert_eq!(format_study_time(120), "2h 0m");
    }

    #[test]
    fn month_bounds_wrap_the_year() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert!(month_bounds(2024, 13).is_none());
    }

    #[test]
    fn empty_month_has_no_daily_stats() {
        let stats = compute_stats(2025, 2, &[]);
        assert_eq!(stats.study_time_this_month, "0h 0m");
        assert_eq!(stats.current_streak, 0);
        assert!(stats.daily_stats.is_empty());
    }

    #[test]
    fn streaks_lessons_and_cumulative_time() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let logs = vec![
            log(1, 30, Some(a)),
            log(2, 20, Some(a)),
            log(3, 15, Some(b)),
            log(3, 15, None),
            log(7, 40, Some(b)),
            log(8, 10, None),
        ];

        let stats = compute_stats(2025, 2, &logs);
        assert_eq!(stats.completed_lessons, 2);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.study_time_this_month_minutes, 130);
        assert_eq!(stats.study_time_this_month, "2h 10m");

        assert_eq!(stats.daily_stats.len(), 28);
        let third = &stats.daily_stats[2];
        assert_eq!(third.completed_lessons, 1);
        assert_eq!(third.study_time_minutes, 30);
        assert_eq!(third.cumulative_study_time_minutes, 80);
        assert_eq!(stats.daily_stats[27].cumulative_study_time_minutes, 130);
    }
}
