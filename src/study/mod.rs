mod stats;
pub use stats::{DailyStat, StudyStats, compute_stats, format_study_time, month_bounds};

use chrono::{Datelike, Utc};

use crate::{
    model::{DatabaseResult, ModelManager, entity::StudyLog},
    web::AuthenticatedUser,
};

pub async fn monthly_stats(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    month: Option<u32>,
    year: Option<i32>,
) -> DatabaseResult<Option<StudyStats>> {
    let now = Utc::now();
    let month = month.unwrap_or(now.month());
    let year = year.unwrap_or(now.year());

    let Some((from, to)) = month_bounds(year, month) else {
        return Ok(None);
    };

    let logs = StudyLog::list_between(mm, actor, actor.user_id(), from, to).await?;
    Ok(Some(compute_stats(year, month, &logs)))
}
