use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    certificate::{self, Issuer},
    config::Config,
    error::log_error,
    grading::{
        analysis::grade_locally,
        client::{GradingService, grade_with_retry},
        error::{SubmissionError, SubmissionResult},
        payload::{GradeRequest, LearningProfile, TestHistoryItem, TestInfo, build_answer_key},
        report::{AttemptReport, format_attempt_result_for_report},
        scoring::{SubmittedAnswer, score_answers},
    },
    model::{
        CrudRepository, DatabaseError, DatabaseResult, ModelManager, check_access,
        entity::{
            AttemptDetail, AttemptDetailCreate, AttemptSubmission, Certificate,
            DEFAULT_EVALUATION_MODEL, QuestionWithOptions, StudyLog, TestAttempt,
            TestAttemptCreate, TestEntity, TestPool, UserEntity,
        },
    },
    web::AuthenticatedUser,
};

pub struct SubmissionSettings<'a> {
    pub retries: u32,
    pub use_ai: bool,
    pub issuer: Issuer<'a>,
    pub signing_key: &'a str,
}

impl SubmissionSettings<'static> {
    pub fn from_config(config: &'static Config) -> Self {
        Self {
            retries: config.grading().retries(),
            use_ai: config.grading().use_ai(),
            issuer: Issuer::from(config.certificate()),
            signing_key: config.certificate().signing_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct StartAttempt {
    pub test_id: Option<Uuid>,
    pub test_pool_id: Option<Uuid>,
    pub evaluation_model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SubmitAttempt {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    pub test_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SubmissionSummary {
    pub total_score: f64,
    pub max_score: f64,
    pub scaled_score: f64,
    pub answered: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SubmissionOutcome {
    pub attempt: TestAttempt,
    pub attempt_detail: AttemptDetail,
    pub summary: SubmissionSummary,
    pub report: AttemptReport,
    pub certificate: Option<Certificate>,
}

pub async fn start_attempt(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    data: StartAttempt,
) -> SubmissionResult<TestAttempt> {
    let test_id = match (data.test_id, data.test_pool_id) {
        (Some(test_id), _) => test_id,
        (None, Some(pool_id)) => TestPool::find_by_id(mm, actor, pool_id)
            .await?
            .ok_or(SubmissionError::TestNotFound)?
            .base_test_id(),
        (None, None) => return Err(SubmissionError::TestRequired),
    };

    let test = TestEntity::find_by_id(mm, actor, test_id)
        .await?
        .ok_or(SubmissionError::TestNotFound)?;

    let attempt = TestAttempt::create(
        mm,
        actor,
        TestAttemptCreate {
            user_id: actor.user_id(),
            test_id: test.id(),
            test_pool_id: data.test_pool_id,
            max_attempts: test.max_attempts(),
            evaluation_model: data.evaluation_model,
        },
    )
    .await?;

    info!(attempt_id = %attempt.id(), test_id = %test.id(), "attempt started");
    Ok(attempt)
}

pub async fn build_profile(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    learner: &UserEntity,
    test: &TestEntity,
) -> DatabaseResult<LearningProfile> {
    let week_ago = Utc::now() - Duration::days(7);
    let minutes = StudyLog::minutes_since(mm, actor, learner.id(), week_ago).await?;

    let test_history = TestAttempt::finished_with_tests(mm, actor, learner.id())
        .await?
        .into_iter()
        .map(|(attempt, level)| TestHistoryItem {
            test_date: attempt
                .end_time()
                .unwrap_or(attempt.start_time())
                .format("%Y-%m-%d")
                .to_string(),
            level_at_test: level,
            score: attempt.score().unwrap_or_default().round() as i64,
            notes: attempt.feedback().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(LearningProfile {
        student_id: learner.id().to_string(),
        name: learner.full_name().to_string(),
        current_level: test.level().to_string(),
        study_hours_per_week: (minutes as f64 / 60.0).round() as i64,
        learning_goals: learner.learning_goals().unwrap_or_default().to_string(),
        learning_preferences: vec![],
        study_methods: vec![],
        test_history,
    })
}

fn forbidden_or_database(e: DatabaseError) -> SubmissionError {
    match e {
        DatabaseError::Forbidden => SubmissionError::Forbidden,
        other => SubmissionError::Database(other),
    }
}

#[tracing::instrument(skip(mm, actor, grader, settings, data), fields(user_id = %actor.user_id()))]
pub async fn submit_attempt(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    grader: &dyn GradingService,
    settings: &SubmissionSettings<'_>,
    attempt_id: Uuid,
    data: SubmitAttempt,
) -> SubmissionResult<SubmissionOutcome> {
    if data.answers.is_empty() {
        return Err(SubmissionError::EmptyAnswers);
    }

    let attempt = TestAttempt::find_by_id(mm, actor, attempt_id)
        .await?
        .ok_or(SubmissionError::AttemptNotFound)?;
    check_access(mm, actor, &attempt, actor.user_id())
        .await
        .map_err(forbidden_or_database)?;

    if data.test_id.is_some_and(|id| id != attempt.test_id()) {
        return Err(SubmissionError::TestMismatch);
    }
    if attempt.is_exhausted() {
        return Err(SubmissionError::AttemptsExhausted {
            used: attempt.attempt_number(),
            max: attempt.max_attempts(),
        });
    }

    let test = TestEntity::find_by_id(mm, actor, attempt.test_id())
        .await?
        .ok_or(SubmissionError::TestNotFound)?;
    let learner = UserEntity::find_by_id(mm, actor, attempt.user_id())
        .await?
        .ok_or(SubmissionError::AttemptNotFound)?;

    let questions = QuestionWithOptions::fetch_for_test(mm, actor, test.id()).await?;
    let answer_key = build_answer_key(&questions);
    let sheet = score_answers(&questions, &data.answers);
    let student_answers = sheet.student_answers();
    let local = grade_locally(&answer_key, &student_answers);

    let ai = if settings.use_ai {
        let request = GradeRequest {
            test_info: TestInfo {
                title: test.title().to_string(),
                total_questions: questions.len(),
            },
            answer_key: answer_key.clone(),
            student_answers,
            use_gemini: attempt.evaluation_model() == DEFAULT_EVALUATION_MODEL,
            profile: build_profile(mm, actor, &learner, &test).await?,
        };
        match grade_with_retry(grader, &request, settings.retries).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(error = %e, "grading service failed, using local analysis");
                None
            }
        }
    } else {
        None
    };

    let report = format_attempt_result_for_report(&sheet, &answer_key, ai.as_ref(), &local);
    let scaled_score = sheet.scaled_score();
    let passed = scaled_score >= test.passing_score();
    let now = Utc::now();

    let mut tx = mm.begin().await?;
    let locked = attempt.lock_for_update(&mut *tx).await?;
    if locked.is_exhausted() {
        return Err(SubmissionError::AttemptsExhausted {
            used: locked.attempt_number(),
            max: locked.max_attempts(),
        });
    }
    let attempt_number = locked.attempt_number() + 1;

    let attempt_detail = AttemptDetail::insert(
        &mut *tx,
        &AttemptDetailCreate {
            attempt_id: locked.id(),
            attempt_number,
            answers: serde_json::to_value(&sheet.answers).map_err(DatabaseError::from)?,
            analysis: serde_json::to_value(&report).map_err(DatabaseError::from)?,
            total_score: sheet.total_score,
            submitted_at: now,
        },
    )
    .await?;
    let attempt = locked
        .record_submission(
            &mut *tx,
            &AttemptSubmission {
                score: scaled_score,
                attempt_number,
                feedback: report.feedback(),
                end_time: now,
            },
        )
        .await?;
    tx.commit().await?;

    info!(
        attempt_id = %attempt.id(),
        attempt_number,
        total_score = sheet.total_score,
        source = ?report.source,
        "attempt submitted"
    );

    let certificate = match (passed && test.is_final(), test.course_id()) {
        (true, Some(course_id)) => {
            issue_after_pass(mm, actor, settings, attempt.user_id(), course_id).await
        }
        _ => None,
    };

    Ok(SubmissionOutcome {
        summary: SubmissionSummary {
            total_score: sheet.total_score,
            max_score: sheet.max_score,
            scaled_score,
            answered: sheet.answers.len(),
            passed,
        },
        attempt,
        attempt_detail,
        report,
        certificate,
    })
}

/// Issues the course certificate unless one exists. Failures never fail the submission.
async fn issue_after_pass(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    settings: &SubmissionSettings<'_>,
    user_id: Uuid,
    course_id: Uuid,
) -> Option<Certificate> {
    match Certificate::find_for_user_course(mm, actor, user_id, course_id).await {
        Ok(Some(_)) => return None,
        Ok(None) => {}
        Err(e) => {
            log_error(&e);
            return None;
        }
    }

    match certificate::issue_certificate(
        mm,
        actor,
        user_id,
        course_id,
        &settings.issuer,
        settings.signing_key,
    )
    .await
    {
        Ok(certificate) => Some(certificate),
        Err(e) => {
            log_error(&e);
            None
        }
    }
}
