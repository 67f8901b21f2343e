use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::grading::{
    error::{GradingError, GradingResult},
    payload::{GradeEnvelope, GradeRequest, GradeResponse},
};

const BASE_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF: Duration = Duration::from_secs(5);

#[async_trait]
pub trait GradingService: Send + Sync + std::fmt::Debug {
    async fn grade(&self, request: &GradeRequest) -> GradingResult<GradeResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpGradingService {
    client: Client,
    base_url: String,
}

impl HttpGradingService {
    pub fn new(base_url: &str, timeout: Duration) -> GradingResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("studyhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GradingError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &crate::config::Grading) -> GradingResult<Self> {
        Self::new(config.url(), Duration::from_secs(config.timeout_secs()))
    }
}

#[async_trait]
impl GradingService for HttpGradingService {
    async fn grade(&self, request: &GradeRequest) -> GradingResult<GradeResponse> {
        let url = format!("{}/grade", self.base_url);
        debug!(url = %url, questions = request.answer_key.len(), "calling grading service");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(GradingError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GradingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(GradingError::from_transport)?;
        let envelope: GradeEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.into_inner())
    }
}

#[derive(Debug, Default, Clone)]
pub struct DisabledGradingService;

#[async_trait]
impl GradingService for DisabledGradingService {
    async fn grade(&self, _request: &GradeRequest) -> GradingResult<GradeResponse> {
        Err(GradingError::Disabled)
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    2u64.checked_pow(attempt)
        .and_then(|factor| BASE_BACKOFF_MS.checked_mul(factor))
        .map_or(MAX_BACKOFF, |ms| Duration::from_millis(ms).min(MAX_BACKOFF))
}

/// Calls `service` up to `retries + 1` times, backing off 100ms, 200ms,
/// 400ms... up to `MAX_BACKOFF` between retryable failures.
pub async fn grade_with_retry(
    service: &dyn GradingService,
    request: &GradeRequest,
    retries: u32,
) -> GradingResult<GradeResponse> {
    let mut attempt = 0;
    loop {
        match service.grade(request).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() && attempt < retries => {
                let delay = backoff_delay(attempt);
                warn!(error = %e, attempt = attempt + 1, ?delay, "grading call failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    use super::*;
    use crate::grading::payload::{LearningProfile, TestInfo};

    fn request() -> GradeRequest {
        GradeRequest {
            test_info: TestInfo {
                title: "Placement".into(),
                total_questions: 1,
            },
            answer_key: vec![],
            student_answers: BTreeMap::from([(1, "ARE".to_string())]),
            use_gemini: true,
            profile: LearningProfile {
                student_id: "s1".into(),
                name: "Student".into(),
                current_level: "A2".into(),
                study_hours_per_week: 3,
                learning_goals: String::new(),
                learning_preferences: vec![],
                study_methods: vec![],
                test_history: vec![],
            },
        }
    }

    fn graded() -> serde_json::Value {
        json!({
            "total_score": 1,
            "total_questions": 1,
            "per_question": [{"id": 1, "correct": true, "expected_answer": "ARE", "user_answer": "ARE", "explain": "Good"}],
            "skill_summary": [],
            "weak_topics": [],
            "recommendations": ["Keep going"]
        })
    }

    #[tokio::test]
    async fn posts_payload_and_unwraps_data_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/grade"))
            .and(body_partial_json(json!({"student_answers": {"1": "ARE"}, "use_gemini": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": graded() })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpGradingService::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let response = client.grade(&request()).await.unwrap();
        assert_eq!(response.total_score, 1);
        assert_eq!(response.per_question[0].explain.as_deref(), Some("Good"));
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/grade"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/grade"))
            .respond_with(ResponseTemplate::new(200).set_body_json(graded()))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpGradingService::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let response = grade_with_retry(&client, &request(), 3).await.unwrap();
        assert_eq!(response.recommendations, Some(vec!["Keep going".to_string()]));
    }

    #[test]
    fn backoff_doubles_then_saturates() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(2), Duration::from_millis(400));
        assert_eq!(backoff_delay(10), MAX_BACKOFF);
        assert_eq!(backoff_delay(62), MAX_BACKOFF);
        assert_eq!(backoff_delay(64), MAX_BACKOFF);
        assert_eq!(backoff_delay(u32::MAX), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/grade"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad payload"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpGradingService::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = grade_with_retry(&client, &request(), 3).await.unwrap_err();
        assert!(matches!(err, GradingError::Status { status: 422, .. }));
    }

    #[tokio::test]
    async fn gives_up_after_configured_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/grade"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = HttpGradingService::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = grade_with_retry(&client, &request(), 2).await.unwrap_err();
        assert!(matches!(err, GradingError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn timeouts_are_reported_as_such() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/grade"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(graded())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = HttpGradingService::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.grade(&request()).await.unwrap_err();
        assert!(matches!(err, GradingError::Timeout));
    }

    #[tokio::test]
    async fn disabled_service_fails_without_retry() {
        let err = grade_with_retry(&DisabledGradingService, &request(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::Disabled));
    }
}
