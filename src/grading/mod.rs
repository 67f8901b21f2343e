pub mod analysis;
pub mod client;
mod error;
pub use error::{GradingError, GradingResult, SubmissionError, SubmissionResult};
pub mod payload;
pub mod report;
pub mod scoring;
pub(crate) use scoring::round2;
mod service;
pub use service::{
    StartAttempt, SubmissionOutcome, SubmissionSettings, SubmissionSummary, SubmitAttempt,
    build_profile, start_attempt, submit_attempt,
};

pub use client::{DisabledGradingService, GradingService, HttpGradingService, grade_with_retry};
