use std::sync::Arc;

use crate::{grading::GradingService, model::ModelManager};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    grader: Arc<dyn GradingService>,
}

impl AppState {
    pub fn new(mm: ModelManager, grader: Arc<dyn GradingService>) -> Self {
        Self { mm, grader }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn grader(&self) -> &dyn GradingService {
        self.grader.as_ref()
    }
}
