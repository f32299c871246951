//! Subcommand implementations.

pub mod context;
pub mod detect;
pub mod doctor;
pub mod init;
pub mod prompt;
pub mod retrieve;
pub mod stats;
pub mod validate;

use std::path::Path;
use vecta_config::AppConfig;
use vecta_context::{ContextEngine, ContextRequest};

use crate::RequestArgs;

pub(crate) fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load_with_env(path).map_err(|e| format!("Failed to load config: {e}"))?)
}

pub(crate) async fn load_engine(
    config: &AppConfig,
) -> Result<ContextEngine, Box<dyn std::error::Error>> {
    Ok(ContextEngine::from_config(config)
        .await
        .map_err(|e| format!("Failed to load data: {e}"))?)
}

impl RequestArgs {
    pub(crate) fn to_request(&self) -> ContextRequest {
        let mut request = ContextRequest::new(self.query.clone());
        request.specialty_hint = self.specialty.clone();
        request.analysis_type = self.analysis_type.clone();
        request.num_examples = self.num_examples;
        request.guideline_char_budget = self.budget;
        request.use_retrieval = self.retrieval;
        if self.no_guidelines {
            request.include_guidelines = Some(false);
        }
        request
    }
}
