//! External service boundary - risk assessment, report generation, place lookup

mod error;
mod gemini;
mod prompts;
mod simulator;

pub use error::ServiceError;
pub use gemini::GeminiClient;
pub use simulator::SimulatedService;

use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assessment::RiskAssessment;
use crate::places::PlaceRef;
use crate::sensors::{CapturedFrame, Coordinates, SensorSnapshot};

/// Multimodal risk scoring collaborator
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    async fn assess(&self, snapshot: &SensorSnapshot) -> Result<RiskAssessment, ServiceError>;
}

/// Free-form incident report collaborator
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, frame: Option<&CapturedFrame>) -> Result<String, ServiceError>;
}

/// Grounded place search collaborator
#[async_trait]
pub trait PlaceFinder: Send + Sync {
    async fn find_places(&self, at: Coordinates, query: &str) -> Result<Vec<PlaceRef>, ServiceError>;
}

/// Handles to every external collaborator used by a session
#[derive(Clone)]
pub struct Services {
    pub assessor: Arc<dyn RiskAssessor>,
    pub reporter: Arc<dyn ReportGenerator>,
    pub places: Arc<dyn PlaceFinder>,
}

impl Services {
    /// Use one implementation for all three roles
    pub fn from_single<T>(service: Arc<T>) -> Self
    where
        T: RiskAssessor + ReportGenerator + PlaceFinder + 'static,
    {
        Self {
            assessor: service.clone(),
            reporter: service.clone(),
            places: service,
        }
    }
}

/// External service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API base URL
    pub base_url: String,

    /// Model used for the periodic risk assessment
    pub assessment_model: String,

    /// Model used for incident reports
    pub report_model: String,

    /// Model used for grounded place lookup
    pub places_model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Inline API key (takes precedence over the environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Free-text query for safe-place lookup
    pub places_query: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            assessment_model: "gemini-2.5-flash".to_string(),
            report_model: "gemini-2.5-pro".to_string(),
            places_model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            timeout_ms: 20_000,
            places_query: "police stations, hospitals, and 24-hour open stores nearby".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Result<String, ServiceError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ServiceError::MissingApiKey(self.api_key_env.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_key_wins() {
        let config = ServiceConfig {
            api_key: Some("inline".to_string()),
            api_key_env: "SAFEWALK_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "inline");
    }

    #[test]
    fn test_missing_key() {
        let config = ServiceConfig {
            api_key: None,
            api_key_env: "SAFEWALK_TEST_DEFINITELY_UNSET".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.resolve_api_key(), Err(ServiceError::MissingApiKey(_))));
    }
}
