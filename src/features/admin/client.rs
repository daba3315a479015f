//! Client helpers for the administrative and metrics endpoints. Every call goes
//! through the admin client with the fixed privileged credential pair; these
//! responses never affect the user session.

use crate::{
    app_lib::{AppError, HttpGateway},
    features::admin::types::{
        ConfusionMetrics, DashboardStats, EvaluationMetrics, ManagedUser, ModelInfo, SystemHealth,
        TrainingResult, UnlockResult,
    },
};
use std::sync::Arc;

pub const DEFAULT_TRAINING_SAMPLES: u32 = 1000;
pub const DEFAULT_EVALUATION_SAMPLES: u32 = 500;

/// Thin handle over the gateway's admin client.
#[derive(Clone, Debug)]
pub struct AdminClient {
    gateway: Arc<HttpGateway>,
}

impl AdminClient {
    #[must_use]
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        self.gateway.admin_get_json("/metrics/dashboard").await
    }

    pub async fn system_health(&self) -> Result<SystemHealth, AppError> {
        self.gateway.admin_get_json("/metrics/system-health").await
    }

    pub async fn model_info(&self) -> Result<ModelInfo, AppError> {
        self.gateway.admin_get_json("/admin/model-info").await
    }

    /// Retrains the risk model on `samples` synthetic logins.
    pub async fn train_model(&self, samples: u32) -> Result<TrainingResult, AppError> {
        let samples = require_samples(samples)?;
        self.gateway
            .admin_post_json(&format!("/admin/train?samples={samples}"))
            .await
    }

    pub async fn evaluate_model(&self, samples: u32) -> Result<EvaluationMetrics, AppError> {
        let samples = require_samples(samples)?;
        self.gateway
            .admin_get_json(&format!("/admin/evaluate?samples={samples}"))
            .await
    }

    pub async fn confusion_metrics(&self, samples: u32) -> Result<ConfusionMetrics, AppError> {
        let samples = require_samples(samples)?;
        self.gateway
            .admin_get_json(&format!("/admin/confusion-metrics?samples={samples}"))
            .await
    }

    /// Clears the lock and failed-attempt counter for a user, after basic input validation.
    pub async fn unlock_user(&self, user_id: &str) -> Result<UnlockResult, AppError> {
        let trimmed = user_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("User id is required.".to_string()));
        }

        self.gateway
            .admin_post_json(&format!("/admin/unlock-user/{trimmed}"))
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<ManagedUser>, AppError> {
        self.gateway.admin_get_json("/admin/users").await
    }
}

fn require_samples(samples: u32) -> Result<u32, AppError> {
    if samples == 0 {
        Err(AppError::Validation(
            "Sample count must be greater than zero.".to_string(),
        ))
    } else {
        Ok(samples)
    }
}
