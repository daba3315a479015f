use crate::features::auth::types::{RiskLevel, Role, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_users: u64,
    pub high_risk_users: u64,
    pub medium_risk_users: u64,
    pub low_risk_users: u64,
    pub average_trust_score: f64,
    pub total_score_calculations: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDistribution {
    #[serde(rename = "HIGH")]
    pub high: u64,
    #[serde(rename = "MEDIUM")]
    pub medium: u64,
    #[serde(rename = "LOW")]
    pub low: u64,
    pub high_percentage: f64,
    pub medium_percentage: f64,
    pub low_percentage: f64,
}

impl RiskDistribution {
    #[must_use]
    pub fn count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub stats: SystemStats,
    pub distribution: RiskDistribution,
    #[serde(default)]
    pub explanations: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    #[serde(rename = "usedMB")]
    pub used_mb: f64,
    #[serde(rename = "freeMB")]
    pub free_mb: f64,
    #[serde(rename = "totalMB")]
    pub total_mb: f64,
    #[serde(rename = "maxMB")]
    pub max_mb: f64,
    pub usage_percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub available_processors: u32,
    pub java_version: String,
    pub os_name: String,
    pub os_arch: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    pub status: String,
    pub total_users: u64,
    pub total_score_calculations: u64,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub memory: MemoryUsage,
    pub system: HostInfo,
    pub application: ApplicationStatus,
}

/// Risk model artifact on the server. `exists == false` carries a `message`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub exists: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub last_modified: Option<Timestamp>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingResult {
    pub success: bool,
    pub num_samples: u32,
    pub training_time_ms: u64,
    pub timestamp: Timestamp,
    pub model_path: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub correlation_coefficient: f64,
    pub num_samples: u32,
    pub evaluation_time_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMetrics {
    pub true_positives: u64,
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub false_positive_rate: f64,
    pub false_negative_rate: f64,
    pub accuracy: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnlockResult {
    pub message: String,
    pub email: String,
}

/// Row of `GET /admin/users`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub trust_score: Option<f64>,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub account_locked: bool,
    #[serde(default)]
    pub failed_login_attempts: u32,
    #[serde(default)]
    pub last_login_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}
