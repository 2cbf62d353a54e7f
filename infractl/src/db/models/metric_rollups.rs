//! Database models for metric rollups.

use crate::types::Id;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MetricRollupDBResponse {
    pub id: Id,
    pub resource_type: String,
    pub resource_id: Id,
    pub capture_interval_name: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage_rate_average: Option<f64>,
    pub mem_usage_absolute_average: Option<f64>,
    pub disk_usage_rate_average: Option<f64>,
    pub net_usage_rate_average: Option<f64>,
}
