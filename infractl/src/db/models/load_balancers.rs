//! Database models for load balancers and the resources nested under them.

use crate::types::{Id, ProviderId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct LoadBalancerDBResponse {
    pub id: Id,
    pub name: String,
    pub ems_ref: Option<String>,
    pub provider_id: Option<ProviderId>,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LoadBalancerPoolDBResponse {
    pub id: Id,
    pub load_balancer_id: Id,
    pub name: String,
    pub load_balancer_algorithm: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LoadBalancerPoolMemberDBResponse {
    pub id: Id,
    pub pool_id: Id,
    pub address: String,
    pub port: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct LoadBalancerListenerDBResponse {
    pub id: Id,
    pub load_balancer_id: Id,
    pub name: String,
    pub load_balancer_protocol: Option<String>,
    pub load_balancer_port: Option<i32>,
    pub instance_protocol: Option<String>,
    pub instance_port: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LoadBalancerHealthCheckDBResponse {
    pub id: Id,
    pub load_balancer_id: Id,
    pub pool_id: Option<Id>,
    pub name: String,
    pub protocol: Option<String>,
    pub port: Option<i32>,
    pub interval_seconds: Option<i32>,
}
