//! API response models for load balancers and the resources nested under them.
//!
//! Nested resources take their `href` from the caller: a pool reached through
//! `/api/load_balancers/1/load_balancer_pools` is rendered under that parent, the same pool read
//! from `/api/load_balancer_pools` under the top-level collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::load_balancers::{
    LoadBalancerDBResponse, LoadBalancerHealthCheckDBResponse, LoadBalancerListenerDBResponse, LoadBalancerPoolDBResponse,
    LoadBalancerPoolMemberDBResponse,
};
use crate::types::{Collection, Id, ProviderId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoadBalancerResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub name: String,
    pub ems_ref: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub ems_id: Option<ProviderId>,
    pub created_on: DateTime<Utc>,
}

impl LoadBalancerResponse {
    pub fn new(db: LoadBalancerDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::LoadBalancers.href(api_base, db.id),
            id: db.id,
            name: db.name,
            ems_ref: db.ems_ref,
            ems_id: db.provider_id,
            created_on: db.created_on,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoadBalancerPoolResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub load_balancer_id: Id,
    pub name: String,
    pub load_balancer_algorithm: Option<String>,
    pub protocol: Option<String>,
}

impl LoadBalancerPoolResponse {
    pub fn new(db: LoadBalancerPoolDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            load_balancer_id: db.load_balancer_id,
            name: db.name,
            load_balancer_algorithm: db.load_balancer_algorithm,
            protocol: db.protocol,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoadBalancerPoolMemberResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub load_balancer_pool_id: Id,
    pub address: String,
    pub port: i32,
}

impl LoadBalancerPoolMemberResponse {
    pub fn new(db: LoadBalancerPoolMemberDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            load_balancer_pool_id: db.pool_id,
            address: db.address,
            port: db.port,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoadBalancerListenerResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub load_balancer_id: Id,
    pub name: String,
    pub load_balancer_protocol: Option<String>,
    pub load_balancer_port: Option<i32>,
    pub instance_protocol: Option<String>,
    pub instance_port: Option<i32>,
}

impl LoadBalancerListenerResponse {
    pub fn new(db: LoadBalancerListenerDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            load_balancer_id: db.load_balancer_id,
            name: db.name,
            load_balancer_protocol: db.load_balancer_protocol,
            load_balancer_port: db.load_balancer_port,
            instance_protocol: db.instance_protocol,
            instance_port: db.instance_port,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoadBalancerHealthCheckResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub load_balancer_id: Id,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub load_balancer_pool_id: Option<Id>,
    pub name: String,
    pub protocol: Option<String>,
    pub port: Option<i32>,
    pub interval: Option<i32>,
}

impl LoadBalancerHealthCheckResponse {
    pub fn new(db: LoadBalancerHealthCheckDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            load_balancer_id: db.load_balancer_id,
            load_balancer_pool_id: db.pool_id,
            name: db.name,
            protocol: db.protocol,
            port: db.port,
            interval: db.interval_seconds,
        }
    }
}

macro_rules! linked {
    ($($ty:ty),*) => {
        $(impl Linked for $ty {
            fn href(&self) -> &str {
                &self.href
            }
        })*
    };
}

linked!(
    LoadBalancerResponse,
    LoadBalancerPoolResponse,
    LoadBalancerPoolMemberResponse,
    LoadBalancerListenerResponse,
    LoadBalancerHealthCheckResponse
);
