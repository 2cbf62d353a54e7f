//! Read-only nested collections such as `/api/load_balancers/:id/load_balancer_pools`.
//!
//! A parent type opts into relations by overriding methods of [`NestedCollections`]. Every
//! method has an empty default, so asking a parent for a relation it does not have yields an
//! empty collection rather than an error. `SUBCOLLECTIONS` lists the names routable under the
//! parent; anything else is a 404.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use utoipa::ToSchema;

use crate::{
    api::models::{
        cloud_volumes::BackupScheduleResponse,
        collections::{CollectionResponse, Linked},
        load_balancers::{
            LoadBalancerHealthCheckResponse, LoadBalancerListenerResponse, LoadBalancerPoolMemberResponse, LoadBalancerPoolResponse,
        },
    },
    db::{
        handlers::LoadBalancers,
        models::{
            cloud_volumes::{BackupScheduleDBResponse, CloudVolumeDBResponse},
            load_balancers::{
                LoadBalancerDBResponse, LoadBalancerHealthCheckDBResponse, LoadBalancerListenerDBResponse, LoadBalancerPoolDBResponse,
                LoadBalancerPoolMemberDBResponse,
            },
        },
    },
    errors::{Error, Result},
    types::{Collection, Id},
};

#[async_trait]
pub trait NestedCollections: Sync {
    /// Subcollection names that may be requested under this parent.
    const SUBCOLLECTIONS: &'static [Collection];

    async fn load_balancer_pools(&self, _conn: &mut PgConnection) -> Result<Vec<LoadBalancerPoolDBResponse>> {
        Ok(Vec::new())
    }

    async fn load_balancer_pool_members(&self, _conn: &mut PgConnection) -> Result<Vec<LoadBalancerPoolMemberDBResponse>> {
        Ok(Vec::new())
    }

    async fn load_balancer_listeners(&self, _conn: &mut PgConnection) -> Result<Vec<LoadBalancerListenerDBResponse>> {
        Ok(Vec::new())
    }

    async fn load_balancer_health_checks(&self, _conn: &mut PgConnection) -> Result<Vec<LoadBalancerHealthCheckDBResponse>> {
        Ok(Vec::new())
    }

    async fn backup_schedules(&self, _conn: &mut PgConnection) -> Result<Vec<BackupScheduleDBResponse>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl NestedCollections for LoadBalancerDBResponse {
    const SUBCOLLECTIONS: &'static [Collection] = &[
        Collection::LoadBalancerPools,
        Collection::LoadBalancerPoolMembers,
        Collection::LoadBalancerListeners,
        Collection::LoadBalancerHealthChecks,
    ];

    async fn load_balancer_pools(&self, conn: &mut PgConnection) -> Result<Vec<LoadBalancerPoolDBResponse>> {
        Ok(LoadBalancers::new(conn).pools_of(self.id).await?)
    }

    async fn load_balancer_pool_members(&self, conn: &mut PgConnection) -> Result<Vec<LoadBalancerPoolMemberDBResponse>> {
        Ok(LoadBalancers::new(conn).members_of_load_balancer(self.id).await?)
    }

    async fn load_balancer_listeners(&self, conn: &mut PgConnection) -> Result<Vec<LoadBalancerListenerDBResponse>> {
        Ok(LoadBalancers::new(conn).listeners_of(self.id).await?)
    }

    async fn load_balancer_health_checks(&self, conn: &mut PgConnection) -> Result<Vec<LoadBalancerHealthCheckDBResponse>> {
        Ok(LoadBalancers::new(conn).health_checks_of_load_balancer(self.id).await?)
    }
}

#[async_trait]
impl NestedCollections for LoadBalancerPoolDBResponse {
    const SUBCOLLECTIONS: &'static [Collection] = &[
        Collection::LoadBalancerPools,
        Collection::LoadBalancerPoolMembers,
        Collection::LoadBalancerHealthChecks,
    ];

    async fn load_balancer_pool_members(&self, conn: &mut PgConnection) -> Result<Vec<LoadBalancerPoolMemberDBResponse>> {
        Ok(LoadBalancers::new(conn).members_of_pool(self.id).await?)
    }

    async fn load_balancer_health_checks(&self, conn: &mut PgConnection) -> Result<Vec<LoadBalancerHealthCheckDBResponse>> {
        Ok(LoadBalancers::new(conn).health_checks_of_pool(self.id).await?)
    }
}

#[async_trait]
impl NestedCollections for CloudVolumeDBResponse {
    const SUBCOLLECTIONS: &'static [Collection] = &[Collection::BackupSchedules];
}

/// One member of a nested collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum NestedResource {
    Pool(LoadBalancerPoolResponse),
    PoolMember(LoadBalancerPoolMemberResponse),
    Listener(LoadBalancerListenerResponse),
    HealthCheck(LoadBalancerHealthCheckResponse),
    BackupSchedule(BackupScheduleResponse),
}

impl Linked for NestedResource {
    fn href(&self) -> &str {
        match self {
            NestedResource::Pool(r) => r.href(),
            NestedResource::PoolMember(r) => r.href(),
            NestedResource::Listener(r) => r.href(),
            NestedResource::HealthCheck(r) => r.href(),
            NestedResource::BackupSchedule(r) => r.href(),
        }
    }
}

/// Resolve `name` against the parent's routable subcollections.
pub fn subcollection_named<P: NestedCollections>(name: &str) -> Result<Collection> {
    P::SUBCOLLECTIONS
        .iter()
        .copied()
        .find(|c| c.name() == name)
        .ok_or_else(|| Error::not_found("subcollection", name))
}

/// Render the `name` relation of `parent`, whose own href is `parent_href`.
pub async fn nested_collection<P: NestedCollections>(
    parent: &P,
    parent_href: &str,
    name: &str,
    conn: &mut PgConnection,
    expand: bool,
) -> Result<CollectionResponse<NestedResource>> {
    let collection = subcollection_named::<P>(name)?;
    let href = |id: Id| collection.nested_href(parent_href, id);

    let items: Vec<NestedResource> = match collection {
        Collection::LoadBalancerPools => parent
            .load_balancer_pools(conn)
            .await?
            .into_iter()
            .map(|r| {
                let member_href = href(r.id);
                NestedResource::Pool(LoadBalancerPoolResponse::new(r, member_href))
            })
            .collect(),
        Collection::LoadBalancerPoolMembers => parent
            .load_balancer_pool_members(conn)
            .await?
            .into_iter()
            .map(|r| {
                let member_href = href(r.id);
                NestedResource::PoolMember(LoadBalancerPoolMemberResponse::new(r, member_href))
            })
            .collect(),
        Collection::LoadBalancerListeners => parent
            .load_balancer_listeners(conn)
            .await?
            .into_iter()
            .map(|r| {
                let member_href = href(r.id);
                NestedResource::Listener(LoadBalancerListenerResponse::new(r, member_href))
            })
            .collect(),
        Collection::LoadBalancerHealthChecks => parent
            .load_balancer_health_checks(conn)
            .await?
            .into_iter()
            .map(|r| {
                let member_href = href(r.id);
                NestedResource::HealthCheck(LoadBalancerHealthCheckResponse::new(r, member_href))
            })
            .collect(),
        Collection::BackupSchedules => parent
            .backup_schedules(conn)
            .await?
            .into_iter()
            .map(|r| {
                let member_href = href(r.id);
                NestedResource::BackupSchedule(BackupScheduleResponse::new(r, member_href))
            })
            .collect(),
        other => return Err(Error::not_found("subcollection", other.name())),
    };

    let count = items.len() as i64;
    Ok(CollectionResponse::for_collection(collection, count, items, expand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn volume() -> CloudVolumeDBResponse {
        CloudVolumeDBResponse {
            id: 1,
            name: "vol".to_string(),
            size: None,
            status: None,
            provider_id: None,
            created_on: Utc::now(),
        }
    }

    #[test]
    fn test_routable_names() {
        assert_eq!(
            subcollection_named::<LoadBalancerDBResponse>("load_balancer_listeners").unwrap(),
            Collection::LoadBalancerListeners
        );
        assert!(subcollection_named::<LoadBalancerPoolDBResponse>("load_balancer_listeners").is_err());
        assert!(subcollection_named::<CloudVolumeDBResponse>("load_balancer_pools").is_err());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_default_relation_is_empty(pool: sqlx::PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let rendered = nested_collection(&volume(), "http://h/api/cloud_volumes/1", "backup_schedules", &mut conn, false)
            .await
            .unwrap();
        assert_eq!(rendered.name, "backup_schedules");
        assert_eq!(rendered.count, 0);
        assert_eq!(rendered.subcount, 0);
        assert_eq!(rendered.resources.map(|r| r.len()), Some(0));
    }
}
