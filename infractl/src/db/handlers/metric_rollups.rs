//! Database repository for metric rollups.

use crate::db::{errors::Result, models::metric_rollups::MetricRollupDBResponse};
use crate::types::Id;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

/// Filter for a rollup query. `end` is exclusive; callers turn an inclusive end date into the
/// start of the following day.
#[derive(Debug, Clone)]
pub struct MetricRollupFilter {
    pub resource_type: String,
    pub capture_interval: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub resource_ids: Option<Vec<Id>>,
    pub skip: i64,
    pub limit: i64,
}

impl MetricRollupFilter {
    fn push_conditions<'a>(&'a self, query: &mut QueryBuilder<'a, Postgres>) {
        query.push(" WHERE resource_type = ");
        query.push_bind(&self.resource_type);
        query.push(" AND capture_interval_name = ");
        query.push_bind(&self.capture_interval);
        query.push(" AND timestamp >= ");
        query.push_bind(self.start);
        if let Some(end) = self.end {
            query.push(" AND timestamp < ");
            query.push_bind(end);
        }
        if let Some(ids) = &self.resource_ids {
            query.push(" AND resource_id = ANY(");
            query.push_bind(ids);
            query.push(")");
        }
    }
}

pub struct MetricRollups<'c> {
    db: &'c mut PgConnection,
}

impl<'c> MetricRollups<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<MetricRollupDBResponse>> {
        let rollup = sqlx::query_as::<_, MetricRollupDBResponse>("SELECT * FROM metric_rollups WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(rollup)
    }

    /// Size of the whole table, unfiltered.
    #[instrument(skip(self), err)]
    pub async fn count_all(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metric_rollups").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, filter), fields(resource_type = %filter.resource_type), err)]
    pub async fn count(&mut self, filter: &MetricRollupFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM metric_rollups");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, filter), fields(resource_type = %filter.resource_type, limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &MetricRollupFilter) -> Result<Vec<MetricRollupDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM metric_rollups");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY timestamp, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let rollups = query.build_query_as::<MetricRollupDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(rollups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::PgPool;

    async fn insert_rollup(pool: &PgPool, resource_id: Id, interval: &str, timestamp: DateTime<Utc>) {
        sqlx::query(
            "INSERT INTO metric_rollups (resource_type, resource_id, capture_interval_name, timestamp, cpu_usage_rate_average) VALUES ('Service', $1, $2, $3, 1.5)",
        )
        .bind(resource_id)
        .bind(interval)
        .bind(timestamp)
        .execute(pool)
        .await
        .unwrap();
    }

    fn filter(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> MetricRollupFilter {
        MetricRollupFilter {
            resource_type: "Service".to_string(),
            capture_interval: "hourly".to_string(),
            start,
            end,
            resource_ids: None,
            skip: 0,
            limit: 100,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_filters_by_window_interval_and_ids(pool: PgPool) {
        let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();
        insert_rollup(&pool, 1, "hourly", day(1, 10)).await;
        insert_rollup(&pool, 2, "hourly", day(2, 10)).await;
        insert_rollup(&pool, 1, "hourly", day(3, 10)).await;
        insert_rollup(&pool, 1, "daily", day(2, 0)).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut rollups = MetricRollups::new(&mut conn);

        assert_eq!(rollups.count_all().await.unwrap(), 4);
        assert_eq!(rollups.count(&filter(day(1, 0), None)).await.unwrap(), 3);
        assert_eq!(rollups.count(&filter(day(1, 0), Some(day(3, 0)))).await.unwrap(), 2);

        let mut only_one = filter(day(1, 0), None);
        only_one.resource_ids = Some(vec![1]);
        let listed = rollups.list(&only_one).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].timestamp < listed[1].timestamp);
    }
}
