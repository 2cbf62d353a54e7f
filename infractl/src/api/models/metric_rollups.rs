//! API models for metric rollups and their paged listing.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::collections::{Linked, Links};
use crate::db::models::metric_rollups::MetricRollupDBResponse;
use crate::errors::{Error, Result};
use crate::types::{Collection, Id, parse_id};

pub const CAPTURE_INTERVALS: [&str; 2] = ["hourly", "daily"];

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricRollupResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub resource_type: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub resource_id: Id,
    pub capture_interval_name: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage_rate_average: Option<f64>,
    pub mem_usage_absolute_average: Option<f64>,
    pub disk_usage_rate_average: Option<f64>,
    pub net_usage_rate_average: Option<f64>,
}

impl MetricRollupResponse {
    pub fn new(db: MetricRollupDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::MetricRollups.href(api_base, db.id),
            id: db.id,
            resource_type: db.resource_type,
            resource_id: db.resource_id,
            capture_interval_name: db.capture_interval_name,
            timestamp: db.timestamp,
            cpu_usage_rate_average: db.cpu_usage_rate_average,
            mem_usage_absolute_average: db.mem_usage_absolute_average,
            disk_usage_rate_average: db.disk_usage_rate_average,
            net_usage_rate_average: db.net_usage_rate_average,
        }
    }
}

impl Linked for MetricRollupResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

/// Query parameters of `GET /api/metric_rollups`.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct MetricRollupQuery {
    pub resource_type: Option<String>,
    /// `hourly` or `daily`
    pub capture_interval: Option<String>,
    /// ISO 8601 date, inclusive
    pub start_date: Option<String>,
    /// ISO 8601 date; the whole day is included
    pub end_date: Option<String>,
    /// Comma separated resource ids
    pub resource_ids: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<i64>)]
    pub offset: Option<i64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<i64>)]
    pub limit: Option<i64>,
    pub expand: Option<String>,
}

/// A validated rollup window: `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupWindow {
    pub resource_type: String,
    pub capture_interval: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub resource_ids: Option<Vec<Id>>,
}

fn parse_date(raw: &str, name: &str) -> Result<NaiveDate> {
    // Accept full timestamps too; only the date part matters
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| Error::bad_request(format!("Invalid {name} specified: {raw}")))
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl MetricRollupQuery {
    pub fn window(&self) -> Result<RollupWindow> {
        let (Some(resource_type), Some(capture_interval), Some(start_date)) =
            (&self.resource_type, &self.capture_interval, &self.start_date)
        else {
            return Err(Error::bad_request("Must specify resource_type, capture_interval, start_date"));
        };

        if !CAPTURE_INTERVALS.contains(&capture_interval.as_str()) {
            return Err(Error::bad_request(format!(
                "Capture interval must be one of {}",
                CAPTURE_INTERVALS.join(", ")
            )));
        }

        let start = start_of(parse_date(start_date, "start_date")?);
        let end = match &self.end_date {
            Some(raw) => {
                let day = parse_date(raw, "end_date")?;
                let next = day
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| Error::bad_request(format!("Invalid end_date specified: {raw}")))?;
                Some(start_of(next))
            }
            None => None,
        };

        let resource_ids = match &self.resource_ids {
            Some(raw) => Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| parse_id(s).ok_or_else(|| Error::bad_request(format!("Invalid resource id specified: {s}"))))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        Ok(RollupWindow {
            resource_type: resource_type.clone(),
            capture_interval: capture_interval.clone(),
            start,
            end,
            resource_ids,
        })
    }

    pub fn expands_resources(&self) -> bool {
        self.expand
            .as_deref()
            .is_some_and(|e| e.split(',').any(|part| part.trim() == "resources"))
    }
}

/// Page count and navigation links for an offset/limit window over `total` rows.
pub fn paging_links(base_href: &str, query_suffix: &str, total: i64, offset: i64, limit: i64) -> (i64, Links) {
    let limit = limit.max(1);
    let pages = (total + limit - 1) / limit;
    let link = |offset: i64| format!("{base_href}?{query_suffix}&offset={offset}&limit={limit}");
    let last_offset = (pages - 1).max(0) * limit;

    let links = Links {
        this: link(offset),
        next: (offset + limit < total).then(|| link(offset + limit)),
        previous: (offset > 0).then(|| link((offset - limit).max(0))),
        first: link(0),
        last: link(last_offset),
    };
    (pages, links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(start: Option<&str>, end: Option<&str>, interval: &str) -> MetricRollupQuery {
        MetricRollupQuery {
            resource_type: Some("Service".to_string()),
            capture_interval: Some(interval.to_string()),
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_parameters() {
        let err = query(None, None, "hourly").window().unwrap_err();
        assert_eq!(err.user_message(), "Must specify resource_type, capture_interval, start_date");
    }

    #[test]
    fn test_capture_interval_must_be_known() {
        let err = query(Some("2024-01-01"), None, "minutely").window().unwrap_err();
        assert_eq!(err.user_message(), "Capture interval must be one of hourly, daily");
    }

    #[test]
    fn test_end_date_includes_whole_day() {
        let window = query(Some("2024-01-01"), Some("2024-01-02"), "daily").window().unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()));

        let open = query(Some("2024-01-01T10:00:00Z"), None, "hourly").window().unwrap();
        assert_eq!(open.end, None);
    }

    #[test]
    fn test_resource_ids_are_parsed() {
        let mut q = query(Some("2024-01-01"), None, "hourly");
        q.resource_ids = Some("3, 4,5".to_string());
        assert_eq!(q.window().unwrap().resource_ids, Some(vec![3, 4, 5]));

        q.resource_ids = Some("3,x".to_string());
        assert!(q.window().is_err());
    }

    #[test]
    fn test_paging_links() {
        let (pages, links) = paging_links("http://h/api/metric_rollups", "resource_type=Service", 5, 0, 2);
        assert_eq!(pages, 3);
        assert!(links.next.as_deref().unwrap().ends_with("offset=2&limit=2"));
        assert!(links.previous.is_none());
        assert!(links.last.ends_with("offset=4&limit=2"));

        let (_, last_page) = paging_links("http://h/api/metric_rollups", "resource_type=Service", 5, 4, 2);
        assert!(last_page.next.is_none());
        assert!(last_page.previous.as_deref().unwrap().ends_with("offset=2&limit=2"));
    }
}
