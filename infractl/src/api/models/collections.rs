//! Collection rendering and listing query parameters.
//!
//! A collection renders as
//!
//! ```json
//! {"name": "groups", "count": 12, "subcount": 2,
//!  "resources": [{"href": "http://localhost:3000/api/groups/1"}, {"href": "..."}]}
//! ```
//!
//! and `expand=resources` swaps the `{href}` stubs for full representations.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::config::ApiConfig;
use crate::db::handlers::Page;
use crate::types::Collection;

/// Anything rendered with an `href`.
pub trait Linked {
    fn href(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ResourceEntry<T> {
    Full(T),
    Link { href: String },
}

/// Navigation links of a paged response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Links {
    #[serde(rename = "self")]
    pub this: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionResponse<T> {
    pub name: String,
    /// Size of the whole collection
    pub count: i64,
    /// Number of resources in this response
    pub subcount: i64,
    /// Size of the filtered set, when a filter applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subquery_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceEntry<T>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl<T: Linked> CollectionResponse<T> {
    pub fn new(name: impl Into<String>, count: i64, items: Vec<T>, expand: bool) -> Self {
        let resources: Vec<_> = items
            .into_iter()
            .map(|item| {
                if expand {
                    ResourceEntry::Full(item)
                } else {
                    ResourceEntry::Link {
                        href: item.href().to_string(),
                    }
                }
            })
            .collect();

        Self {
            name: name.into(),
            count,
            subcount: resources.len() as i64,
            subquery_count: None,
            pages: None,
            resources: Some(resources),
            links: None,
        }
    }

    pub fn for_collection(collection: Collection, count: i64, items: Vec<T>, expand: bool) -> Self {
        Self::new(collection.name(), count, items, expand)
    }
}

impl<T> CollectionResponse<T> {
    /// Counts only, with no `resources` key at all.
    pub fn counts_only(collection: Collection, count: i64, subcount: i64) -> Self {
        Self {
            name: collection.name().to_string(),
            count,
            subcount,
            subquery_count: None,
            pages: None,
            resources: None,
            links: None,
        }
    }

    pub fn with_paging(mut self, subquery_count: i64, pages: i64, links: Links) -> Self {
        self.subquery_count = Some(subquery_count);
        self.pages = Some(pages);
        self.links = Some(links);
        self
    }
}

/// `offset`, `limit` and `expand` as accepted by every listing.
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct CollectionQuery {
    /// Number of resources to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub offset: Option<i64>,

    /// Maximum number of resources to return
    #[param(minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,

    /// Comma-separated expansions, e.g. `resources` or `events,policy_actions`
    pub expand: Option<String>,
}

impl CollectionQuery {
    pub fn page(&self, api: &ApiConfig) -> Page {
        let skip = self.offset.unwrap_or(0).max(0);
        let limit = self.limit.unwrap_or(api.default_limit).clamp(1, api.max_limit);
        Page::new(skip, limit)
    }

    pub fn expands(&self, what: &str) -> bool {
        self.expand
            .as_deref()
            .is_some_and(|expand| expand.split(',').map(str::trim).any(|e| e == what))
    }

    pub fn expands_resources(&self) -> bool {
        self.expands("resources")
    }
}

/// Query for a single resource; only `expand` applies.
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ResourceQuery {
    pub expand: Option<String>,
}

impl ResourceQuery {
    pub fn expands(&self, what: &str) -> bool {
        self.expand
            .as_deref()
            .is_some_and(|expand| expand.split(',').map(str::trim).any(|e| e == what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Thing(String);

    impl Linked for Thing {
        fn href(&self) -> &str {
            &self.0
        }
    }

    impl Serialize for Thing {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            json!({"href": self.0, "full": true}).serialize(serializer)
        }
    }

    #[test]
    fn test_links_unless_expanded() {
        let collapsed = CollectionResponse::new("things", 5, vec![Thing("h/1".into())], false);
        let rendered = serde_json::to_value(&collapsed).unwrap();
        assert_eq!(rendered, json!({"name": "things", "count": 5, "subcount": 1, "resources": [{"href": "h/1"}]}));

        let expanded = CollectionResponse::new("things", 5, vec![Thing("h/1".into())], true);
        let rendered = serde_json::to_value(&expanded).unwrap();
        assert_eq!(rendered["resources"][0]["full"], true);
    }

    #[test]
    fn test_counts_only_has_no_resources() {
        let rendered = serde_json::to_value(CollectionResponse::<Thing>::counts_only(Collection::AutomateWorkspaces, 3, 3)).unwrap();
        assert!(rendered.get("resources").is_none());
        assert_eq!(rendered["count"], 3);
    }

    #[test]
    fn test_page_is_capped() {
        let api = ApiConfig {
            default_limit: 50,
            max_limit: 100,
            metrics_default_limit: 1000,
        };
        let query = CollectionQuery {
            offset: Some(-4),
            limit: Some(5000),
            expand: None,
        };
        let page = query.page(&api);
        assert_eq!((page.skip, page.limit), (0, 100));
        assert_eq!(CollectionQuery::default().page(&api).limit, 50);
    }

    #[test]
    fn test_expands() {
        let query = CollectionQuery {
            expand: Some("events, policy_actions".to_string()),
            ..Default::default()
        };
        assert!(query.expands("policy_actions"));
        assert!(!query.expands_resources());
    }
}
