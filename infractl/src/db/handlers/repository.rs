//! The repository trait shared by the tables the API writes to.

use std::collections::HashMap;

use crate::db::errors::Result;

/// Offset/limit window applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

/// Data access for one postgres table.
///
/// Implementors wrap a `&mut PgConnection` so they can run on a pooled connection or inside a
/// transaction alike. Request and response types are the `*DBRequest`/`*DBResponse` structs from
/// [`crate::db::models`].
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;
    type UpdateRequest;
    type Response;
    type Id: Send + Sync;
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Fetch many rows at once, keyed by id. Missing ids are simply absent from the map.
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Returns whether a row was deleted.
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Fails with [`crate::db::errors::DbError::NotFound`] when the row does not exist.
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
