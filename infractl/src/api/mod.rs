//! The REST layer.
//!
//! - **[`handlers`]**: axum handlers, one module per collection
//! - **[`models`]**: request and response bodies
//! - **[`request`]**: parsing of `POST` action bodies and resource references
//! - **[`subcollections`]**: read-only nested collections such as a load balancer's pools
//!
//! All routes live under `/api` and are documented through `utoipa`; the document is served at
//! `/api/docs`.

pub mod handlers;
pub mod models;
pub mod request;
pub mod subcollections;
