//! Database layer for data persistence and access.
//!
//! ```text
//! api handlers ──> db::handlers (repositories) ──> db::models (rows) ──> PostgreSQL
//! ```
//!
//! - [`handlers`]: one repository per table, plus the [`handlers::Repository`] trait
//! - [`models`]: row structs (`*DBResponse`) and write requests (`*DBRequest`)
//! - [`errors`]: [`errors::DbError`], the classification of `sqlx::Error`
//!
//! The schema lives in `infractl/migrations` and is applied by [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
