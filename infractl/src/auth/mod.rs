//! Authentication and authorization.
//!
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor
//!   (auth token, HTTP Basic, trusted proxy header)
//! - [`permissions`]: feature identifier checks and the `RequiresPermission` extractor
//! - [`session`]: tokens issued by `GET /api/auth`
//! - [`password`]: argon2 hashing
//! - [`otp`]: TOTP for two-factor authentication

pub mod current_user;
pub mod otp;
pub mod password;
pub mod permissions;
pub mod session;
