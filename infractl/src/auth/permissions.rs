//! Feature-identifier authorization.
//!
//! A role grants a list of feature identifiers such as `groups_read` or `auth_key_pairs_create`.
//! Simple read endpoints declare what they need in their signature:
//!
//! ```ignore
//! async fn list_tenants(
//!     State(state): State<AppState>,
//!     RequiresPermission { user, .. }: RequiresPermission<resource::Tenants, operation::Read>,
//! ) -> Result<Json<...>>
//! ```
//!
//! Action handlers, where the identifier depends on the body, call
//! [`CurrentUser::require`] instead.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{AppState, api::models::users::CurrentUser, errors::Error, types::Collection};

pub mod resource {
    use crate::types::Collection;

    pub trait Resource {
        const COLLECTION: Collection;
    }

    macro_rules! resources {
        ($($name:ident),* $(,)?) => {
            $(
                #[derive(Debug, Clone, Copy)]
                pub struct $name;

                impl Resource for $name {
                    const COLLECTION: Collection = Collection::$name;
                }
            )*
        };
    }

    resources!(
        Users,
        Groups,
        Tenants,
        Roles,
        Providers,
        AuthKeyPairs,
        LoadBalancers,
        LoadBalancerPools,
        FloatingIps,
        CloudVolumes,
        AutomateWorkspaces,
        Events,
        PolicyActions,
        Policies,
        MetricRollups,
        Tasks,
    );
}

pub mod operation {
    pub trait Operation {
        const NAME: &'static str;
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Read;

    impl Operation for Read {
        const NAME: &'static str = "read";
    }
}

/// Extractor that authenticates the caller and requires `<R>_<O>`.
pub struct RequiresPermission<R, O> {
    pub user: CurrentUser,
    _marker: PhantomData<fn() -> (R, O)>,
}

impl<R, O> RequiresPermission<R, O>
where
    R: resource::Resource,
    O: operation::Operation,
{
    pub fn identifier() -> String {
        R::COLLECTION.identifier(O::NAME)
    }

    pub fn collection() -> Collection {
        R::COLLECTION
    }
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: resource::Resource,
    O: operation::Operation,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        user.require_identifier(&Self::identifier())?;
        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert_eq!(
            RequiresPermission::<resource::AuthKeyPairs, operation::Read>::identifier(),
            "auth_key_pairs_read"
        );
        assert_eq!(
            RequiresPermission::<resource::MetricRollups, operation::Read>::collection(),
            Collection::MetricRollups
        );
    }
}
