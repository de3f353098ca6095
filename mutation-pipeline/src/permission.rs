//! Permission checks run before a mutation does anything.

use std::collections::HashSet;
use std::fmt;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::context::CallerContext;

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action";

/// A named capability, e.g. `MANAGE_PRODUCTS`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Permission {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrincipalKind {
    User,
    App,
}

/// Someone authenticated on the request, with the permissions granted to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    kind: PrincipalKind,
    id: String,
    permissions: HashSet<Permission>,
    is_active: bool,
    is_superuser: bool,
}

#[buildstructor::buildstructor]
impl Principal {
    /// Builds a user principal. Users are active and not superusers unless told otherwise.
    #[builder(entry = "user", exit = "build", visibility = "pub")]
    fn new_user(
        id: String,
        permissions: HashSet<Permission>,
        is_active: Option<bool>,
        is_superuser: Option<bool>,
    ) -> Self {
        Self {
            kind: PrincipalKind::User,
            id,
            permissions,
            is_active: is_active.unwrap_or(true),
            is_superuser: is_superuser.unwrap_or_default(),
        }
    }

    /// Builds an app principal. Apps are never superusers.
    #[builder(entry = "app", exit = "build", visibility = "pub")]
    fn new_app(id: String, permissions: HashSet<Permission>, is_active: Option<bool>) -> Self {
        Self {
            kind: PrincipalKind::App,
            id,
            permissions,
            is_active: is_active.unwrap_or(true),
            is_superuser: false,
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether every one of `required` is held.
    ///
    /// Inactive principals hold nothing, active superusers hold everything.
    pub fn has_permissions<'a>(&self, required: impl IntoIterator<Item = &'a Permission>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.is_superuser {
            return true;
        }
        required
            .into_iter()
            .all(|permission| self.permissions.contains(permission))
    }
}

/// The result of a permission check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Denied(String),
}

/// Checks the caller against a mutation's required permissions.
pub struct PermissionGate;

impl PermissionGate {
    /// All of `required` must be held, either by the user or, failing that, by the app.
    /// Nothing is required when `required` is empty.
    pub fn check(context: &CallerContext, required: &[Permission]) -> Authorization {
        if required.is_empty() {
            return Authorization::Authorized;
        }
        let holds = |principal: Option<&Principal>| {
            principal.is_some_and(|principal| principal.has_permissions(required))
        };
        if holds(context.principal()) || holds(context.app()) {
            Authorization::Authorized
        } else {
            tracing::debug!(
                required = ?required,
                principal = ?context.principal().map(Principal::id),
                app = ?context.app().map(Principal::id),
                "permission denied"
            );
            Authorization::Denied(PERMISSION_DENIED_MESSAGE.to_string())
        }
    }
}
