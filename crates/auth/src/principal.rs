use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Opaque identity of a principal (user name, account id, service name...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An entity that can be authenticated and checked for roles.
///
/// Implementations are produced per request by whatever authentication
/// scheme the application uses; this crate never looks them up itself.
pub trait Principal: Send + Sync {
    fn id(&self) -> &str;

    fn authenticated(&self) -> bool;

    /// Whether the principal holds at least one of `roles`.
    ///
    /// An empty `roles` slice is passed through unchanged by the guard; the
    /// built-in principals answer `false` for it.
    fn has_any_role(&self, roles: &[Role]) -> bool;
}

impl<P: Principal + ?Sized> Principal for Box<P> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn authenticated(&self) -> bool {
        (**self).authenticated()
    }

    fn has_any_role(&self, roles: &[Role]) -> bool {
        (**self).has_any_role(roles)
    }
}

impl<P: Principal + ?Sized> Principal for std::sync::Arc<P> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn authenticated(&self) -> bool {
        (**self).authenticated()
    }

    fn has_any_role(&self, roles: &[Role]) -> bool {
        (**self).has_any_role(roles)
    }
}

/// Fallback principal for visitors without a session.
///
/// Never authenticated and holds no roles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Anonymous;

impl Anonymous {
    pub const ID: &'static str = "anonymous";
}

impl Principal for Anonymous {
    fn id(&self) -> &str {
        Self::ID
    }

    fn authenticated(&self) -> bool {
        false
    }

    fn has_any_role(&self, _roles: &[Role]) -> bool {
        false
    }
}

/// An authenticated principal with a fixed set of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: PrincipalId,
    pub roles: BTreeSet<Role>,
}

impl User {
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

impl Principal for User {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn authenticated(&self) -> bool {
        true
    }

    fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }
}
