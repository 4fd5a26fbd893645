use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role name used for RBAC checks.
///
/// Roles are opaque strings; what a role grants is decided by the handlers a
/// guard protects, not by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Collect role names into a role list.
pub fn roles<I, R>(names: I) -> Vec<Role>
where
    I: IntoIterator<Item = R>,
    R: Into<Role>,
{
    names.into_iter().map(Into::into).collect()
}
