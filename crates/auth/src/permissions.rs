use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};

/// Separator between the resource and action halves of a permission key.
pub const PERMISSION_SEPARATOR: char = ':';

/// Reserved action meaning "every action on this resource".
pub const WILDCARD_ACTION: &str = "*";

/// Permission key of the form `resource:action` (e.g. `"document:read"`).
///
/// The resource is everything before the first `:`. A `resource:*` grant
/// covers every action on that one resource; there is no resource-level
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    /// Build the compound key for `resource` and `action`.
    pub fn of(resource: &str, action: &str) -> Self {
        Self(Cow::Owned(format!("{resource}{PERMISSION_SEPARATOR}{action}")))
    }

    /// The `resource:*` grant covering every action on `resource`.
    pub fn all_actions(resource: &str) -> Self {
        Self::of(resource, WILDCARD_ACTION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource(&self) -> Option<&str> {
        self.split().map(|(resource, _)| resource)
    }

    pub fn action(&self) -> Option<&str> {
        self.split().map(|(_, action)| action)
    }

    pub fn is_wildcard(&self) -> bool {
        self.action() == Some(WILDCARD_ACTION)
    }

    /// The wildcard grant that would also satisfy this permission, if the key
    /// has a resource part.
    pub fn wildcard(&self) -> Option<Permission> {
        self.resource().map(Self::all_actions)
    }

    fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(PERMISSION_SEPARATOR)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
