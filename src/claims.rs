//! Identity claims carried inside an access token.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse system-wide role. The authorization component owns what each role
/// may do; here it is only carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemRole {
    #[default]
    Guest,
    Authenticated,
    System,
    Administrator,
}

impl SystemRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Authenticated => "Authenticated",
            Self::System => "System",
            Self::Administrator => "Administrator",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Self::Guest),
            "authenticated" => Ok(Self::Authenticated),
            "system" => Ok(Self::System),
            "administrator" => Ok(Self::Administrator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A privilege scoped to a service, optionally narrowed to one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "ObjectName", default, skip_serializing_if = "String::is_empty")]
    pub object_name: String,
    #[serde(
        rename = "ObjectIdentity",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub object_identity: String,
    #[serde(rename = "Role", default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(rename = "Actions", default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

impl Privilege {
    #[must_use]
    pub fn new(service_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            role: role.into(),
            ..Self::default()
        }
    }
}

/// Roles every signed-in account holds implicitly.
const IMPLICIT_ROLES: [&str; 2] = ["All", "Authenticated"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "ID")]
    pub user_id: String,
    #[serde(rename = "Role", default)]
    pub role: SystemRole,
    #[serde(rename = "Roles", default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(rename = "Privileges", default, skip_serializing_if = "Vec::is_empty")]
    pub privileges: Vec<Privilege>,
}

impl Claims {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: SystemRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            roles: Vec::new(),
            privileges: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_privileges(mut self, privileges: Vec<Privilege>) -> Self {
        self.privileges = privileges;
        self
    }

    /// Working roles plus the implicit `All` and `Authenticated`, without
    /// duplicates, first occurrence wins.
    #[must_use]
    pub fn effective_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = Vec::with_capacity(self.roles.len() + IMPLICIT_ROLES.len());
        for role in self
            .roles
            .iter()
            .map(String::as_str)
            .chain(IMPLICIT_ROLES)
        {
            if !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }
        roles
    }
}
