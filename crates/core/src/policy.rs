//! Access control lists for buckets and objects
//!
//! An [`AccessPolicy`] is the SDK-independent form of an S3 ACL: an optional
//! owner plus a list of grantee/permission pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Group URI for anonymous access
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Group URI for any authenticated account
pub const AUTHENTICATED_USERS_URI: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

/// Owner of a bucket or object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// The principal a grant applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Grantee {
    /// Anonymous, unauthenticated access
    AllUsers,
    AuthenticatedUsers,
    CanonicalUser {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    Email {
        address: String,
    },
    /// Any other predefined group, by URI
    Group {
        uri: String,
    },
    /// A grantee this crate does not model, carried through unchanged
    Other {
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
}

impl Grantee {
    /// Build a grantee from a group URI, recognising the well-known groups
    pub fn group(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        match uri.as_str() {
            ALL_USERS_URI => Self::AllUsers,
            AUTHENTICATED_USERS_URI => Self::AuthenticatedUsers,
            _ => Self::Group { uri },
        }
    }

    /// Group URI, if this grantee is a group
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::AllUsers => Some(ALL_USERS_URI),
            Self::AuthenticatedUsers => Some(AUTHENTICATED_USERS_URI),
            Self::Group { uri } => Some(uri),
            _ => None,
        }
    }
}

/// Permission carried by a grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    FullControl,
    Read,
    Write,
    ReadAcp,
    WriteAcp,
    /// A permission name this crate does not know, kept verbatim
    #[serde(untagged)]
    Other(String),
}

impl Permission {
    pub fn as_str(&self) -> &str {
        match self {
            Self::FullControl => "FULL_CONTROL",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        match s {
            "FULL_CONTROL" => Self::FullControl,
            "READ" => Self::Read,
            "WRITE" => Self::Write,
            "READ_ACP" => Self::ReadAcp,
            "WRITE_ACP" => Self::WriteAcp,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

/// Access control list attached to a bucket or object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl AccessPolicy {
    /// A policy with a single full-control grant for the owner
    pub fn private(owner: Owner) -> Self {
        let grantee = Grantee::CanonicalUser {
            id: owner.id.clone(),
            display_name: owner.display_name.clone(),
        };
        Self {
            owner: Some(owner),
            grants: vec![Grant {
                grantee,
                permission: Permission::FullControl,
            }],
        }
    }

    /// Add a grant. Granting an existing pair again is a no-op.
    pub fn grant(&mut self, grantee: Grantee, permission: Permission) {
        let exists = self
            .grants
            .iter()
            .any(|g| g.grantee == grantee && g.permission == permission);
        if !exists {
            self.grants.push(Grant {
                grantee,
                permission,
            });
        }
    }

    pub fn has_grant(&self, grantee: &Grantee, permission: Permission) -> bool {
        self.grants
            .iter()
            .any(|g| &g.grantee == grantee && g.permission == permission)
    }

    /// Whether anonymous users can read the resource
    pub fn allows_public_read(&self) -> bool {
        self.has_grant(&Grantee::AllUsers, Permission::Read)
            || self.has_grant(&Grantee::AllUsers, Permission::FullControl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Owner {
        Owner {
            id: "abc123".into(),
            display_name: Some("demo".into()),
        }
    }

    #[test]
    fn test_private_policy_is_not_public() {
        let policy = AccessPolicy::private(owner());
        assert_eq!(policy.grants.len(), 1);
        assert!(!policy.allows_public_read());
    }

    #[test]
    fn test_grant_public_read() {
        let mut policy = AccessPolicy::private(owner());
        policy.grant(Grantee::AllUsers, Permission::Read);
        assert!(policy.allows_public_read());
        assert_eq!(policy.grants.len(), 2);
    }

    #[test]
    fn test_grant_is_idempotent() {
        let mut policy = AccessPolicy::default();
        policy.grant(Grantee::AllUsers, Permission::Read);
        policy.grant(Grantee::AllUsers, Permission::Read);
        assert_eq!(policy.grants.len(), 1);
    }

    #[test]
    fn test_group_uri_mapping() {
        assert_eq!(Grantee::group(ALL_USERS_URI), Grantee::AllUsers);
        assert_eq!(
            Grantee::group(AUTHENTICATED_USERS_URI),
            Grantee::AuthenticatedUsers
        );
        let other = Grantee::group("http://acs.amazonaws.com/groups/s3/LogDelivery");
        assert!(matches!(other, Grantee::Group { .. }));
        assert_eq!(
            other.uri(),
            Some("http://acs.amazonaws.com/groups/s3/LogDelivery")
        );
    }

    #[test]
    fn test_permission_names() {
        for p in [
            Permission::FullControl,
            Permission::Read,
            Permission::Write,
            Permission::ReadAcp,
            Permission::WriteAcp,
        ] {
            assert_eq!(Permission::from(p.as_str()), p);
        }

        let custom = Permission::from("READ_LOGS");
        assert_eq!(custom, Permission::Other("READ_LOGS".into()));
        assert_eq!(custom.as_str(), "READ_LOGS");
    }

    #[test]
    fn test_unknown_permission_serializes_verbatim() {
        let grant = Grant {
            grantee: Grantee::AllUsers,
            permission: Permission::Other("READ_LOGS".into()),
        };
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["permission"], "READ_LOGS");
        assert_eq!(json["grantee"]["type"], "all_users");

        let back: Grant = serde_json::from_value(json).unwrap();
        assert_eq!(back, grant);

        let known: Permission = serde_json::from_str("\"READ\"").unwrap();
        assert_eq!(known, Permission::Read);
    }
}
