//! Conversion between SDK ACL types and [`ssd_core::AccessPolicy`]

use aws_sdk_s3::types::{
    AccessControlPolicy, Grant as SdkGrant, Grantee as SdkGrantee, Owner as SdkOwner,
    Permission as SdkPermission, Type,
};

use ssd_core::{AccessPolicy, Error, Grant, Grantee, Owner, Permission, Result};

/// Build an [`AccessPolicy`] from the owner and grants of an ACL response
pub fn from_sdk(owner: Option<&SdkOwner>, grants: &[SdkGrant]) -> AccessPolicy {
    let owner = owner.and_then(|o| {
        o.id().map(|id| Owner {
            id: id.to_string(),
            display_name: o.display_name().map(str::to_string),
        })
    });

    let grants = grants
        .iter()
        .filter_map(|g| match (g.grantee(), g.permission()) {
            (Some(grantee), Some(permission)) => Some(Grant {
                grantee: grantee_from_sdk(grantee),
                permission: Permission::from(permission.as_str()),
            }),
            _ => {
                tracing::warn!("Grant without grantee or permission will not be re-applied");
                None
            }
        })
        .collect();

    AccessPolicy { owner, grants }
}

fn grantee_from_sdk(grantee: &SdkGrantee) -> Grantee {
    match (
        grantee.r#type(),
        grantee.uri(),
        grantee.id(),
        grantee.email_address(),
    ) {
        (Type::Group, Some(uri), _, _) => Grantee::group(uri),
        (Type::CanonicalUser, _, Some(id), _) => Grantee::CanonicalUser {
            id: id.to_string(),
            display_name: grantee.display_name().map(str::to_string),
        },
        (Type::AmazonCustomerByEmail, _, _, Some(address)) => Grantee::Email {
            address: address.to_string(),
        },
        (kind, ..) => {
            tracing::debug!(grantee_type = kind.as_str(), "Keeping unrecognised grantee as-is");
            Grantee::Other {
                kind: kind.as_str().to_string(),
                id: grantee.id().map(str::to_string),
                display_name: grantee.display_name().map(str::to_string),
                uri: grantee.uri().map(str::to_string),
                email: grantee.email_address().map(str::to_string),
            }
        }
    }
}

/// Build the SDK request body for a `put_*_acl` call
pub fn to_sdk(policy: &AccessPolicy) -> Result<AccessControlPolicy> {
    let mut builder = AccessControlPolicy::builder();

    if let Some(owner) = &policy.owner {
        builder = builder.owner(
            SdkOwner::builder()
                .id(&owner.id)
                .set_display_name(owner.display_name.clone())
                .build(),
        );
    }

    for grant in &policy.grants {
        builder = builder.grants(
            SdkGrant::builder()
                .grantee(grantee_to_sdk(&grant.grantee)?)
                .permission(SdkPermission::from(grant.permission.as_str()))
                .build(),
        );
    }

    Ok(builder.build())
}

fn grantee_to_sdk(grantee: &Grantee) -> Result<SdkGrantee> {
    let builder = match grantee {
        Grantee::AllUsers | Grantee::AuthenticatedUsers | Grantee::Group { .. } => {
            SdkGrantee::builder()
                .r#type(Type::Group)
                .set_uri(grantee.uri().map(str::to_string))
        }
        Grantee::CanonicalUser { id, display_name } => SdkGrantee::builder()
            .r#type(Type::CanonicalUser)
            .id(id)
            .set_display_name(display_name.clone()),
        Grantee::Email { address } => SdkGrantee::builder()
            .r#type(Type::AmazonCustomerByEmail)
            .email_address(address),
        Grantee::Other {
            kind,
            id,
            display_name,
            uri,
            email,
        } => SdkGrantee::builder()
            .r#type(Type::from(kind.as_str()))
            .set_id(id.clone())
            .set_display_name(display_name.clone())
            .set_uri(uri.clone())
            .set_email_address(email.clone()),
    };

    builder
        .build()
        .map_err(|e| Error::Client(format!("Invalid grantee: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssd_core::policy::ALL_USERS_URI;

    fn owner_policy() -> AccessPolicy {
        AccessPolicy::private(Owner {
            id: "owner-id".into(),
            display_name: Some("owner".into()),
        })
    }

    #[test]
    fn test_public_read_grant_to_sdk() {
        let mut policy = owner_policy();
        policy.grant(Grantee::AllUsers, Permission::Read);

        let sdk = to_sdk(&policy).unwrap();
        assert_eq!(sdk.owner().and_then(|o| o.id()), Some("owner-id"));
        assert_eq!(sdk.grants().len(), 2);

        let public = &sdk.grants()[1];
        let grantee = public.grantee().unwrap();
        assert_eq!(grantee.r#type(), &Type::Group);
        assert_eq!(grantee.uri(), Some(ALL_USERS_URI));
        assert_eq!(public.permission(), Some(&SdkPermission::Read));
    }

    #[test]
    fn test_sdk_to_policy() {
        let owner = SdkOwner::builder().id("owner-id").build();
        let grants = vec![
            SdkGrant::builder()
                .grantee(
                    SdkGrantee::builder()
                        .r#type(Type::CanonicalUser)
                        .id("owner-id")
                        .build()
                        .unwrap(),
                )
                .permission(SdkPermission::FullControl)
                .build(),
            SdkGrant::builder()
                .grantee(
                    SdkGrantee::builder()
                        .r#type(Type::Group)
                        .uri(ALL_USERS_URI)
                        .build()
                        .unwrap(),
                )
                .permission(SdkPermission::Read)
                .build(),
            // Grant without a grantee cannot be sent back
            SdkGrant::builder().permission(SdkPermission::Write).build(),
        ];

        let policy = from_sdk(Some(&owner), &grants);
        assert_eq!(policy.owner.as_ref().map(|o| o.id.as_str()), Some("owner-id"));
        assert_eq!(policy.grants.len(), 2);
        assert!(policy.allows_public_read());
    }

    #[test]
    fn test_email_grantee_to_sdk() {
        let mut policy = AccessPolicy::default();
        policy.grant(
            Grantee::Email {
                address: "dev@example.com".into(),
            },
            Permission::ReadAcp,
        );

        let sdk = to_sdk(&policy).unwrap();
        assert!(sdk.owner().is_none());
        let grantee = sdk.grants()[0].grantee().unwrap();
        assert_eq!(grantee.r#type(), &Type::AmazonCustomerByEmail);
        assert_eq!(grantee.email_address(), Some("dev@example.com"));
    }

    #[test]
    fn test_unrecognised_grants_survive_reapply() {
        let grants = vec![
            SdkGrant::builder()
                .grantee(
                    SdkGrantee::builder()
                        .r#type(Type::from("LogDeliveryService"))
                        .id("log-delivery")
                        .build()
                        .unwrap(),
                )
                .permission(SdkPermission::Read)
                .build(),
            SdkGrant::builder()
                .grantee(
                    SdkGrantee::builder()
                        .r#type(Type::Group)
                        .uri(ALL_USERS_URI)
                        .build()
                        .unwrap(),
                )
                .permission(SdkPermission::from("READ_LOGS"))
                .build(),
        ];

        let policy = from_sdk(None, &grants);
        assert_eq!(policy.grants.len(), 2);
        assert!(matches!(
            &policy.grants[0].grantee,
            Grantee::Other { kind, id: Some(id), .. }
                if kind == "LogDeliveryService" && id == "log-delivery"
        ));
        assert_eq!(
            policy.grants[1].permission,
            Permission::Other("READ_LOGS".into())
        );

        let sdk = to_sdk(&policy).unwrap();
        let kept = sdk.grants()[0].grantee().unwrap();
        assert_eq!(kept.r#type().as_str(), "LogDeliveryService");
        assert_eq!(kept.id(), Some("log-delivery"));
        assert_eq!(
            sdk.grants()[1].permission().map(|p| p.as_str()),
            Some("READ_LOGS")
        );
    }
}
