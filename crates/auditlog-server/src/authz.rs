//! Authorization gate for the audit feeds.
//!
//! Every decision is made from a fresh directory lookup; nothing is cached
//! between requests. Any resolved caller may read their own events. Only
//! the domain owner may read the whole domain.

use auditlog_types::CallerContext;
use thiserror::Error;

use crate::directory::{
    resource_id, Directory, DirectoryError, DOMAIN_REF_PREFIX, USER_REF_PREFIX,
};

/// Reasons a caller may not see the requested feed.
///
/// The variants exist for logging. Clients only ever see a generic
/// "unauthorized" response, whichever variant caused it.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The directory has no record of the caller.
    #[error("user '{0}' is not known to the directory")]
    UnknownUser(String),

    /// The caller's domain has no recorded owner.
    #[error("domain '{0}' is not known to the directory")]
    UnknownDomain(String),

    /// The caller is not the owner of their domain.
    #[error("user '{user_id}' is not the owner of domain '{domain}'")]
    NotDomainAdmin {
        /// The caller.
        user_id: String,
        /// The caller's domain.
        domain: String,
    },

    /// The directory could not be consulted.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Looks up the domain `user_id` belongs to.
///
/// # Errors
///
/// Returns `AuthzError::UnknownUser` when the directory has no domain
/// reference for the user, or the reference is not a domain reference.
pub fn resolve_domain(directory: &dyn Directory, user_id: &str) -> Result<String, AuthzError> {
    let domain_ref = directory
        .user_domain_ref(user_id)?
        .ok_or_else(|| AuthzError::UnknownUser(user_id.to_string()))?;

    resource_id(&domain_ref, DOMAIN_REF_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| AuthzError::UnknownUser(user_id.to_string()))
}

/// Succeeds only if `user_id` is the recorded owner of `domain`.
///
/// # Errors
///
/// Returns `AuthzError::UnknownDomain` when the domain has no owner record
/// and `AuthzError::NotDomainAdmin` when the owner is someone else or the
/// owner record is not a user reference.
pub fn authorize_admin(
    directory: &dyn Directory,
    user_id: &str,
    domain: &str,
) -> Result<(), AuthzError> {
    let owner_ref = directory
        .domain_owner_ref(domain)?
        .ok_or_else(|| AuthzError::UnknownDomain(domain.to_string()))?;

    if resource_id(&owner_ref, USER_REF_PREFIX) == Some(user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotDomainAdmin {
            user_id: user_id.to_string(),
            domain: domain.to_string(),
        })
    }
}

/// Resolves the caller's context for one request.
///
/// With `require_admin` set, the caller must own their domain and
/// `is_domain_admin` is `true` on success. Without it no ownership check
/// is made and `is_domain_admin` stays `false`.
///
/// # Errors
///
/// Propagates [`resolve_domain`] and [`authorize_admin`] failures.
pub fn resolve_caller(
    directory: &dyn Directory,
    user_id: &str,
    require_admin: bool,
) -> Result<CallerContext, AuthzError> {
    let domain = resolve_domain(directory, user_id)?;

    if require_admin {
        authorize_admin(directory, user_id, &domain)?;
    }

    Ok(CallerContext {
        user_id: user_id.to_string(),
        domain,
        is_domain_admin: require_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;

    fn directory() -> StaticDirectory {
        StaticDirectory::new()
            .with_user("owner", "acme")
            .with_user("member", "acme")
            .with_user("orphan", "nowhere")
            .with_domain("acme", "owner")
    }

    #[test]
    fn resolve_domain_for_known_user() {
        assert_eq!(resolve_domain(&directory(), "member").unwrap(), "acme");
    }

    #[test]
    fn resolve_domain_for_unknown_user() {
        let err = resolve_domain(&directory(), "stranger").unwrap_err();
        assert!(matches!(err, AuthzError::UnknownUser(ref u) if u == "stranger"));
    }

    #[test]
    fn owner_passes_admin_check() {
        authorize_admin(&directory(), "owner", "acme").expect("owner should be admin");
    }

    #[test]
    fn member_fails_admin_check() {
        let err = authorize_admin(&directory(), "member", "acme").unwrap_err();
        assert!(matches!(err, AuthzError::NotDomainAdmin { .. }));
    }

    #[test]
    fn unknown_domain_fails_admin_check() {
        let err = authorize_admin(&directory(), "orphan", "nowhere").unwrap_err();
        assert!(matches!(err, AuthzError::UnknownDomain(ref d) if d == "nowhere"));
    }

    #[test]
    fn resolve_caller_for_admin_feed() {
        let ctx = resolve_caller(&directory(), "owner", true).unwrap();
        assert_eq!(
            ctx,
            CallerContext {
                user_id: "owner".to_string(),
                domain: "acme".to_string(),
                is_domain_admin: true,
            }
        );

        assert!(resolve_caller(&directory(), "member", true).is_err());
    }

    /// Directory whose records point at the wrong kind of resource.
    struct MixedUpDirectory;

    impl Directory for MixedUpDirectory {
        fn user_domain_ref(&self, user_id: &str) -> Result<Option<String>, DirectoryError> {
            Ok(Some(match user_id {
                "alice" => "/directory/domains/acme".to_string(),
                _ => format!("/directory/users/{user_id}"),
            }))
        }

        fn domain_owner_ref(&self, _domain: &str) -> Result<Option<String>, DirectoryError> {
            Ok(Some("/directory/domains/alice".to_string()))
        }
    }

    #[test]
    fn domain_reference_never_grants_ownership() {
        let err = authorize_admin(&MixedUpDirectory, "alice", "acme").unwrap_err();
        assert!(matches!(err, AuthzError::NotDomainAdmin { .. }));
        assert!(resolve_caller(&MixedUpDirectory, "alice", true).is_err());
    }

    #[test]
    fn user_reference_is_not_a_domain() {
        let err = resolve_domain(&MixedUpDirectory, "bob").unwrap_err();
        assert!(matches!(err, AuthzError::UnknownUser(ref u) if u == "bob"));
    }

    #[test]
    fn resolve_caller_for_self_feed_skips_ownership() {
        let ctx = resolve_caller(&directory(), "orphan", false).unwrap();
        assert_eq!(ctx.domain, "nowhere");
        assert!(!ctx.is_domain_admin);
    }
}
