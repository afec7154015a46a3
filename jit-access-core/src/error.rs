//! Error taxonomy for the trust-policy service.
//!
//! The split matters to callers: validation and edit failures are
//! caller-fault and must never be retried, `RoleStoreUnavailable` is the
//! single retryable class, and `MalformedPolicy` means an external system
//! has drifted and needs an operator.

use thiserror::Error;

use crate::aws::RoleStoreError;
use crate::policy::{EditError, PolicyError};
use crate::types::IdentityError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The identity failed the ARN shape check at the last line of defense
    /// before a privileged write.
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),
    /// The role store could not be read or written.
    #[error(transparent)]
    RoleStoreUnavailable(#[from] RoleStoreError),
    /// The stored trust policy has an unexpected shape.
    #[error("malformed trust policy for role '{role_name}': {source}")]
    MalformedPolicy {
        role_name: String,
        #[source]
        source: PolicyError,
    },
    /// Edit conflict: principal absent on revoke, or the revoke would leave
    /// the set empty. Propagated unchanged from the editor.
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl ServiceError {
    /// Machine-readable kind, surfaced in responses and orchestrator
    /// failure causes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentity(_) => "InvalidIdentity",
            Self::RoleStoreUnavailable(_) => "RoleStoreUnavailable",
            Self::MalformedPolicy { .. } => "MalformedPolicy",
            Self::Edit(EditError::NotFound(_)) => "NotFound",
            Self::Edit(EditError::WouldEmptySet) => "WouldEmptySet",
        }
    }

    /// Whether the caller may reasonably retry. Infrastructure faults only;
    /// this crate never retries in-process.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RoleStoreUnavailable(RoleStoreError::Unavailable(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identity;

    #[test]
    fn edit_conflicts_are_not_retryable() {
        let not_found = ServiceError::Edit(EditError::NotFound(
            Identity::parse("arn:aws:iam::123456789012:user/alice").unwrap(),
        ));
        assert_eq!(not_found.kind(), "NotFound");
        assert!(!not_found.is_retryable());

        let empty = ServiceError::Edit(EditError::WouldEmptySet);
        assert_eq!(empty.kind(), "WouldEmptySet");
        assert!(!empty.is_retryable());
    }

    #[test]
    fn transient_store_faults_are_retryable() {
        let err = ServiceError::RoleStoreUnavailable(RoleStoreError::Unavailable(
            "throttled".to_owned(),
        ));
        assert_eq!(err.kind(), "RoleStoreUnavailable");
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_role_is_not_retryable() {
        let err =
            ServiceError::RoleStoreUnavailable(RoleStoreError::RoleNotFound("prod".to_owned()));
        assert!(!err.is_retryable());
    }
}
