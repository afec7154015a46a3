//! The principal-set edit itself, kept pure so the invariants are checkable
//! without a role store.

use thiserror::Error;

use crate::policy::codec::PrincipalSet;
use crate::types::{GrantOperation, Identity};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The principal being revoked is not in the trust policy. A caller
    /// error, not a transient fault.
    #[error("{0} is not present in the trust policy")]
    NotFound(Identity),
    /// Revoking the last principal would leave the role unassumable.
    #[error("refusing an edit that would leave the trust policy with no principals")]
    WouldEmptySet,
}

/// Apply one grant or revoke to a principal set, producing the updated set
/// or a precise failure. The input set is never mutated.
///
/// Invariants: a successful result never has duplicate entries, never
/// reorders unrelated entries, and never has cardinality zero.
pub fn apply(set: &PrincipalSet, op: &GrantOperation) -> Result<PrincipalSet, EditError> {
    match op {
        GrantOperation::Grant(identity) => {
            if set.contains(identity) {
                // Idempotent: granting a principal that already has access
                // must not insert a duplicate.
                return Ok(set.clone());
            }
            let mut members = set.as_slice().to_vec();
            members.push(identity.as_str().to_owned());
            Ok(PrincipalSet::new(members))
        }
        GrantOperation::Revoke(identity) => {
            let mut members = set.as_slice().to_vec();
            let position = members
                .iter()
                .position(|member| member == identity.as_str())
                .ok_or_else(|| EditError::NotFound(identity.clone()))?;
            if members.len() == 1 {
                return Err(EditError::WouldEmptySet);
            }
            members.remove(position);
            Ok(PrincipalSet::new(members))
        }
    }
}
