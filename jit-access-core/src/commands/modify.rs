//! The fetch/edit/write sequence for one grant or revoke.

use chrono::Utc;
use serde_json::json;

use crate::aws::RoleStore;
use crate::error::ServiceError;
use crate::policy;
use crate::types::{GrantOperation, GrantRecord, Identity, OpKind};

/// Result of a successful modify. A grant carries the record the expiry
/// workflow schedules the matching revoke from; a revoke carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyOutput {
    pub identity: Identity,
    pub role_name: String,
    pub kind: OpKind,
    pub record: Option<GrantRecord>,
}

impl ModifyOutput {
    /// Payload handed to the orchestrator (or printed to a direct caller).
    pub fn workflow_payload(&self) -> serde_json::Value {
        match &self.record {
            Some(record) => record.workflow_payload(),
            None => json!({
                "user_arn": self.identity.as_str(),
                "op": self.kind.as_wire(),
                "role_name": self.role_name,
            }),
        }
    }
}

impl<S: RoleStore> super::service::TrustPolicyService<S> {
    /// Add or remove one principal on a role's trust policy.
    ///
    /// The write in step 5 is the single point of external mutation: any
    /// earlier failure guarantees the role is untouched. There is no
    /// read-modify-write transaction around the fetch and the write, so two
    /// concurrent invocations editing the same role can lose one update;
    /// accepted for the expected load of sporadic requests against a single
    /// role, since IAM offers no conditional `UpdateAssumeRolePolicy`.
    pub async fn modify(
        &self,
        role_name: &str,
        identity: &str,
        kind: OpKind,
    ) -> Result<ModifyOutput, ServiceError> {
        // Last line of defense: the request validator ran earlier, but
        // nothing else stands between here and a privileged write.
        let op = GrantOperation::new(kind, Identity::parse(identity)?);

        match &op {
            GrantOperation::Grant(identity) => {
                log::info!("appending {identity} to {role_name} role trust policy");
            }
            GrantOperation::Revoke(identity) => {
                log::info!("removing {identity} from {role_name} role trust policy");
            }
        }

        let raw = self.role_store.get_trust_policy(role_name).await?;
        let doc = policy::decode(&raw).map_err(|source| {
            // Full document context: a malformed policy means drift in an
            // external system and an operator will want to see it.
            log::error!("malformed trust policy for role {role_name}: {raw}");
            ServiceError::MalformedPolicy {
                role_name: role_name.to_owned(),
                source,
            }
        })?;

        let updated = policy::apply(doc.principals(), &op)?;

        if updated == *doc.principals() {
            log::info!(
                "{} already trusted by role {role_name}, nothing to write",
                op.identity()
            );
        } else {
            let encoded =
                policy::encode(&doc.with_principals(updated)).map_err(|source| {
                    ServiceError::MalformedPolicy {
                        role_name: role_name.to_owned(),
                        source,
                    }
                })?;
            self.role_store.put_trust_policy(role_name, &encoded).await?;
        }

        let record = match kind {
            OpKind::Grant => Some(GrantRecord::open(op.identity().clone(), Utc::now())),
            OpKind::Revoke => None,
        };

        Ok(ModifyOutput {
            identity: op.identity().clone(),
            role_name: role_name.to_owned(),
            kind,
            record,
        })
    }
}
