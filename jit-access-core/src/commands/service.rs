//! Trust-policy service layer.
//!
//! Holds the role store and provides the high-level modify operation used by
//! every adapter (CLI, Step Functions task). Generic over [`RoleStore`] so
//! tests can run against an in-memory store.

use crate::aws::iam_client::IamRoleStore;
use crate::aws::{sts, RoleStore};
use crate::error::ServiceError;

pub struct TrustPolicyService<S> {
    pub(crate) role_store: S,
}

impl<S: RoleStore> TrustPolicyService<S> {
    pub fn new(role_store: S) -> Self {
        Self { role_store }
    }
}

impl TrustPolicyService<IamRoleStore> {
    /// Create a service backed by IAM, using the standard credential
    /// provider chain. When `assume_role_arn` is set, IAM calls run in the
    /// target account via that role.
    pub async fn connect(assume_role_arn: Option<&str>) -> Result<Self, ServiceError> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        let iam = match assume_role_arn {
            Some(role_arn) => sts::iam_client_for_role(&config, role_arn, "jit-access-grant").await?,
            None => aws_sdk_iam::Client::new(&config),
        };
        Ok(Self::new(IamRoleStore::new(iam)))
    }
}
