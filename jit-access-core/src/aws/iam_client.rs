//! IAM-backed role store: `GetRole` / `UpdateAssumeRolePolicy`.

use async_trait::async_trait;
use aws_sdk_iam::Client as IamClient;

use crate::aws::{RoleStore, RoleStoreError};

pub struct IamRoleStore {
    client: IamClient,
}

impl IamRoleStore {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleStore for IamRoleStore {
    async fn get_trust_policy(&self, role_name: &str) -> Result<String, RoleStoreError> {
        let response = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_entity_exception() {
                    RoleStoreError::RoleNotFound(role_name.to_owned())
                } else {
                    RoleStoreError::Unavailable(format!(
                        "GetRole failed for role '{role_name}': {service_err}"
                    ))
                }
            })?;

        let encoded = response
            .role()
            .and_then(|role| role.assume_role_policy_document())
            .ok_or_else(|| {
                RoleStoreError::InvalidDocument(format!(
                    "role '{role_name}' has no assume-role policy document"
                ))
            })?;

        // GetRole returns the trust policy URL-encoded.
        let decoded = percent_encoding::percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|e| {
                RoleStoreError::InvalidDocument(format!(
                    "trust policy for role '{role_name}' is not valid UTF-8 after URL decoding: {e}"
                ))
            })?;
        Ok(decoded.into_owned())
    }

    async fn put_trust_policy(
        &self,
        role_name: &str,
        document: &str,
    ) -> Result<(), RoleStoreError> {
        self.client
            .update_assume_role_policy()
            .role_name(role_name)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_entity_exception() {
                    RoleStoreError::RoleNotFound(role_name.to_owned())
                } else if service_err.is_malformed_policy_document_exception() {
                    RoleStoreError::InvalidDocument(format!(
                        "IAM rejected the updated trust policy for role '{role_name}': {service_err}"
                    ))
                } else {
                    RoleStoreError::Unavailable(format!(
                        "UpdateAssumeRolePolicy failed for role '{role_name}': {service_err}"
                    ))
                }
            })?;
        log::info!("updated trust policy for role {role_name}");
        Ok(())
    }
}
