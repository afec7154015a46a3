//! Cross-account credential plumbing.
//!
//! The grant workflow runs in a management account and assumes a narrowly
//! scoped role in the target account before touching IAM there.

use aws_config::SdkConfig;
use aws_sdk_iam::config::Credentials;
use aws_sdk_sts::Client as StsClient;

use crate::aws::RoleStoreError;

/// Assume `role_arn` and return the temporary credentials.
pub async fn assume_role_credentials(
    base: &SdkConfig,
    role_arn: &str,
    session_name: &str,
) -> Result<Credentials, RoleStoreError> {
    let sts = StsClient::new(base);
    let response = sts
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(|e| {
            RoleStoreError::Unavailable(format!(
                "unable to assume role {role_arn}: {}",
                e.into_service_error()
            ))
        })?;

    let credentials = response.credentials.ok_or_else(|| {
        RoleStoreError::Unavailable(format!("AssumeRole for {role_arn} returned no credentials"))
    })?;

    log::info!("assumed role {role_arn}");
    Ok(Credentials::new(
        credentials.access_key_id,
        credentials.secret_access_key,
        Some(credentials.session_token),
        None,
        "jit-access-assume-role",
    ))
}

/// IAM client operating in the target account via an assumed role.
pub async fn iam_client_for_role(
    base: &SdkConfig,
    role_arn: &str,
    session_name: &str,
) -> Result<aws_sdk_iam::Client, RoleStoreError> {
    let credentials = assume_role_credentials(base, role_arn, session_name).await?;
    let config = aws_sdk_iam::config::Builder::from(base)
        .credentials_provider(credentials)
        .build();
    Ok(aws_sdk_iam::Client::from_conf(config))
}
