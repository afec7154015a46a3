//! AWS SDK integration: the role-store seam and credential plumbing.

pub mod iam_client;
pub mod sts;

use async_trait::async_trait;
use thiserror::Error;

pub use iam_client::IamRoleStore;

#[derive(Debug, Error)]
pub enum RoleStoreError {
    /// The named role does not exist. A deployment problem, not transient.
    #[error("role '{0}' not found")]
    RoleNotFound(String),
    /// The store handed back or refused a document we cannot work with.
    #[error("unusable trust policy document: {0}")]
    InvalidDocument(String),
    /// Transport, throttling, or auth failure. The only retryable class;
    /// retry policy belongs to the caller, not this crate.
    #[error("role store unavailable: {0}")]
    Unavailable(String),
}

/// External store holding each role's assume-role trust policy.
///
/// Modeled as an explicit fetch/write pair: there is no conditional write,
/// so concurrent edits to the same role can race (see the service docs).
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn get_trust_policy(&self, role_name: &str) -> Result<String, RoleStoreError>;
    async fn put_trust_policy(&self, role_name: &str, document: &str)
        -> Result<(), RoleStoreError>;
}
