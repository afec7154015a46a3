//! This crate provides the core business logic for jit-access:
//! - trust-policy document decoding/encoding
//! - principal-set grant/revoke editing
//! - the guarded fetch/edit/write sequence against IAM
//! - request-envelope validation and Step Functions task signaling
//!

pub mod aws;
mod commands;
mod error;
pub mod policy;
pub mod signal;
mod types;
mod validation;

// Re-exports for a small, focused public API
pub use aws::{IamRoleStore, RoleStore, RoleStoreError};
pub use commands::{ModifyOutput, TrustPolicyService};
pub use error::ServiceError;
pub use policy::{EditError, PolicyError, PrincipalSet, TrustPolicyDocument};
pub use signal::{Delivery, Outcome, SignalError, WorkflowSignal};
pub use types::{GrantOperation, GrantRecord, Identity, IdentityError, OpKind, RequestEnvelope};
pub use validation::{validate, ModifyRequest, ValidationError};
