//! Commands module - service layer for trust-policy operations.

mod modify;
mod service;

pub use modify::ModifyOutput;
pub use service::TrustPolicyService;
