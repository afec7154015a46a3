//! First-pass validation of the inbound request envelope. The service
//! re-checks the identity shape before writing; this layer exists so a bad
//! request fails before any AWS client is constructed.

use thiserror::Error;

use crate::types::{Identity, OpKind, RequestEnvelope};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("op must be \"add\" or \"remove\", got {0:?}")]
    UnknownOp(String),
    #[error("{0:?} is not an IAM user ARN")]
    InvalidIdentity(String),
}

/// A request that passed validation, ready for the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    pub identity: String,
    pub role_name: String,
    pub kind: OpKind,
}

/// Validate the envelope, reporting the first failing field.
pub fn validate(envelope: &RequestEnvelope) -> Result<ModifyRequest, ValidationError> {
    let identity = envelope
        .identity
        .as_deref()
        .ok_or(ValidationError::MissingField("identity"))?;
    let op = envelope
        .op
        .as_deref()
        .ok_or(ValidationError::MissingField("op"))?;
    let role_name = envelope
        .role_name
        .as_deref()
        .ok_or(ValidationError::MissingField("roleName"))?;

    let kind =
        OpKind::from_wire(op).ok_or_else(|| ValidationError::UnknownOp(op.to_owned()))?;
    Identity::parse(identity)
        .map_err(|_| ValidationError::InvalidIdentity(identity.to_owned()))?;

    Ok(ModifyRequest {
        identity: identity.to_owned(),
        role_name: role_name.to_owned(),
        kind,
    })
}
