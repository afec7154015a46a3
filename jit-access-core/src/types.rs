//! Shared domain types: validated identities, grant operations, the inbound
//! request envelope, and the grant record emitted for the expiry workflow.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Only IAM users may be granted temporary access; roles, root principals,
/// and federated identities are rejected at the boundary.
static IDENTITY_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws:iam::\d{12}:user/\w+$").expect("identity ARN pattern is valid")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0:?} is not an IAM user ARN")]
pub struct IdentityError(pub String);

/// An IAM user ARN of the shape `arn:aws:iam::<12-digit-account>:user/<name>`.
///
/// Immutable once validated; every path that mutates a trust policy goes
/// through [`Identity::parse`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn parse(arn: &str) -> Result<Self, IdentityError> {
        if IDENTITY_ARN.is_match(arn) {
            Ok(Self(arn.to_owned()))
        } else {
            Err(IdentityError(arn.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The user name segment after the final `/`, used as the CloudTrail
    /// lookup attribute and the assume-role session name.
    pub fn username(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

/// The two wire operations, `"add"` and `"remove"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Grant,
    Revoke,
}

impl OpKind {
    pub fn from_wire(op: &str) -> Option<Self> {
        match op {
            "add" => Some(Self::Grant),
            "remove" => Some(Self::Revoke),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Grant => "add",
            Self::Revoke => "remove",
        }
    }
}

/// A requested edit against one role's principal set, bound to the identity
/// it grants or revokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOperation {
    Grant(Identity),
    Revoke(Identity),
}

impl GrantOperation {
    pub fn new(kind: OpKind, identity: Identity) -> Self {
        match kind {
            OpKind::Grant => Self::Grant(identity),
            OpKind::Revoke => Self::Revoke(identity),
        }
    }

    pub fn identity(&self) -> &Identity {
        match self {
            Self::Grant(identity) | Self::Revoke(identity) => identity,
        }
    }
}

/// Inbound request envelope, as delivered by the Step Functions task state or
/// a direct invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub identity: Option<String>,
    pub op: Option<String>,
    pub role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_token: Option<String>,
}

/// Record of a successful grant. The expiry trigger downstream consumes the
/// `expires_at` timestamp to schedule the matching revoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GrantRecord {
    pub fn grant_window() -> Duration {
        Duration::hours(1)
    }

    pub fn open(identity: Identity, now: DateTime<Utc>) -> Self {
        Self {
            identity,
            created_at: now,
            expires_at: now + Self::grant_window(),
        }
    }

    /// Payload shape consumed by the state machine and persisted as the grant
    /// bookkeeping record: string epoch-seconds timestamps and a string hour
    /// count.
    pub fn workflow_payload(&self) -> serde_json::Value {
        json!({
            "user_arn": self.identity.as_str(),
            "created_timestamp": self.created_at.timestamp().to_string(),
            "removal_timestamp": self.expires_at.timestamp().to_string(),
            "hours_remaining": (self.expires_at - self.created_at).num_hours().to_string(),
        })
    }
}
