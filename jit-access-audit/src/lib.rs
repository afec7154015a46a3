//! CloudTrail audit lookup: the events a grantee generated while their
//! grant window was open.
//!
//! This is a thin collaborator around `LookupEvents`; the trust-policy core
//! never depends on the result shape. Lookups run under an assumed
//! read-only role in the target account, mirroring the grant path.

use aws_config::SdkConfig;
use aws_sdk_cloudtrail::primitives::DateTime as SmithyDateTime;
use aws_sdk_cloudtrail::types::{Event, LookupAttribute, LookupAttributeKey};
use aws_sdk_cloudtrail::Client as CloudTrailClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use jit_access_core::aws::sts;
use jit_access_core::Identity;

/// CloudTrail caps LookupEvents pages at 50; one page is enough for a
/// one-hour grant window review.
const MAX_RESULTS: i32 = 50;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{0:?} is not a valid epoch-seconds timestamp")]
    InvalidTimestamp(String),
    #[error("could not build lookup request: {0}")]
    Request(String),
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}

/// Inclusive time window of a grant, from epoch-second strings as carried
/// through the workflow payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AuditWindow {
    /// The workflow carries timestamps as 10-digit epoch-second strings;
    /// anything else is rejected before a client is constructed.
    pub fn from_epoch_strings(created: &str, removal: &str) -> Result<Self, AuditError> {
        Ok(Self {
            start: parse_epoch(created)?,
            end: parse_epoch(removal)?,
        })
    }
}

fn parse_epoch(value: &str) -> Result<DateTime<Utc>, AuditError> {
    if value.len() != 10 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AuditError::InvalidTimestamp(value.to_owned()));
    }
    let secs: i64 = value
        .parse()
        .map_err(|_| AuditError::InvalidTimestamp(value.to_owned()))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| AuditError::InvalidTimestamp(value.to_owned()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub event_time: String,
    pub event_name: String,
    pub event_source: String,
}

impl AuditEvent {
    fn from_sdk(event: &Event) -> Self {
        Self {
            event_id: event.event_id().unwrap_or_default().to_owned(),
            event_time: event
                .event_time()
                .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            event_name: event.event_name().unwrap_or_default().to_owned(),
            event_source: event.event_source().unwrap_or_default().to_owned(),
        }
    }
}

/// Always carries the user and count so an empty window still produces a
/// meaningful report. The count is a string, like every numeric field in
/// the workflow payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub user: String,
    pub event_count: String,
    pub events: Vec<AuditEvent>,
}

pub struct AuditLookup {
    client: CloudTrailClient,
}

impl AuditLookup {
    pub fn new(client: CloudTrailClient) -> Self {
        Self { client }
    }

    /// CloudTrail client from the standard credential chain, optionally
    /// running in the target account via an assumed read-only role.
    pub async fn connect(assume_role_arn: Option<&str>, session_name: &str) -> Result<Self, AuditError> {
        let base: SdkConfig = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        let client = match assume_role_arn {
            Some(role_arn) => {
                let credentials = sts::assume_role_credentials(&base, role_arn, session_name)
                    .await
                    .map_err(|e| AuditError::Unavailable(e.to_string()))?;
                let config = aws_sdk_cloudtrail::config::Builder::from(&base)
                    .credentials_provider(credentials)
                    .build();
                CloudTrailClient::from_conf(config)
            }
            None => CloudTrailClient::new(&base),
        };
        Ok(Self::new(client))
    }

    /// Look up the grantee's events inside the grant window, keyed on the
    /// CloudTrail `Username` attribute from the identity ARN.
    pub async fn lookup(
        &self,
        identity: &Identity,
        window: &AuditWindow,
    ) -> Result<AuditReport, AuditError> {
        let username = identity.username();
        log::info!("looking up CloudTrail events for AWS username {username}");

        let attribute = LookupAttribute::builder()
            .attribute_key(LookupAttributeKey::Username)
            .attribute_value(username)
            .build()
            .map_err(|e| AuditError::Request(e.to_string()))?;

        let response = self
            .client
            .lookup_events()
            .lookup_attributes(attribute)
            .start_time(SmithyDateTime::from_secs(window.start.timestamp()))
            .end_time(SmithyDateTime::from_secs(window.end.timestamp()))
            .max_results(MAX_RESULTS)
            .send()
            .await
            .map_err(|e| {
                AuditError::Unavailable(format!(
                    "LookupEvents failed for {username}: {}",
                    e.into_service_error()
                ))
            })?;

        let events: Vec<AuditEvent> = response.events().iter().map(AuditEvent::from_sdk).collect();
        Ok(AuditReport {
            user: username.to_owned(),
            event_count: events.len().to_string(),
            events,
        })
    }
}
