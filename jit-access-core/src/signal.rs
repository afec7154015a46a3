//! Task-completion signaling back to the workflow orchestrator.
//!
//! A request either arrives through the Step Functions state machine, which
//! hands us a task token, or directly from an operator. The caller decides
//! which [`Delivery`] applies up front; the terminal action for any outcome
//! is then exactly one of "signal the orchestrator" or "return to the
//! caller", never both and never neither.

use serde_json::Value;
use thiserror::Error;

use crate::error::ServiceError;
use crate::validation::ValidationError;

/// How the result of this invocation leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Report back through Step Functions using the task token.
    Orchestrated { task_token: String },
    /// Direct invocation: success goes to the caller, failure is logged.
    Direct,
}

impl Delivery {
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(task_token) => Self::Orchestrated { task_token },
            None => Self::Direct,
        }
    }
}

/// The terminal result of one invocation, with a machine-readable failure
/// kind so the orchestrator can distinguish caller errors from transient
/// faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Value),
    Failure { kind: String, reason: String },
}

impl Outcome {
    pub fn success(payload: Value) -> Self {
        Self::Success(payload)
    }

    /// Failure with a caller-chosen kind, for collaborators outside the
    /// trust-policy core (audit lookup, ticketing).
    pub fn failure(kind: &str, reason: &str) -> Self {
        Self::Failure {
            kind: kind.to_owned(),
            reason: reason.to_owned(),
        }
    }

    pub fn from_service_error(err: &ServiceError) -> Self {
        Self::Failure {
            kind: err.kind().to_owned(),
            reason: err.to_string(),
        }
    }

    pub fn from_validation_error(err: &ValidationError) -> Self {
        Self::Failure {
            kind: "ValidationError".to_owned(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("unable to report task completion: {0}")]
    Orchestrator(String),
    #[error("task output is not serializable: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Thin adapter over the Step Functions callback API.
pub struct WorkflowSignal {
    client: aws_sdk_sfn::Client,
}

impl WorkflowSignal {
    pub fn new(client: aws_sdk_sfn::Client) -> Self {
        Self { client }
    }

    pub async fn connect() -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::new(aws_sdk_sfn::Client::new(&config))
    }

    pub async fn notify_success(&self, task_token: &str, payload: &Value) -> Result<(), SignalError> {
        let output = serde_json::to_string(payload)?;
        self.client
            .send_task_success()
            .task_token(task_token)
            .output(output)
            .send()
            .await
            .map_err(|e| SignalError::Orchestrator(e.into_service_error().to_string()))?;
        Ok(())
    }

    pub async fn notify_failure(
        &self,
        task_token: &str,
        kind: &str,
        reason: &str,
    ) -> Result<(), SignalError> {
        log::error!("notifying task of failure: {kind}: {reason}");
        self.client
            .send_task_failure()
            .task_token(task_token)
            .error(kind)
            .cause(reason)
            .send()
            .await
            .map_err(|e| SignalError::Orchestrator(e.into_service_error().to_string()))?;
        Ok(())
    }

    /// Deliver an outcome under the chosen strategy. In direct mode the
    /// success payload is the caller's to print or persist; failures are
    /// only logged here.
    pub async fn deliver(&self, delivery: &Delivery, outcome: &Outcome) -> Result<(), SignalError> {
        match (delivery, outcome) {
            (Delivery::Orchestrated { task_token }, Outcome::Success(payload)) => {
                self.notify_success(task_token, payload).await
            }
            (Delivery::Orchestrated { task_token }, Outcome::Failure { kind, reason }) => {
                self.notify_failure(task_token, kind, reason).await
            }
            (Delivery::Direct, Outcome::Success(_)) => Ok(()),
            (Delivery::Direct, Outcome::Failure { kind, reason }) => {
                log::error!("no task to notify, but failure occurred: {kind}: {reason}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::EditError;

    #[test]
    fn delivery_follows_token_presence() {
        assert_eq!(
            Delivery::from_token(Some("tok".to_owned())),
            Delivery::Orchestrated {
                task_token: "tok".to_owned()
            }
        );
        assert_eq!(Delivery::from_token(None), Delivery::Direct);
    }

    #[test]
    fn service_errors_keep_their_kind() {
        let outcome = Outcome::from_service_error(&ServiceError::Edit(EditError::WouldEmptySet));
        match outcome {
            Outcome::Failure { kind, reason } => {
                assert_eq!(kind, "WouldEmptySet");
                assert!(reason.contains("no principals"));
            }
            Outcome::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn caller_chosen_failure_kinds_are_preserved() {
        let outcome = Outcome::failure("AuditLookupFailed", "LookupEvents timed out");
        assert_eq!(
            outcome,
            Outcome::Failure {
                kind: "AuditLookupFailed".to_owned(),
                reason: "LookupEvents timed out".to_owned(),
            }
        );
    }

    #[test]
    fn validation_errors_map_to_validation_kind() {
        let outcome =
            Outcome::from_validation_error(&ValidationError::MissingField("identity"));
        match outcome {
            Outcome::Failure { kind, .. } => assert_eq!(kind, "ValidationError"),
            Outcome::Success(_) => panic!("expected failure"),
        }
    }
}
