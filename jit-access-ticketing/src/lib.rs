//! Jira ticketing for the grant workflow: open the access-request ticket
//! and attach follow-up comments (for example the audit report) to it.
//!
//! Credentials live in Secrets Manager as a JSON `{"user": ..., "pass": ...}`
//! pair; the Jira Cloud REST API is driven directly over HTTPS.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Ticket title for every access request; the reason goes in the body.
const ISSUE_SUMMARY: &str = "Requesting admin access to production";
const ISSUE_TYPE: &str = "Task";

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("could not read Jira credentials from Secrets Manager: {0}")]
    Secret(String),
    #[error("Jira credentials secret is malformed: {0}")]
    Credentials(String),
    #[error("Jira request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Jira API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Jira created an issue but returned no key")]
    MissingKey,
}

/// Static Jira wiring, usually taken from the environment.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub server: String,
    pub project_key: String,
    /// Jira Cloud assigns by account id, not display name.
    pub assignee_id: String,
    pub secret_id: String,
}

impl JiraConfig {
    pub fn from_env() -> Result<Self, TicketError> {
        Ok(Self {
            server: require_env("JIRA_SERVER")?,
            project_key: require_env("JIRA_PROJECT_KEY")?,
            assignee_id: require_env("JIRA_ASSIGNEE_ID")?,
            secret_id: std::env::var("JIRA_SECRET_ID")
                .unwrap_or_else(|_| "jira-creds-admintool".to_owned()),
        })
    }
}

fn require_env(name: &'static str) -> Result<String, TicketError> {
    std::env::var(name).map_err(|_| TicketError::MissingEnv(name))
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraCredentials {
    pub user: String,
    pub pass: String,
}

/// Fetch and parse the Jira credential pair from Secrets Manager.
pub async fn fetch_credentials(
    client: &aws_sdk_secretsmanager::Client,
    secret_id: &str,
) -> Result<JiraCredentials, TicketError> {
    let response = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| TicketError::Secret(e.into_service_error().to_string()))?;
    let secret_string = response
        .secret_string()
        .ok_or_else(|| TicketError::Credentials("secret has no string payload".to_owned()))?;
    serde_json::from_str(secret_string)
        .map_err(|e| TicketError::Credentials(format!("expected {{user, pass}} JSON: {e}")))
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: Option<String>,
}

pub struct TicketClient {
    http: reqwest::Client,
    config: JiraConfig,
    credentials: JiraCredentials,
}

impl TicketClient {
    pub fn new(config: JiraConfig, credentials: JiraCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            credentials,
        }
    }

    /// Resolve credentials from Secrets Manager and build the client.
    pub async fn connect(config: JiraConfig) -> Result<Self, TicketError> {
        let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        let secrets = aws_sdk_secretsmanager::Client::new(&aws);
        let credentials = fetch_credentials(&secrets, &config.secret_id).await?;
        log::info!("obtained Jira credentials, connecting to {}", config.server);
        Ok(Self::new(config, credentials))
    }

    /// Open the access-request ticket; returns the issue key.
    pub async fn create_issue(&self, reason: &str) -> Result<String, TicketError> {
        let payload = create_issue_payload(&self.config, reason);
        log::info!("creating ticket in project {}", self.config.project_key);

        let response = self
            .http
            .post(format!("{}/rest/api/2/issue", self.config.server))
            .basic_auth(&self.credentials.user, Some(&self.credentials.pass))
            .json(&payload)
            .send()
            .await?;
        let created: CreatedIssue = check(response).await?.json().await?;
        let key = created.key.ok_or(TicketError::MissingKey)?;
        log::info!("created Jira issue {key}");
        Ok(key)
    }

    /// Attach a comment to an existing ticket.
    pub async fn add_comment(&self, issue_key: &str, comment: &str) -> Result<(), TicketError> {
        let response = self
            .http
            .post(format!(
                "{}/rest/api/2/issue/{issue_key}/comment",
                self.config.server
            ))
            .basic_auth(&self.credentials.user, Some(&self.credentials.pass))
            .json(&json!({ "body": comment }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, TicketError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TicketError::Api {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

fn create_issue_payload(config: &JiraConfig, reason: &str) -> Value {
    json!({
        "fields": {
            "summary": ISSUE_SUMMARY,
            "issuetype": { "name": ISSUE_TYPE },
            "project": { "key": config.project_key },
            "assignee": { "id": config.assignee_id },
            "description": reason,
        }
    })
}
