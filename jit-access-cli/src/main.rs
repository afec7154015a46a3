//! jit-access command line entry point.
//!
//! Every subcommand can run standalone, and every subcommand speaks the
//! Step Functions callback protocol when a task token is supplied, so the
//! same binary serves both the orchestrated workflow and an operator at a
//! terminal.

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use jit_access_audit::{AuditLookup, AuditWindow};
use jit_access_core::{
    validate, Delivery, Identity, Outcome, RequestEnvelope, TrustPolicyService, WorkflowSignal,
};
use jit_access_ticketing::{JiraConfig, TicketClient};

#[derive(Parser)]
#[command(
    name = "jit-access",
    version,
    about = "Just-in-time elevated-access grants for AWS"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or remove a principal on the privileged role's trust policy
    ModifyRole {
        /// Read the request envelope as JSON from a file, or '-' for stdin
        #[arg(long, conflicts_with_all = ["identity", "op"])]
        event: Option<String>,
        /// IAM user ARN being granted or revoked
        #[arg(long)]
        identity: Option<String>,
        /// "add" or "remove"
        #[arg(long)]
        op: Option<String>,
        /// Name of the role whose trust policy is edited
        #[arg(long, env = "JIT_ROLE_NAME")]
        role_name: Option<String>,
        /// Role assumed in the target account before touching IAM
        #[arg(long, env = "JIT_ROLE_ARN_TO_ASSUME")]
        assume_role: Option<String>,
        /// Step Functions task token for orchestrated invocations
        #[arg(long)]
        task_token: Option<String>,
    },
    /// CloudTrail events for a grantee inside a grant window
    AuditLookup {
        /// IAM user ARN of the grantee
        #[arg(long)]
        identity: String,
        /// Grant start, epoch seconds
        #[arg(long)]
        created: String,
        /// Grant end, epoch seconds
        #[arg(long)]
        removal: String,
        /// Read-only role assumed in the target account
        #[arg(long, env = "JIT_AUDIT_ROLE_ARN")]
        assume_role: Option<String>,
        /// Step Functions task token for orchestrated invocations
        #[arg(long)]
        task_token: Option<String>,
    },
    /// Jira ticket operations for the grant workflow
    Ticket {
        /// Step Functions task token for orchestrated invocations
        #[arg(long, global = true)]
        task_token: Option<String>,
        #[command(subcommand)]
        action: TicketAction,
    },
}

#[derive(Subcommand)]
enum TicketAction {
    /// Open the access-request ticket
    Create {
        /// Why access is being requested; becomes the ticket body
        #[arg(long)]
        reason: String,
    },
    /// Attach a comment (for example the audit report) to a ticket
    Comment {
        #[arg(long)]
        issue_key: String,
        #[arg(long)]
        comment: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::ModifyRole {
            event,
            identity,
            op,
            role_name,
            assume_role,
            task_token,
        } => modify_role(event, identity, op, role_name, assume_role, task_token).await,
        Commands::AuditLookup {
            identity,
            created,
            removal,
            assume_role,
            task_token,
        } => {
            audit_lookup(
                &identity,
                &created,
                &removal,
                assume_role.as_deref(),
                task_token,
            )
            .await
        }
        Commands::Ticket { task_token, action } => ticket(action, task_token).await,
    }
}

async fn modify_role(
    event: Option<String>,
    identity: Option<String>,
    op: Option<String>,
    role_name: Option<String>,
    assume_role: Option<String>,
    task_token: Option<String>,
) -> Result<()> {
    let mut envelope = match event {
        Some(path) => read_envelope(&path)?,
        None => RequestEnvelope {
            identity,
            op,
            role_name: None,
            correlation_token: None,
        },
    };
    // The role name usually comes from the deployment environment rather
    // than the envelope; flags and env fill whatever the envelope left open.
    if envelope.role_name.is_none() {
        envelope.role_name = role_name;
    }
    if envelope.correlation_token.is_none() {
        envelope.correlation_token = task_token;
    }

    // Chosen once, up front: everything downstream reports through exactly
    // this strategy.
    let delivery = Delivery::from_token(envelope.correlation_token.clone());

    let request = match validate(&envelope) {
        Ok(request) => request,
        Err(err) => return finish(&delivery, Outcome::from_validation_error(&err)).await,
    };

    let outcome = match TrustPolicyService::connect(assume_role.as_deref()).await {
        Ok(service) => {
            match service
                .modify(&request.role_name, &request.identity, request.kind)
                .await
            {
                Ok(output) => Outcome::success(output.workflow_payload()),
                Err(err) => Outcome::from_service_error(&err),
            }
        }
        Err(err) => Outcome::from_service_error(&err),
    };
    finish(&delivery, outcome).await
}

/// Terminal action for a modify outcome: report to the orchestrator, or
/// print/fail for a direct caller. Never both.
async fn finish(delivery: &Delivery, outcome: Outcome) -> Result<()> {
    match delivery {
        Delivery::Direct => match outcome {
            Outcome::Success(payload) => {
                println!("{}", serde_json::to_string_pretty(&payload)?);
                Ok(())
            }
            Outcome::Failure { kind, reason } => bail!("{kind}: {reason}"),
        },
        Delivery::Orchestrated { .. } => {
            let signal = WorkflowSignal::connect().await;
            signal.deliver(delivery, &outcome).await?;
            Ok(())
        }
    }
}

async fn audit_lookup(
    identity: &str,
    created: &str,
    removal: &str,
    assume_role: Option<&str>,
    task_token: Option<String>,
) -> Result<()> {
    let delivery = Delivery::from_token(task_token);
    let outcome = match run_audit_lookup(identity, created, removal, assume_role).await {
        Ok(report) => Outcome::success(report),
        Err(err) => Outcome::failure("AuditLookupFailed", &format!("{err:#}")),
    };
    finish(&delivery, outcome).await
}

async fn run_audit_lookup(
    identity: &str,
    created: &str,
    removal: &str,
    assume_role: Option<&str>,
) -> Result<serde_json::Value> {
    let identity = Identity::parse(identity)?;
    let window = AuditWindow::from_epoch_strings(created, removal)?;

    let lookup = AuditLookup::connect(assume_role, identity.username()).await?;
    let report = lookup.lookup(&identity, &window).await?;
    Ok(serde_json::to_value(report)?)
}

async fn ticket(action: TicketAction, task_token: Option<String>) -> Result<()> {
    let delivery = Delivery::from_token(task_token);
    let outcome = match run_ticket(action).await {
        Ok(payload) => Outcome::success(payload),
        Err(err) => Outcome::failure("TicketingFailed", &format!("{err:#}")),
    };
    finish(&delivery, outcome).await
}

async fn run_ticket(action: TicketAction) -> Result<serde_json::Value> {
    let config = JiraConfig::from_env()?;
    let client = TicketClient::connect(config).await?;
    match action {
        TicketAction::Create { reason } => {
            let key = client.create_issue(&reason).await?;
            Ok(json!({ "issue_key": key }))
        }
        TicketAction::Comment { issue_key, comment } => {
            client.add_comment(&issue_key, &comment).await?;
            Ok(json!({ "success": "true" }))
        }
    }
}

fn read_envelope(path: &str) -> Result<RequestEnvelope> {
    let raw = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("could not read request envelope from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("could not read request envelope from {path}"))?
    };
    serde_json::from_str(&raw).context("request envelope is not valid JSON")
}
