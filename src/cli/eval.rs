//! `autoapprove eval` — dry-run a call against the stored config.
//!
//! Nothing is waited on, clicked or logged; this only prints the decision.

use crate::cli::Context;
use crate::intercept::descriptor::{descriptor_from_request, normalize_provider};
use crate::intercept::OutgoingRequest;
use crate::orchestrator::security_gate;
use crate::policy::types::{CallDescriptor, Operation};
use anyhow::{anyhow, Result};
use colored::Colorize;

/// URL used when evaluating a raw request body.
const EVAL_URL: &str = "https://www.perplexity.ai/api/mcp/call";

#[derive(Debug, Default)]
pub struct EvalArgs {
    pub provider: Option<String>,
    pub operation: Option<String>,
    pub repo: Option<String>,
    pub path: Option<String>,
    /// A raw MCP request body, used instead of the fields above
    pub body: Option<String>,
}

fn descriptor(args: &EvalArgs) -> Result<CallDescriptor> {
    if let Some(ref body) = args.body {
        let request = OutgoingRequest::new("POST", EVAL_URL).with_body(body.clone());
        return descriptor_from_request(&request)
            .ok_or_else(|| anyhow!("Body is not an MCP call for a known provider"));
    }

    let provider = args
        .provider
        .as_deref()
        .ok_or_else(|| anyhow!("Give a provider and operation, or --body"))?;
    let operation = match args.operation.as_deref() {
        Some(op) => Operation::from_str_loose(op)
            .ok_or_else(|| anyhow!("Unknown operation '{}'", op))?,
        None => Operation::Read,
    };

    let mut call = CallDescriptor::new(normalize_provider(provider), operation);
    call.repository = args.repo.clone();
    call.file_path = args.path.clone();
    Ok(call)
}

/// Run the `autoapprove eval` command.
pub fn run_eval(ctx: &Context, args: &EvalArgs) -> Result<()> {
    let call = descriptor(args)?;
    let store = ctx.config_store();
    let decision = store.evaluate_approval_rules(&call);

    println!();
    println!("  Call:     {}", call.summary().bold());

    if !store.is_enabled() {
        println!(
            "  Decision: {} (auto-approval is disabled)",
            "manual".yellow()
        );
        println!();
        return Ok(());
    }

    if decision.auto_approve {
        if let Err(message) = security_gate(&call, &decision) {
            println!("  Decision: {}", "blocked".red().bold());
            println!("  {}", message.dimmed());
            println!();
            return Ok(());
        }
        println!(
            "  Decision: {} after {}s",
            "auto-approve".green().bold(),
            decision.delay
        );
    } else {
        println!(
            "  Decision: {} ({})",
            "manual".yellow(),
            decision.reason.as_deref().unwrap_or("not auto-approved")
        );
    }
    if let Some(ref rule) = decision.rule {
        println!("  Rule:     {}", rule.describe().dimmed());
        if decision.auto_approve {
            println!(
                "  Confirm:  {}",
                if rule.require_confirmation {
                    "countdown"
                } else {
                    "silent delay"
                }
            );
        }
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_fields() {
        let args = EvalArgs {
            provider: Some("@GitHub".to_string()),
            operation: Some("create".to_string()),
            repo: Some("owner/repo".to_string()),
            path: Some("docs/x.md".to_string()),
            body: None,
        };
        let call = descriptor(&args).unwrap();
        assert_eq!(call.provider, "github");
        assert_eq!(call.operation, Operation::Create);
        assert_eq!(call.repository.as_deref(), Some("owner/repo"));
    }

    #[test]
    fn test_descriptor_from_body() {
        let args = EvalArgs {
            body: Some(
                r#"{"tool":"github","method":"POST","repository":"owner/repo","path":"docs/x.md"}"#
                    .to_string(),
            ),
            ..Default::default()
        };
        let call = descriptor(&args).unwrap();
        assert_eq!(call.operation, Operation::Create);
        assert_eq!(call.file_path.as_deref(), Some("docs/x.md"));
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let args = EvalArgs {
            provider: Some("github".to_string()),
            operation: Some("explode".to_string()),
            ..Default::default()
        };
        assert!(descriptor(&args).is_err());
    }
}
