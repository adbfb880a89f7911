//! TruAi command line
//!
//! # Usage
//! ```bash
//! truai classify "Implement JWT login"
//! truai arbitrate code_review --prefer claude --user alice
//! truai maintain "Update documentation" --enable-maintenance --user admin
//! truai audit list --type maintenance_operation --page 2
//! truai learn task-42.json
//! truai report --text
//! ```
//!
//! Every command prints pretty JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use truai_core::routing::EscalationBrief;
use truai_core::{AuditFilter, CoreConfig, RequestContext, TruAiCore};

/// TruAi - AI source arbitration and policy-gated self-maintenance
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (default: $TRUAI_CONFIG, then built-in defaults)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the audit streams (overrides the configuration)
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a task description into a tier
    Classify {
        description: String,
    },

    /// Run a task through compression, the comprehension gate and classification
    Route {
        task_id: String,
        description: String,

        /// Render and record a high-tier escalation prompt if the task is ready
        #[arg(long)]
        escalate: bool,

        /// File the escalated task may modify (repeatable)
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<String>,

        /// Extra constraint for the escalated task (repeatable)
        #[arg(long = "constraint", value_name = "TEXT")]
        constraints: Vec<String>,

        #[arg(long)]
        user: Option<String>,
    },

    /// Pick the AI source for a task type
    Arbitrate {
        task_type: String,

        /// Preferred source; ignored unless approved
        #[arg(long)]
        prefer: Option<String>,

        /// Record the arbitration as an AI interaction for this user
        #[arg(long)]
        user: Option<String>,

        /// Task text stored with the recorded interaction
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Submit a maintenance command for authorization
    Maintain {
        command: String,

        #[arg(long)]
        user: Option<String>,

        /// Turn maintenance mode on for this invocation first
        #[arg(long)]
        enable_maintenance: bool,
    },

    /// Evaluate one of the immutable policies
    Policy {
        policy_id: String,

        #[arg(long)]
        user: Option<String>,
    },

    /// Record task metadata from a JSON file and print the lessons learned
    Learn {
        file: PathBuf,
    },

    /// Performance, relative cost and recommendations from task history
    Report {
        /// Print the plain-text report instead of JSON
        #[arg(long)]
        text: bool,
    },

    /// Suggest a tier for a task type from review history
    SuggestTier {
        task_type: String,
    },

    /// Inspect the audit log
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    /// List entries, oldest first
    List {
        /// Entry type, e.g. maintenance_operation
        #[arg(long = "type", value_name = "TYPE")]
        entry_type: Option<String>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "20")]
        per_page: usize,
    },

    /// Counts by type and user plus recent entries
    Stats,

    /// Write matching entries to a JSON document
    Export {
        output: PathBuf,

        #[arg(long = "type", value_name = "TYPE")]
        entry_type: Option<String>,

        #[arg(long)]
        user: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let core = TruAiCore::new(load_config(&cli)?);

    match cli.command {
        Commands::Classify { description } => {
            print_json(&core.classify_task(&description, &RequestContext::default()))?;
        }
        Commands::Route {
            task_id,
            description,
            escalate,
            files,
            constraints,
            user,
        } => {
            let ctx = context(user, None);
            let task = core.route_task(&task_id, &description, &ctx);

            if escalate && task.is_ready() {
                let brief = EscalationBrief {
                    files_to_modify: files,
                    constraints,
                    design_assets: Vec::new(),
                };
                let prompt = core
                    .escalate_to_copilot(&task, &brief, &ctx)
                    .context("Escalating task")?;
                print_json(&json!({ "task": task, "escalation_prompt": prompt }))?;
            } else {
                print_json(&task)?;
            }
        }
        Commands::Arbitrate {
            task_type,
            prefer,
            user,
            description,
        } => {
            let ctx = context(user, prefer);
            let result = if ctx.user_id.is_some() {
                core.arbitrate_and_record(&task_type, &description, &ctx)
            } else {
                core.arbitrate_source(&task_type, &ctx)
            };
            print_json(&result)?;
        }
        Commands::Maintain {
            command,
            user,
            enable_maintenance,
        } => {
            if enable_maintenance {
                core.set_maintenance_mode(true)
                    .context("Enabling maintenance mode")?;
            }
            let response = core
                .process_maintenance_command(&command, &context(user, None))
                .context("Processing maintenance command")?;
            print_json(&json!({ "success": response.success(), "result": response }))?;
        }
        Commands::Policy { policy_id, user } => {
            let passed = core.enforce_policy(&policy_id, &context(user, None));
            let known = truai_core::ImmutablePolicy::from_id(&policy_id).is_some();
            print_json(&json!({ "policy": policy_id, "known": known, "passed": passed }))?;
        }
        Commands::Learn { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Reading task metadata {}", file.display()))?;
            let payload: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Parsing task metadata {}", file.display()))?;
            let lessons = core
                .record_task_metadata(&payload)
                .context("Recording task metadata")?;
            print_json(&json!({ "stored": true, "lessons": lessons }))?;
        }
        Commands::Report { text } => {
            if text {
                print!("{}", core.performance_report()?);
            } else {
                print_json(&json!({
                    "stats": core.performance_stats()?,
                    "recommendations": core.optimization_recommendations()?,
                }))?;
            }
        }
        Commands::SuggestTier { task_type } => {
            let tier = core.suggest_tier(&task_type)?;
            print_json(&json!({ "task_type": task_type, "suggested_tier": tier }))?;
        }
        Commands::Audit { command } => run_audit(&core, command)?,
    }

    Ok(())
}

fn run_audit(core: &TruAiCore, command: AuditCommands) -> anyhow::Result<()> {
    match command {
        AuditCommands::List {
            entry_type,
            user,
            page,
            per_page,
        } => {
            let entries = core.query(&filter(entry_type, user))?;
            let per_page = per_page.max(1);
            let page = page.max(1);
            let total = entries.len();
            let items = paginate(entries, page, per_page);

            print_json(&json!({
                "page": page,
                "per_page": per_page,
                "total": total,
                "total_pages": total.div_ceil(per_page),
                "entries": items,
            }))?;
        }
        AuditCommands::Stats => {
            print_json(&core.statistics()?)?;
        }
        AuditCommands::Export {
            output,
            entry_type,
            user,
        } => {
            let written = core
                .export_audit_log(&output, &filter(entry_type, user))
                .with_context(|| format!("Exporting audit log to {}", output.display()))?;
            print_json(&json!({ "output": output, "total_entries": written }))?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::from_file(path)
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => CoreConfig::from_env().context("Loading configuration from environment")?,
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    tracing::debug!("Using data directory {}", config.data_dir.display());
    Ok(config)
}

fn context(user: Option<String>, preference: Option<String>) -> RequestContext {
    RequestContext {
        user_id: user,
        user_preference: preference,
        ..Default::default()
    }
}

fn filter(entry_type: Option<String>, user: Option<String>) -> AuditFilter {
    let mut filter = AuditFilter::new();
    if let Some(entry_type) = entry_type {
        filter = filter.eq("type", entry_type);
    }
    if let Some(user) = user {
        filter = filter.by_user(user);
    }
    filter
}

/// One page of `items`; pages past the end are empty
fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Vec<T> {
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    items.into_iter().skip(offset).take(per_page).collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_pages() {
        let items: Vec<u32> = (1..=5).collect();
        assert_eq!(paginate(items.clone(), 1, 2), vec![1, 2]);
        assert_eq!(paginate(items.clone(), 3, 2), vec![5]);
        assert!(paginate(items, 4, 2).is_empty());
    }

    #[test]
    fn test_paginate_huge_page_is_empty() {
        let items: Vec<u32> = (1..=5).collect();
        assert!(paginate(items.clone(), usize::MAX, 20).is_empty());
        assert!(paginate(items, 2, usize::MAX).is_empty());
    }
}
