use anyhow::{Context, Result};
use dormant::cleaner::ConfirmRequest;
use dormant::cli::{Cli, Commands, ConfigActions, CriteriaArgs, OutputFormat, UserActions};
use dormant::config::Config;
use dormant::model::Handle;
use dormant::output::{
    AuditReport, ExecutionReport, ExecutionStatus, PreviewReport, SizeReport, UserSummary,
};
use dormant::service::AdminService;
use dormant::utils::format_size;
use dormant::Error;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let result = match Config::load(cli.config.as_deref()) {
        Ok(config) => {
            init_tracing(&config.logging.level);
            run(cli, config)
        }
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Logs go to stderr so the MCP stdio transport stays clean.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let caller = cli.caller.as_deref().map(Handle::parse).transpose()?;

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(run_command(cli, config, caller))
}

async fn run_command(cli: Cli, config: Config, caller: Option<Handle>) -> Result<ExitCode> {
    let service = AdminService::from_config(&config).await?;
    let caller = caller.as_ref();

    match cli.command {
        Commands::Scan {
            criteria,
            format,
            out,
        } => run_scan(&service, caller, &config, &criteria, format, out.as_deref()).await,
        Commands::Apply {
            from,
            token,
            count,
            criteria,
            format,
            out,
        } => {
            let request = match from {
                Some(path) => {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read preview {}", path))?;
                    serde_json::from_str::<PreviewReport>(&content)?.confirm_request()
                }
                None => ConfirmRequest {
                    criteria: criteria.apply(config.scan.criteria()),
                    token,
                    count,
                    handles: None,
                },
            };
            run_apply(&service, caller, &request, format, out.as_deref()).await
        }
        Commands::Audit { handle, format } => {
            let report = service.audit_user_usage(&Handle::parse(&handle)?).await?;
            print_audit(&report, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Size { handle, format } => {
            let report = service.compute_storage_size(&Handle::parse(&handle)?).await?;
            print_size(&report, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Users { format } => {
            let users = service.list_users().await?;
            print_users(&users, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::User { action } => {
            run_user(&service, caller, action).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            run_config(action, config, cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { limit, clear } => {
            run_history(&service, limit, clear)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Mcp => {
            let defaults = config.scan.criteria();
            dormant::mcp::run_mcp_server(service, caller.cloned(), defaults).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn write_json<T: Serialize>(value: &T, out: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = out {
        fs::write(path, &json)?;
    } else {
        println!("{}", json);
    }
    Ok(())
}

async fn run_scan(
    service: &AdminService,
    caller: Option<&Handle>,
    config: &Config,
    criteria: &CriteriaArgs,
    format: OutputFormat,
    out: Option<&str>,
) -> Result<ExitCode> {
    let criteria = criteria.apply(config.scan.criteria());
    let preview = service.scan_inactive_users(caller, criteria).await?;

    match format {
        OutputFormat::Json => write_json(&preview, out)?,
        OutputFormat::Human => {
            println!(
                "Inactive for more than {} day(s){}:\n",
                preview.criteria.inactive_days,
                if preview.criteria.require_unused {
                    ", content unchanged from template"
                } else {
                    ""
                }
            );

            for candidate in &preview.candidates {
                println!(
                    "  - {} ({}) {} day(s), {}{}",
                    candidate.handle,
                    candidate.display_name,
                    candidate.days_since_last_activity,
                    format_size(candidate.storage_size_bytes),
                    if candidate.has_bound_email { ", email" } else { "" }
                );
            }
            if preview.candidates.is_empty() {
                println!("  (none)");
            }

            println!(
                "\nTotal: {} user(s), {} (in {}ms)",
                preview.count,
                format_size(preview.total_storage_bytes),
                preview.scan_duration_ms
            );
            println!("Token: {}", preview.confirmation_token);
            println!(
                "Run 'dormant apply --token {} --count {} {}' to delete",
                preview.confirmation_token,
                preview.count,
                CriteriaArgs::to_flags(&preview.criteria).join(" ")
            );
            println!("(or save the preview with '--format json --out <file>' and use 'apply --from <file>')");
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_apply(
    service: &AdminService,
    caller: Option<&Handle>,
    request: &ConfirmRequest,
    format: OutputFormat,
    out: Option<&str>,
) -> Result<ExitCode> {
    let report = match service.confirm_delete_inactive_users(caller, request).await {
        Ok(report) => report,
        Err(Error::Validation(reason)) => {
            match format {
                OutputFormat::Json => write_json(&reason, out)?,
                OutputFormat::Human => eprintln!("Refused ({}): {}", reason.code(), reason),
            }
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => write_json(&report, out)?,
        OutputFormat::Human => print_execution(&report),
    }

    Ok(match report.status {
        ExecutionStatus::Success => ExitCode::SUCCESS,
        ExecutionStatus::Partial | ExecutionStatus::Failed => ExitCode::from(1),
    })
}

fn print_execution(report: &ExecutionReport) {
    println!("Results:");
    println!("  Deleted: {} user(s)", report.deleted_count);
    println!("  Failed: {} user(s)", report.failed_count);
    println!("  Freed: {}", format_size(report.total_freed_bytes));
    println!("  Status: {:?}", report.status);
    println!("  Duration: {}ms", report.duration_ms);

    if !report.failed.is_empty() {
        println!("\nFailed users:");
        for failed in &report.failed {
            println!("  - {} [{:?}]: {}", failed.handle, failed.reason, failed.error);
        }
    }
}

fn print_audit(report: &AuditReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(report, None)?,
        OutputFormat::Human => {
            println!(
                "{}: {}",
                report.handle,
                if report.is_unused { "unused" } else { "has own content" }
            );
            for (category, audit) in report.details.iter().filter(|(_, a)| a.has_extra) {
                match &audit.example {
                    Some(example) => println!("  - {}: {}", category, example.display()),
                    None => println!("  - {}", category),
                }
            }
        }
    }
    Ok(())
}

fn print_size(report: &SizeReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(report, None)?,
        OutputFormat::Human => println!(
            "{}: {} ({})",
            report.handle,
            format_size(report.size_bytes),
            report.root.display()
        ),
    }
    Ok(())
}

fn print_users(users: &[UserSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(&users, None)?,
        OutputFormat::Human => {
            for user in users {
                let mut flags = Vec::new();
                if user.admin {
                    flags.push("admin");
                }
                if !user.enabled {
                    flags.push("disabled");
                }
                if user.subscription_active {
                    flags.push("subscribed");
                }

                let last_seen = user
                    .last_activity
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{} ({}) last seen {} {}",
                    user.handle,
                    user.name,
                    last_seen,
                    if flags.is_empty() {
                        String::new()
                    } else {
                        format!("[{}]", flags.join(", "))
                    }
                );
            }
            println!("\n{} user(s)", users.len());
        }
    }
    Ok(())
}

async fn run_user(service: &AdminService, caller: Option<&Handle>, action: UserActions) -> Result<()> {
    match action {
        UserActions::Disable { handle } => {
            let user = service.disable_user(caller, &Handle::parse(&handle)?).await?;
            println!("Disabled {}", user.handle);
        }
        UserActions::Enable { handle } => {
            let user = service.enable_user(caller, &Handle::parse(&handle)?).await?;
            println!("Enabled {}", user.handle);
        }
        UserActions::Promote { handle } => {
            let user = service.promote_user(caller, &Handle::parse(&handle)?).await?;
            println!("Promoted {} to admin", user.handle);
        }
        UserActions::Demote { handle } => {
            let user = service.demote_user(caller, &Handle::parse(&handle)?).await?;
            println!("Demoted {}", user.handle);
        }
        UserActions::Delete { handle, purge } => {
            let handle = Handle::parse(&handle)?;
            let freed = service.delete_user(caller, &handle, purge).await?;
            if purge {
                println!("Deleted {} and its data ({})", handle, format_size(freed));
            } else {
                println!("Deleted {} (data kept)", handle);
            }
        }
    }
    Ok(())
}

fn run_config(action: ConfigActions, mut config: Config, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigActions::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigActions::Set { key, value } => {
            config.set(&key, &value)?;
            config.save(path)?;
            println!("Set {} to {}", key, value);
        }
        ConfigActions::Path => {
            println!("{}", Config::resolve_path(path).display());
        }
    }

    Ok(())
}

fn run_history(service: &AdminService, limit: usize, clear: bool) -> Result<()> {
    if clear {
        let cleared = service.clear_history()?;
        println!("Cleared {} history entries", cleared);
        return Ok(());
    }

    let entries = service.history(Some(limit))?;

    if entries.is_empty() {
        println!("No history found.");
        return Ok(());
    }

    println!("Last {} deletion(s):\n", entries.len());

    for entry in entries {
        println!(
            "{} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.handle
        );
        if let Some(size) = entry.size {
            println!("    Size: {}", format_size(size));
        }
    }

    Ok(())
}
