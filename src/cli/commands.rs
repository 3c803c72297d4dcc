use clap::{Parser, Subcommand};
use serde::Serialize;
use crate::actions;
use crate::cli::error::{user_error, validate_client_id, validate_stage_code, validate_window_hours};
use crate::cli::output::{
    format_client_history, format_duration_report, format_low_progression_report,
    format_pivot_report, format_progression_report, format_refresh_header, format_stage_entry_report,
    format_summary_report, table_width_limit,
};
use crate::config::DashConfig;
use crate::report::RefreshTrigger;
use crate::utils::parse_as_of;
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "pipedash")]
#[command(about = "Pipeline Dashboards - reports over the client stage progression history")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Evaluation time for windowed reports (now, today, YYYY-MM-DD, YYYY-MM-DDTHH:MM; UTC)
    #[arg(long, global = true)]
    pub as_of: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wide report: one row per client, one column pair per stage entered
    Pivot {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Classify clients at the terminal stage as NORMAL or NOT NORMAL by duration
    Durations {
        /// Terminal stage to classify (defaults to report.terminal_stage)
        #[arg(long)]
        terminal_stage: Option<i64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Clients that reached stage 4 or beyond in the window
    Progression {
        /// Window length in hours (defaults to report.window_hours)
        #[arg(long)]
        hours: Option<i64>,
        /// List every stage 4+ entry over the whole history instead
        #[arg(long, conflicts_with = "hours")]
        all: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Clients of allow-listed sales reps still at stage 3 or below in the window
    LowProgression {
        /// Window length in hours (defaults to report.window_hours)
        #[arg(long)]
        hours: Option<i64>,
        /// Employee ID to include (repeatable; replaces report.employee_allowlist)
        #[arg(long = "employee")]
        employees: Vec<i64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Client counts by latest stage and by sales rep
    Summary {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show one client's stage history
    History {
        /// Client ID
        client_id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Run every report in sequence
    Dashboard,
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            e.print()?;
            std::process::exit(1);
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    let config = DashConfig::load().context("Failed to load configuration")?;
    let now = chrono::Utc::now();
    let as_of = match cli.as_of.as_deref() {
        Some(expr) => parse_as_of(expr, now).unwrap_or_else(|e| user_error(&e.to_string())),
        None => now.timestamp(),
    };
    let trigger = RefreshTrigger::first(as_of);
    log::debug!("Refresh #{} as of {}", trigger.sequence, trigger.as_of);

    match cli.command {
        Commands::Pivot { json } => handle_pivot(&config, json),
        Commands::Durations { terminal_stage, json } => {
            handle_durations(&config, terminal_stage, json)
        }
        Commands::Progression { hours, all, json } => {
            handle_progression(&config, &trigger, hours, all, json)
        }
        Commands::LowProgression { hours, employees, json } => {
            handle_low_progression(&config, &trigger, hours, employees, json)
        }
        Commands::Summary { json } => handle_summary(&config, json),
        Commands::History { client_id, json } => handle_history(&config, &client_id, json),
        Commands::Dashboard => handle_dashboard(&config, &trigger),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

fn resolve_hours(config: &DashConfig, hours: Option<i64>) -> i64 {
    match hours {
        Some(h) => validate_window_hours(h).unwrap_or_else(|e| user_error(&e)),
        None => config.window_hours,
    }
}

fn resolve_terminal_stage(config: &DashConfig, terminal_stage: Option<i64>) -> i64 {
    let stage = terminal_stage.unwrap_or(config.terminal_stage);
    validate_stage_code(stage).unwrap_or_else(|e| user_error(&e))
}

fn resolve_allowlist(config: &DashConfig, employees: Vec<i64>) -> Vec<i64> {
    if employees.is_empty() {
        config.employee_allowlist.clone()
    } else {
        employees
    }
}

fn handle_pivot(config: &DashConfig, json: bool) -> Result<()> {
    let report = actions::pivot(config)?;
    if json {
        return print_json(&report);
    }
    print!("{}", format_pivot_report(&report, table_width_limit()));
    Ok(())
}

fn handle_durations(config: &DashConfig, terminal_stage: Option<i64>, json: bool) -> Result<()> {
    let stage = resolve_terminal_stage(config, terminal_stage);
    let report = actions::durations(config, stage)?;
    if json {
        return print_json(&report);
    }
    print!("{}", format_duration_report(&report, table_width_limit()));
    Ok(())
}

fn handle_progression(
    config: &DashConfig,
    trigger: &RefreshTrigger,
    hours: Option<i64>,
    all: bool,
    json: bool,
) -> Result<()> {
    if all {
        let report = actions::stage_entries(config)?;
        if json {
            return print_json(&report);
        }
        print!("{}", format_stage_entry_report(&report, table_width_limit()));
        return Ok(());
    }
    let report = actions::progression(config, trigger, resolve_hours(config, hours))?;
    if json {
        return print_json(&report);
    }
    print!("{}", format_progression_report(&report, table_width_limit()));
    Ok(())
}

fn handle_low_progression(
    config: &DashConfig,
    trigger: &RefreshTrigger,
    hours: Option<i64>,
    employees: Vec<i64>,
    json: bool,
) -> Result<()> {
    let window_hours = resolve_hours(config, hours);
    let allowlist = resolve_allowlist(config, employees);
    let report = actions::low_progression(config, trigger, window_hours, allowlist)?;
    if json {
        return print_json(&report);
    }
    print!("{}", format_low_progression_report(&report));
    Ok(())
}

fn handle_summary(config: &DashConfig, json: bool) -> Result<()> {
    let report = actions::summary(config)?;
    if json {
        return print_json(&report);
    }
    print!("{}", format_summary_report(&report, table_width_limit()));
    Ok(())
}

fn handle_history(config: &DashConfig, client_id: &str, json: bool) -> Result<()> {
    let client_id = validate_client_id(client_id).unwrap_or_else(|e| user_error(&e));
    let Some(history) = actions::client_history(config, client_id)? else {
        user_error(&format!("Client {} not found", client_id));
    };
    if json {
        return print_json(&history);
    }
    print!(
        "{}",
        format_client_history(
            &history.client,
            history.employee_name.as_deref(),
            &history.events,
            table_width_limit(),
        )
    );
    Ok(())
}

/// Print one dashboard section; a failed fetch reports and renders nothing
fn print_section<T>(title: &str, fetched: crate::error::Result<T>, render: impl FnOnce(&T) -> String) {
    println!("=== {} ===", title);
    match fetched {
        Ok(report) => print!("{}", render(&report)),
        Err(e) => {
            log::warn!("{} failed: {}", title, e);
            eprintln!("Error fetching records: {}", e);
        }
    }
    println!();
}

fn handle_dashboard(config: &DashConfig, trigger: &RefreshTrigger) -> Result<()> {
    let width = table_width_limit();
    let terminal_stage = resolve_terminal_stage(config, None);

    print!("{}", format_refresh_header(trigger));
    println!();

    print_section(
        "Client Stage Progression",
        actions::pivot(config),
        |r| format_pivot_report(r, width),
    );
    print_section(
        "Time to Terminal Stage",
        actions::durations(config, terminal_stage),
        |r| format_duration_report(r, width),
    );
    print_section(
        "Leads in Stage 4 and Beyond",
        actions::progression(config, trigger, config.window_hours),
        |r| format_progression_report(r, width),
    );
    print_section(
        "Low Sales Progression",
        actions::low_progression(
            config,
            trigger,
            config.window_hours,
            config.employee_allowlist.clone(),
        ),
        format_low_progression_report,
    );
    print_section(
        "Pipeline Summary",
        actions::summary(config),
        |r| format_summary_report(r, width),
    );
    Ok(())
}
