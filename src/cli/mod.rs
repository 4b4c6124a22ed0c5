//! CLI command handling
//!
//! Dispatches CLI commands to the engine and formats console output.

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::{Config, SimulationConfig};
use crate::common::{Error, Result};
use crate::drivers::DriverRegistry;
use crate::engine::{CaseKind, ExecutionMode, ExecutionSettings, Orchestrator};
use crate::report::{SuiteReport, TestCaseResult};
use crate::suite::{self, TestSuiteDescription};

/// Dispatch a CLI command
///
/// Returns `false` when the command completed but the outcome is a failure
/// (failed cases, an invalid suite).
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            suite,
            parallel,
            report,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let description = suite::load_suite(&suite)?;

            let mode = match parallel {
                None => ExecutionMode::Sequential,
                Some(width) => {
                    ExecutionMode::parallel(width.unwrap_or(config.engine.max_concurrency))
                }
            };

            let registry = Arc::new(DriverRegistry::simulated(&config.simulation));
            let orchestrator = Orchestrator::new(registry, ExecutionSettings::from(&config.engine));

            print_suite_header(&description, mode);
            let result = orchestrator.run_suite(&description, mode).await?;
            print_report(&result);

            if let Some(path) = report {
                let path = config.report_path(&path);
                result.write_json(&path)?;
                println!("Report written to {}", path.display());
            }

            Ok(result.all_passed())
        }

        Commands::Validate { suite, config } => {
            let config = load_config(config.as_deref())?;
            let description = suite::load_suite(&suite)?;
            validate(&description, &config)
        }

        Commands::Sample { path, force } => {
            if path.exists() && !force {
                return Err(Error::Config(format!(
                    "'{}' already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            let sample = suite::sample_suite();
            suite::save_suite(&path, &sample)?;
            println!(
                "{} Wrote sample suite '{}' ({} cases) to {}",
                "✓".green(),
                sample.name,
                sample.cases.len(),
                path.display()
            );
            Ok(true)
        }

        Commands::Drivers => {
            let registry = DriverRegistry::simulated(&SimulationConfig::default());
            for handler in registry.handlers() {
                println!("{}", handler.device_class().as_str().bold());
                for function in handler.functions() {
                    println!("  {}", function);
                }
            }
            println!();
            let kinds: Vec<_> = CaseKind::ALL.iter().map(CaseKind::as_str).collect();
            println!("Test types: {}", kinds.join(", "));
            Ok(true)
        }
    }
}

/// Explicit `--config` path, else the platform config file
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Build a suite and report every unresolvable step
fn validate(description: &TestSuiteDescription, config: &Config) -> Result<bool> {
    let registry = DriverRegistry::simulated(&config.simulation);
    let mut unresolved = Vec::new();
    for case in &description.cases {
        for step in &case.steps {
            if let Err(e) = registry.resolve(&step.device) {
                unresolved.push(format!("{} step {}: {}", case.id, step.no, e));
            }
        }
    }

    let orchestrator =
        Orchestrator::new(Arc::new(registry), ExecutionSettings::from(&config.engine));
    let cases = orchestrator.build(description)?;

    for case in &cases {
        let header = case.header();
        println!("  {} {} {}", "✓".green(), header.id.bold(), header.name);
    }
    for problem in &unresolved {
        println!("  {} {}", "✗".red(), problem);
    }

    if unresolved.is_empty() {
        println!(
            "\n{} Suite '{}' is valid ({} cases)",
            "✓".green().bold(),
            description.name,
            cases.len()
        );
        Ok(true)
    } else {
        println!(
            "\n{} Suite '{}' references {} unknown device(s)",
            "✗".red().bold(),
            description.name,
            unresolved.len()
        );
        Ok(false)
    }
}

fn print_suite_header(description: &TestSuiteDescription, mode: ExecutionMode) {
    println!(
        "\n{} {}",
        "Running Suite:".blue().bold(),
        description.name.white().bold()
    );
    if let Some(desc) = &description.description {
        println!("  {}", desc.dimmed());
    }
    if let Some(model) = &description.model {
        println!("  {} {}", "Model:".dimmed(), model);
    }
    println!(
        "  {} {} cases, {}\n",
        "Plan:".dimmed(),
        description.cases.len(),
        mode
    );
}

fn print_report(report: &SuiteReport) {
    for result in &report.results {
        print_case(result);
    }

    let summary = format!(
        "{}/{} passed ({:.1}%)",
        report.passed,
        report.total,
        report.pass_rate()
    );
    let summary = if report.all_passed() {
        summary.green().bold()
    } else {
        summary.red().bold()
    };
    println!(
        "\n{} {}, case time {:.2}s, wall clock {:.2}s",
        "Summary:".bold(),
        summary,
        report.total_duration.as_secs_f64(),
        report.wall_clock.as_secs_f64()
    );
    if let ExecutionMode::Parallel { .. } = report.execution.mode {
        let batches: Vec<_> = report
            .execution
            .batches
            .iter()
            .map(|b| b.to_string())
            .collect();
        println!("  {} {}", "Batches:".dimmed(), batches.join(" + "));
    }
    println!();
}

fn print_case(result: &TestCaseResult) {
    let status = if result.success {
        "✓".green()
    } else {
        "✗".red()
    };
    let measured = match (&result.measured_value, &result.unit) {
        (Some(value), Some(unit)) => format!("{} {}", value, unit),
        (Some(value), None) => value.clone(),
        (None, _) => "-".to_string(),
    };
    let attempts = if result.attempts > 1 {
        format!(" ({} attempts)", result.attempts)
    } else {
        String::new()
    };

    println!(
        "  {} {:<8} {:<40} {:>16}  {:.2}s{}",
        status,
        result.id,
        result.name,
        measured,
        result.duration.as_secs_f64(),
        attempts.dimmed()
    );

    if let (Some(kind), Some(message)) = (result.failure_kind, &result.message) {
        println!("      {} {}", format!("[{}]", kind).yellow(), message);
        print_failed_steps(result);
    }
}

fn print_failed_steps(result: &TestCaseResult) {
    for step in result.steps.iter().filter(|s| !s.success) {
        println!(
            "      {} step {} {} {}: {}",
            "✗".red(),
            step.step,
            step.device,
            step.function,
            step.message.as_deref().unwrap_or("failed").dimmed()
        );
    }
}
