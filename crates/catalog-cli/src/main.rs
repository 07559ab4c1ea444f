//! Catalog Validator CLI
//!
//! A command-line tool for validating catalog manifest JSON documents.

use clap::Parser;
use std::io::{self, IsTerminal};
use std::process::ExitCode as StdExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Args;
use cli::config::{ExitCode, ValidatedConfig};
use cli::output::{HumanOutput, ValidationReport};

#[tokio::main]
async fn main() -> StdExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose, args.json);

    // Set up signal handling for graceful shutdown
    let terminated = Arc::new(AtomicBool::new(false));
    let terminated_clone = terminated.clone();

    tokio::spawn(async move {
        let ctrl_c = signal::ctrl_c();
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(_) => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT, shutting down...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down...");
            }
        }

        terminated_clone.store(true, Ordering::SeqCst);
    });

    // Run the validator
    let exit_code = run(args, &terminated).await;

    // Check if we were terminated by signal
    if terminated.load(Ordering::SeqCst) {
        return StdExitCode::from(ExitCode::Terminated as u8);
    }

    StdExitCode::from(i32::from(exit_code) as u8)
}

/// Initialize tracing based on verbosity level.
fn init_tracing(verbosity: u8, json_output: bool) {
    // Don't output logs when using JSON output mode
    if json_output {
        return;
    }

    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}

/// Run the validator with the given arguments.
async fn run(args: Args, terminated: &AtomicBool) -> ExitCode {
    let error_colors = !args.json && io::stderr().is_terminal();

    // Validate configuration
    let config = match ValidatedConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            write_error(&e.to_string(), error_colors);
            return ExitCode::StartupFailure;
        }
    };

    let use_colors = !config.json_output && io::stdout().is_terminal();

    debug!("Validated configuration: {:?}", config);
    info!("Catalog file: {}", config.input_path.display());

    let content = match std::fs::read_to_string(&config.input_path) {
        Ok(content) => content,
        Err(e) => {
            write_error(
                &format!(
                    "Failed to read catalog file '{}': {}",
                    config.input_path.display(),
                    e
                ),
                error_colors,
            );
            return ExitCode::StartupFailure;
        }
    };

    let engine = match config.build_engine().await {
        Ok(engine) => engine,
        Err(e) => {
            write_error(&e.to_string(), error_colors);
            return ExitCode::StartupFailure;
        }
    };

    if terminated.load(Ordering::SeqCst) {
        return ExitCode::Terminated;
    }

    let result = match engine.validate_with_timeout(&content).await {
        Ok(result) => result,
        Err(e) => {
            write_error(&e.to_string(), error_colors);
            return ExitCode::StartupFailure;
        }
    };
    debug!("Validation found {} issue(s)", result.errors.len());

    let report = ValidationReport::new(
        config.input_path.display().to_string(),
        result,
        config.summary,
    );

    // Output results
    let mut stdout = io::stdout().lock();
    if config.json_output {
        if let Err(e) = report.write_json(&mut stdout) {
            error!("Failed to write JSON output: {}", e);
            return ExitCode::StartupFailure;
        }
    } else if let Err(e) = report.write_human(&mut stdout, use_colors) {
        error!("Failed to write output: {}", e);
        return ExitCode::StartupFailure;
    }

    // Determine exit code
    config.exit_code_for_results(report.has_errors(), report.has_warnings())
}

/// Write an error message to stderr.
fn write_error(message: &str, use_colors: bool) {
    let _ = HumanOutput::new(io::stderr().lock(), use_colors).write_error(message);
}
