//! redactor - offline PII redaction CLI.
//!
//! The binary is a thin boundary around the core pipeline: it reads the
//! input file, resolves the seed secret from the environment, runs the
//! redaction, and writes the sanitized text plus the optional report
//! bundle. Exit codes: 0 success, 3 I/O, 4 configuration or secret,
//! 5 pipeline, 6 verification failure.

use clap::{Parser, Subcommand};
use redactor::{report, AliasPolicy, Config, RedactError, Redactor};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Offline PII redaction with deterministic, shape-preserving pseudonyms
#[derive(Parser)]
#[command(name = "redactor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact a text document
    Redact {
        /// Input file, or "-" for stdin
        input: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for audit.json / plan.json / verification.json.
        /// The audit file contains original PII; keep it local.
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Fail if any residual PII survives in the output
        #[arg(long)]
        strict: bool,

        /// Keep role aliases (Buyer, Seller, ...) verbatim
        #[arg(long)]
        keep_roles: bool,

        /// Redact generic dates in addition to dates of birth
        #[arg(long)]
        redact_generic_dates: bool,

        /// Use one key scope across documents instead of per-document
        #[arg(long)]
        cross_doc: bool,
    },

    /// Show effective configuration and whether the seed secret is set
    Probe,
}

fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input)
    }
}

fn write_reports(
    dir: &Path,
    outcome: &redactor::RedactionOutcome,
) -> Result<(), RedactError> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(
        dir.join("audit.json"),
        serde_json::to_string_pretty(&outcome.audit)?,
    )?;
    std::fs::write(
        dir.join("plan.json"),
        serde_json::to_string_pretty(&report::plan_records(&outcome.plan))?,
    )?;
    std::fs::write(
        dir.join("verification.json"),
        serde_json::to_string_pretty(&outcome.verification)?,
    )?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), RedactError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Redact {
            input,
            output,
            report_dir,
            strict,
            keep_roles,
            redact_generic_dates,
            cross_doc,
        } => {
            if strict {
                config.verification.fail_on_residual = true;
            }
            if keep_roles {
                config.redact.alias_labels = AliasPolicy::KeepRoles;
            }
            if redact_generic_dates {
                config.redact.generic_dates = true;
            }
            if cross_doc {
                config.pseudonyms.cross_doc_consistency = true;
            }

            // The secret is resolved here, at the boundary; the core never
            // touches the environment.
            let secret = std::env::var(&config.pseudonyms.seed.secret_env).ok();
            let raw_text = read_input(&input)?;

            let redactor = Redactor::new(config, secret)?;
            let outcome = redactor.redact(&raw_text)?;

            if let Some(ref path) = output {
                std::fs::write(path, &outcome.sanitized_text)?;
                info!("sanitized text written to {}", path.display());
            } else {
                println!("{}", outcome.sanitized_text);
            }
            if let Some(ref dir) = report_dir {
                write_reports(dir, &outcome)?;
                info!("reports written to {}", dir.display());
            }
            if !cli.quiet {
                eprintln!(
                    "{}",
                    report::text_summary(&outcome.audit, &outcome.verification)
                );
            }
            Ok(())
        }

        Commands::Probe => {
            let secret_env = config.pseudonyms.seed.secret_env.clone();
            let seed_present = std::env::var(&secret_env).map_or(false, |v| !v.is_empty());
            println!("secret ({secret_env}): {}", if seed_present { "set" } else { "absent" });
            println!(
                "cross_doc_consistency: {}",
                config.pseudonyms.cross_doc_consistency
            );
            println!("ner.enable: {}", config.detectors.ner.enable);
            println!("coref.enable: {}", config.detectors.coref.enable);
            println!("strict: {}", config.verification.fail_on_residual);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.to_string())),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
