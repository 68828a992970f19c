//! OR list checker binary.
//!
//! # Usage
//!
//! ```bash
//! orcheck week_310.or
//! orcheck week_310.or --config orcheck.toml --output report.json
//! ```
//!
//! Without `--config`, `orcheck.toml` is looked up in the current and parent
//! directory. Without `--output`, the report is written to stdout.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: info)
//!
//! Exits with status 1 when the list has a structural error, 2 on bad usage.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use orcheck::error::CheckError;
use orcheck::pipeline::{CheckConfig, Pipeline};

const USAGE: &str = "usage: orcheck <or_list> [--config <toml>] [--output <json>]";

struct Args {
    or_list: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut or_list = None;
    let mut config = None;
    let mut output = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = iter.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(value));
            }
            "--output" | "-o" => {
                let value = iter.next().ok_or("--output needs a path")?;
                output = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option {}", flag)),
            path => {
                if or_list.replace(PathBuf::from(path)).is_some() {
                    return Err("only one OR list may be given".to_string());
                }
            }
        }
    }

    Ok(Args {
        or_list: or_list.ok_or("missing <or_list>")?,
        config,
        output,
    })
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => CheckConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CheckConfig::load_default().context("Failed to load orcheck.toml")?,
    };

    info!("Checking {}", args.or_list.display());
    let report = Pipeline::with_config(config).run_file(&args.or_list)?;
    let json = report.to_json().context("Failed to serialize report")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    info!(
        "{} observations: {} valid, {} with warnings, {} with errors",
        report.summary.observations,
        report.summary.valid,
        report.summary.warnings,
        report.summary.errors
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(CheckError::Structural(structural)) = err.downcast_ref::<CheckError>() {
                error!("Structural error: {}", structural);
                for obsid in structural.obsids() {
                    error!("  involves obsid {}", obsid);
                }
            } else {
                error!("{:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&strings(&["week.or", "--config", "c.toml", "-o", "r.json"])).unwrap();
        assert_eq!(args.or_list, PathBuf::from("week.or"));
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));
        assert_eq!(args.output, Some(PathBuf::from("r.json")));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&strings(&[])).is_err());
        assert!(parse_args(&strings(&["a.or", "b.or"])).is_err());
        assert!(parse_args(&strings(&["a.or", "--config"])).is_err());
        assert!(parse_args(&strings(&["a.or", "--verbose"])).is_err());
    }
}
