//! `cursepack` command line: install a CurseForge modpack export into a folder

use anyhow::{Context, Result};
use clap::Parser;
use cursepack::{DownloadConfig, DownloadConfigBuilder, DownloadError, ModpackInstallBuilder};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Download every file of a CurseForge modpack through the CurseMaven mirror
#[derive(Parser, Debug)]
#[command(name = "cursepack")]
#[command(version)]
#[command(after_help = "Exit status: 0 once the batch has run, even when some files need a manual download; \
1 when nothing could be scheduled (bad modpack, configuration or output folder); \
2 when downloads ran but a later step failed.")]
struct Cli {
    /// Modpack export (.zip containing manifest.json)
    modpack: PathBuf,

    /// Instance folder to fill
    output: PathBuf,

    /// Mirror base URL
    #[arg(long, value_name = "URL")]
    mirror: Option<String>,

    /// Size of the worker pool (default: CPU count x 5)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Attempts per lookup and per download
    #[arg(long, value_name = "N")]
    attempts: Option<usize>,

    /// Pause between attempts, in seconds
    #[arg(long = "retry-delay", value_name = "SECS")]
    retry_delay: Option<u64>,

    /// Time limit for one mirror lookup, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Longest stall tolerated while a file downloads, in seconds
    #[arg(long = "read-timeout", value_name = "SECS")]
    read_timeout: Option<u64>,

    /// Write download_remaining.html for files that could not be fetched
    #[arg(long)]
    report: bool,

    /// Open the report page in the default browser
    #[arg(long, requires = "report")]
    open: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn download_config(&self) -> Result<DownloadConfig> {
        let mut builder = DownloadConfigBuilder::from_config(
            DownloadConfig::from_env().context("Invalid CURSEPACK_* environment settings")?,
        );
        if let Some(ref mirror) = self.mirror {
            builder = builder.mirror_url(mirror.clone());
        }
        if let Some(workers) = self.workers {
            builder = builder.max_workers(workers);
        }
        if let Some(attempts) = self.attempts {
            builder = builder.max_attempts(attempts);
        }
        if let Some(secs) = self.retry_delay {
            builder = builder.retry_delay(Duration::from_secs(secs));
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.read_timeout {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }
}

/// Log to stderr so the progress bar on stdout stays intact
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 1 when the batch never started, 2 when it ran and a later step failed
fn exit_code_for(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<DownloadError>() {
        Some(e) if !e.is_batch_level() => 2,
        _ => 1,
    }
}

fn report_failure(error: &anyhow::Error, verbose: u8) {
    eprintln!("Error: {:#}", error);
    let Some(e) = error.downcast_ref::<DownloadError>() else {
        return;
    };
    if verbose > 0 {
        eprint!("{}", e.detailed_report());
    } else if let Some(hint) = e.suggestion() {
        eprintln!("Hint: {}", hint);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.download_config()?;
    debug!(?config, "Effective configuration");

    println!("Downloading {}", cli.modpack.display());
    let installed = ModpackInstallBuilder::new(&cli.modpack)
        .destination(&cli.output)
        .config(config)
        .with_console_progress()
        .report(cli.report)
        .install()
        .await
        .with_context(|| format!("Could not install {}", cli.modpack.display()))?;

    println!();
    println!("Download finished");
    print!("{}", installed.summary);

    if !installed.overrides.is_empty() {
        println!("Extracted {} override files", installed.overrides.len());
    }
    println!("'{}' installed into {}", installed.modpack_name, installed.destination.display());

    if let Some(page) = installed.report_page {
        println!("Manual downloads listed in {}", page.display());
        if cli.open {
            if let Err(e) = open::that(&page) {
                warn!("Could not open {}: {}", page.display(), e);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, verbose);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "cursepack",
            "pack.zip",
            "out",
            "--mirror",
            "http://localhost:8080/",
            "--workers",
            "3",
            "--attempts",
            "2",
            "--retry-delay",
            "0",
            "--timeout",
            "10",
            "--read-timeout",
            "600",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);

        let config = cli.download_config().unwrap();
        assert_eq!(config.mirror_url, "http://localhost:8080");
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(600));
    }

    #[test]
    fn exit_code_separates_setup_failures_from_late_ones() {
        let manifest = anyhow::Error::new(DownloadError::Manifest {
            path: PathBuf::from("pack.zip"),
            reason: "archive has no manifest.json".into(),
        })
        .context("Could not install pack.zip");
        assert_eq!(exit_code_for(&manifest), 1);

        let readme = anyhow::Error::new(DownloadError::file_system(
            "out/README_MODPACK.txt",
            cursepack::downloader::core::FileOperation::Write,
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        ));
        assert_eq!(exit_code_for(&readme), 2);

        assert_eq!(exit_code_for(&anyhow::anyhow!("unexpected")), 1);
    }

    #[test]
    fn open_needs_report() {
        assert!(Cli::try_parse_from(["cursepack", "pack.zip", "out", "--open"]).is_err());
    }
}
