//! Forge mirror CLI entrypoint.
//!
//! This binary mirrors Puppet Forge release archives into a local directory
//! and prints a summary of what it did once the release feed is exhausted.

use clap::Parser;
use env_logger::Env;
use forge_mirror::cli::Cli;
use forge_mirror::config::SyncConfig;
use forge_mirror::error::Result;
use forge_mirror::output::{summary_message, write_stderr_line};
use forge_mirror::sync::{SyncSummary, sync_releases};
use std::io::Write;

/// Environment variable holding the `env_logger` filter.
const LOG_ENV: &str = "FORGE_MIRROR_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "info"));
    if let Some(level) = cli.log_level_override() {
        builder.filter_level(level);
    }
    builder.init();
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<SyncSummary> {
    let config = SyncConfig::try_from(cli)?;
    let summary = sync_releases(&config)?;
    if !cli.quiet {
        write_stderr_line(stderr, summary_message(&summary, config.modules_root()));
    }
    Ok(summary)
}

fn exit_code_for_run_result(result: Result<SyncSummary>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_mirror::config::ConfigError;
    use forge_mirror::error::MirrorError;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("forge-mirror").chain(args.iter().copied()))
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(SyncSummary::default()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = MirrorError::from(ConfigError::EmptyModulePath);

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("module path must not be empty"));
    }

    #[test]
    fn run_rejects_an_invalid_forge_url_before_any_request() {
        let cli = cli(&["-m", "/srv/forge", "--forge-url", "ftp://forge.test"]);
        let mut stderr = Vec::new();

        let err = run(&cli, &mut stderr).expect_err("unsupported scheme");

        assert!(matches!(
            err,
            MirrorError::Config(ConfigError::UnsupportedScheme { .. })
        ));
        assert!(stderr.is_empty());
    }
}
