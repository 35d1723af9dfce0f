mod ask;
mod error;
mod render;

use std::{
    fmt,
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
};

use aw_config::Config;
use aw_conversation::TurnOutcome;
use clap::{ArgAction, Parser, Subcommand};
use error::{Error, Result};
use tracing::{debug, trace};

/// Talk to the agent from the command line.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten, next_help_heading = "Global Options")]
    globals: Globals,

    #[command(subcommand, next_help_heading = "Options")]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct Globals {
    /// Path to a TOML configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Override a configuration value for the duration of the command.
    #[arg(short, long, value_name = "KEY=VALUE", global = true, action = ArgAction::Append)]
    set: Vec<String>,

    /// Increase verbosity of logging.
    ///
    /// Can be specified multiple times to increase verbosity.
    ///
    /// Defaults to printing "error" messages. For each increase in verbosity,
    /// the log level is set to "warn", "info", "debug", and "trace"
    /// respectively.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging, including errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a query to the agent and stream its events.
    Ask(ask::Ask),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ask(_) => "ask",
        }
    }
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(&"config", &self.globals.config)
            .entry(&"set", &self.globals.set)
            .entry(&"verbose", &self.globals.verbose)
            .entry(&"quiet", &self.globals.quiet)
            .finish()
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.globals.quiet;

    configure_logging(cli.globals.verbose, quiet);
    trace!(command = cli.command.name(), arguments = %cli, "Starting CLI run.");

    match run_inner(cli).await {
        Ok(TurnOutcome::Completed) => ExitCode::SUCCESS,
        Ok(TurnOutcome::Failed(kind)) => {
            debug!(?kind, "Turn failed.");
            ExitCode::FAILURE
        }
        Err(error) => {
            if !quiet {
                writeln!(io::stderr(), "{error}").ok();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run_inner(cli: Cli) -> Result<TurnOutcome> {
    let mut config = Config::load(cli.globals.config.as_deref())?;
    apply_cli_configs(&cli.globals.set, &mut config)?;

    match cli.command {
        Commands::Ask(args) => args.run(config).await,
    }
}

/// Apply CLI config overrides to the [`Config`].
fn apply_cli_configs(overrides: &[String], config: &mut Config) -> Result<()> {
    trace!(overrides = ?overrides, "Applying CLI config overrides.");

    for field in overrides {
        let Some((key, value)) = field.split_once('=') else {
            return Err(Error::CliConfig(format!(
                "`{field}` is not a KEY=VALUE pair"
            )));
        };

        config.assign(key.trim(), value)?;
    }

    Ok(())
}

fn configure_logging(verbose: u8, quiet: bool) {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::fmt;

    let mut level = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    if quiet {
        level = LevelFilter::OFF;
    }

    let mut filter = vec!["off".to_owned()];
    for krate in [
        "cli",
        "client",
        "config",
        "conversation",
        "event",
        "frame",
        "turn",
    ] {
        filter.push(format!("aw_{krate}={level}"));
    }

    let format = fmt::format().with_target(false).compact();

    if level < LevelFilter::DEBUG {
        tracing_subscriber::fmt()
            .event_format(format)
            .without_time()
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    } else {
        tracing_subscriber::fmt()
            .event_format(format)
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::CommandFactory as _;
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "aw",
            "-vv",
            "--set",
            "api.base_url=https://example.com",
            "ask",
            "what is up?",
            "--file",
            "a.csv",
            "--file",
            "b.csv",
            "--conversation",
            "abc123",
        ])
        .unwrap();

        assert_eq!(cli.globals.verbose, 2);
        assert_eq!(cli.globals.set, vec!["api.base_url=https://example.com"]);

        let Commands::Ask(ask) = cli.command;
        assert_eq!(ask.query, "what is up?");
        assert_eq!(ask.files, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert_eq!(ask.conversation.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_apply_cli_configs() {
        let mut config = Config::default();

        apply_cli_configs(
            &[
                "api.base_url=https://example.com".to_owned(),
                "status.tools.shell=running a command".to_owned(),
            ],
            &mut config,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://example.com");
        assert_eq!(config.status.phrase_for(Some("shell")), "running a command");

        assert_matches!(
            apply_cli_configs(&["api.base_url".to_owned()], &mut config),
            Err(Error::CliConfig(_))
        );
        assert_matches!(
            apply_cli_configs(&["nope=1".to_owned()], &mut config),
            Err(Error::Config(aw_config::Error::UnknownKey(_)))
        );
    }

    #[test]
    fn test_file_error_names_the_path() {
        let error = Error::File {
            path: "data.csv".to_owned(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        assert_eq!(error.to_string(), "Unable to read data.csv: entity not found");
    }
}
