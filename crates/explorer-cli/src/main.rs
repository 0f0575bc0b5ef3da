use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use explorer_core::affordance::ConsoleSurface;
use explorer_core::page::PageContext;
use explorer_core::{tracing_setup, CoreConfig, SelectionMode, Session};

#[derive(Parser)]
#[command(name = "explorer")]
#[command(about = "Find store entries you have not seen yet")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory holding the entry store and cache file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh stale data, mark the current page seen and print navigation links
    Start {
        /// Path of the page being viewed, e.g. /app/620/
        #[arg(long)]
        page: Option<String>,

        /// Origin used to build links (defaults to the configured origin)
        #[arg(long)]
        origin: Option<String>,

        /// Which selections to surface
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Print the activation report as JSON
        #[arg(long)]
        report: bool,

        /// Pretty-print JSON output
        #[arg(long, short)]
        pretty: bool,
    },

    /// Mark both cached datasets stale so the next start refetches them
    Invalidate,
}

impl Commands {
    /// The parameterless activation run when no subcommand is given
    fn default_start() -> Self {
        Commands::Start {
            page: None,
            origin: None,
            mode: None,
            report: false,
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Next,
    Random,
    Both,
}

impl From<Mode> for SelectionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Next => SelectionMode::Next,
            Mode::Random => SelectionMode::Random,
            Mode::Both => SelectionMode::Both,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_setup::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;

    let command = cli.command.unwrap_or_else(Commands::default_start);

    match command {
        Commands::Start {
            page,
            origin,
            mode,
            report,
            pretty,
        } => {
            if let Some(mode) = mode {
                config.selection = mode.into();
            }
            let origin = origin.unwrap_or_else(|| config.origin.clone());
            let page = PageContext::new(page, origin);

            let mut session = Session::open(config).context("Failed to open session")?;
            let mut stdout = std::io::stdout();
            let mut stderr = std::io::stderr();
            let mut surface = link_surface(report, &mut stdout, &mut stderr);
            let activation = session.activate(&page, &mut surface).await?;

            if report {
                println!("{}", render_json(&activation, pretty)?);
            }
        }
        Commands::Invalidate => {
            Session::open(config)
                .context("Failed to open session")?
                .invalidate()
                .context("Failed to invalidate cache")?;
        }
    }

    Ok(())
}

/// Link lines go to stderr when stdout carries the JSON report.
fn link_surface<'a>(
    report: bool,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
) -> ConsoleSurface<&'a mut dyn Write> {
    if report {
        ConsoleSurface::new(stderr)
    } else {
        ConsoleSurface::new(stdout)
    }
}

fn render_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Config file first, then command-line overrides
fn load_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = match cli.config {
        Some(ref path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use explorer_core::affordance::{Affordance, AffordanceSurface};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_runs_default_start() {
        let cli = Cli::try_parse_from(["explorer"]).unwrap();
        assert!(cli.command.is_none());

        match cli.command.unwrap_or_else(Commands::default_start) {
            Commands::Start {
                page,
                origin,
                mode,
                report,
                pretty,
            } => {
                assert!(page.is_none());
                assert!(origin.is_none());
                assert!(mode.is_none());
                assert!(!report);
                assert!(!pretty);
            }
            other => panic!("Expected Start, got {:?}", other),
        }
    }

    #[test]
    fn test_start_flags() {
        let cli = Cli::try_parse_from([
            "explorer", "start", "--page", "/app/620/", "--mode", "both", "--report", "-p",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Start {
                page,
                mode,
                report,
                pretty,
                ..
            }) => {
                assert_eq!(page.as_deref(), Some("/app/620/"));
                assert_eq!(mode.map(SelectionMode::from), Some(SelectionMode::Both));
                assert!(report);
                assert!(pretty);
            }
            other => panic!("Expected Start, got {:?}", other),
        }
    }

    #[test]
    fn test_mode_maps_to_selection_mode() {
        assert_eq!(SelectionMode::from(Mode::Next), SelectionMode::Next);
        assert_eq!(SelectionMode::from(Mode::Random), SelectionMode::Random);
        assert_eq!(SelectionMode::from(Mode::Both), SelectionMode::Both);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["explorer", "start", "--mode", "sideways"]).is_err());
    }

    #[test]
    fn test_report_keeps_links_off_stdout() {
        let affordance = Affordance::new("https://store.example", 3, "Next");
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        link_surface(true, &mut stdout, &mut stderr)
            .attach(&affordance)
            .unwrap();
        assert!(stdout.is_empty());
        assert_eq!(
            String::from_utf8(stderr).unwrap(),
            "Next: https://store.example/app/3\n"
        );

        let json = render_json(&[affordance], false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["href"], "https://store.example/app/3");
    }

    #[test]
    fn test_links_on_stdout_without_report() {
        let affordance = Affordance::new("https://store.example", 3, "Next");
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        link_surface(false, &mut stdout, &mut stderr)
            .attach(&affordance)
            .unwrap();
        assert!(stderr.is_empty());
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "Next: https://store.example/app/3\n"
        );
    }

    #[test]
    fn test_data_dir_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"dataDir": "/from/file", "catalogTtlSecs": 60}"#).unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = Cli::try_parse_from(["explorer", "-c", config_arg]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/file"));
        assert_eq!(config.catalog_ttl_secs, 60);

        // global flag is accepted after the subcommand too
        let cli = Cli::try_parse_from([
            "explorer", "-c", config_arg, "invalidate", "--data-dir", "/override",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/override"));
        assert_eq!(config.catalog_ttl_secs, 60);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let cli = Cli::try_parse_from(["explorer", "-c", missing.to_str().unwrap()]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
