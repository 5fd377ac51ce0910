use anyhow::{Context, Result};
use applybot_common::observability::{LogConfig, init_logging};
use applybot_config::{
    AppConfigLoader, ConfigFormat, default_config_path, generate_config, load_session_config,
    persist::render, save_config,
};
use applybot_core::RunEnd;
use applybot_drivers::profiles::{chrome_user_data_dir, discover_profiles};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
mod runner;

#[derive(Parser, Debug)]
#[command(
    name = "applybot",
    about = "Apply to job postings from a logged-in Chrome profile",
    version
)]
struct Cli {
    /// Duplicate tracing output to stderr
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search, filter and apply until postings run out or Ctrl-C
    Run(RunArgs),
    /// List local Chrome profiles as JSON
    Profiles {
        /// Chrome user data directory (defaults to the platform location)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Build a session config document from form entries
    GenerateConfig(GenerateArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Application config file (YAML or JSON)
    #[arg(long, env = "APPLYBOT_CONFIG")]
    config: Option<PathBuf>,
    /// Session config in the control-plane layout; replaces the `session` section
    #[arg(long)]
    session: Option<PathBuf>,
    /// Chrome profile directory to run with
    #[arg(long)]
    profile: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output file; YAML when it ends in .yaml/.yml, JSON otherwise
    #[arg(long)]
    out: Option<PathBuf>,
    /// Write a timestamped config-<time>.<ext> into this directory instead
    #[arg(long, conflicts_with = "out")]
    dir: Option<PathBuf>,
    /// Format used with --dir
    #[arg(long, default_value = "json")]
    format: ConfigFormat,
    /// Entries as key=value; `a.b` nests, `key[]` appends
    #[arg(value_parser = parse_entry)]
    entries: Vec<(String, String)>,
}

fn parse_entry(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig {
        emit_stderr: cli.verbose,
        ..LogConfig::default()
    })?;

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Profiles { root } => {
            let root = root
                .or_else(chrome_user_data_dir)
                .context("no Chrome user data directory; pass --root")?;
            let profiles = discover_profiles(&root)
                .with_context(|| format!("reading {}", root.display()))?;
            println!("{}", serde_json::to_string_pretty(&profiles)?);
            Ok(())
        }
        Command::GenerateConfig(args) => generate(args),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    // An explicit --config must exist; the default location is optional.
    let loader = match (&args.config, default_config_path()) {
        (Some(path), _) => AppConfigLoader::new().with_file(path),
        (None, Some(path)) => AppConfigLoader::new().with_optional_file(path),
        (None, None) => AppConfigLoader::new(),
    };
    let mut cfg = loader.load().context("loading configuration")?;
    if let Some(path) = &args.session {
        cfg.session = load_session_config(path)
            .with_context(|| format!("reading session config {}", path.display()))?;
    }

    let profile = args.profile.or_else(|| cfg.browser.chrome_profile.clone());
    let controller = runner::build_controller(&cfg);
    let report = runner::run(controller, profile, cfg.session).await?;
    info!(?report, "run finished");
    eprintln!(
        "pages: {}, applied: {}, skipped: {}, failed: {}, restarts: {}",
        report.pages, report.applied, report.skipped, report.failed, report.restarts
    );
    match report.end {
        RunEnd::Fatal(reason) => anyhow::bail!("run ended: {reason}"),
        RunEnd::Exhausted | RunEnd::Stopped => Ok(()),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let doc = generate_config(args.entries);
    match (args.out, args.dir) {
        (Some(out), _) => {
            let format = ConfigFormat::from_path(&out).unwrap_or(ConfigFormat::Json);
            std::fs::write(&out, render(&doc, format)?)
                .with_context(|| format!("writing {}", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        (None, Some(dir)) => {
            let path = save_config(&doc, &dir, args.format)?;
            eprintln!("wrote {}", path.display());
        }
        (None, None) => println!("{}", render(&doc, ConfigFormat::Json)?),
    }
    Ok(())
}
