//! CLI entry point for posture.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All acquisition logic lives in the `posture-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use posture_app::{FetchInput, parse_envelope, run_fetch, serialize_envelope, summarize};
use posture_settings::Overrides;
use posture_types::{PolicySetEnvelope, PolicyKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "posture",
    version,
    about = "Acquire security-posture policies for a scan"
)]
struct Cli {
    /// Path to posture config TOML (missing file means defaults).
    #[arg(long, default_value = "posture.toml")]
    config: Utf8PathBuf,

    /// Fetch policies from this backend URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Load policies from a local directory instead of downloading them.
    #[arg(long)]
    use_from: Option<Utf8PathBuf>,

    /// Where downloaded policies are cached.
    #[arg(long)]
    cache_dir: Option<Utf8PathBuf>,

    /// Do not cache downloaded policies.
    #[arg(long)]
    no_cache: bool,

    /// Cluster or account name used to fetch exceptions and controls-inputs.
    #[arg(long)]
    scope: Option<String>,

    /// Read exceptions from this file.
    #[arg(long)]
    exceptions: Option<Utf8PathBuf>,

    /// Read controls-inputs from this file.
    #[arg(long)]
    controls_config: Option<Utf8PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Acquire frameworks or controls and write the policy set.
    Fetch {
        /// What the names refer to (framework or control).
        kind: PolicyKind,

        /// Framework names or control IDs.
        #[arg(required = true)]
        names: Vec<String>,

        /// Where to write the policy set JSON.
        #[arg(long, default_value = "artifacts/posture/policies.json")]
        out: Utf8PathBuf,
    },

    /// Summarize an existing policy set.
    Show {
        /// Path to the policy set JSON.
        #[arg(long, default_value = "artifacts/posture/policies.json")]
        policies: Utf8PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.cmd {
        Commands::Fetch { kind, names, out } => cmd_fetch(&cli, *kind, names.clone(), out),
        Commands::Show { policies } => cmd_show(policies),
    };

    if let Err(err) = result {
        eprintln!("posture error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_fetch(
    cli: &Cli,
    kind: PolicyKind,
    names: Vec<String>,
    out: &Utf8Path,
) -> anyhow::Result<()> {
    // Missing config file is allowed (defaults apply).
    let cfg_text = std::fs::read_to_string(&cli.config).unwrap_or_default();

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        use_from: cli.use_from.clone(),
        cache_dir: cli.cache_dir.clone(),
        no_cache: cli.no_cache,
        scope: cli.scope.clone(),
        exceptions_file: cli.exceptions.clone(),
        controls_inputs_file: cli.controls_config.clone(),
    };

    let output = run_fetch(FetchInput {
        config_text: &cfg_text,
        overrides,
        kind,
        names,
    })?;

    write_policy_set_file(out, &output.envelope).context("write policy set json")?;

    let set = &output.envelope.policy_set;
    println!(
        "posture: {} framework(s), {} control(s) written to {}",
        set.policies.len(),
        set.control_count(),
        out
    );
    Ok(())
}

fn cmd_show(path: &Utf8Path) -> anyhow::Result<()> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read policy set: {}", path))?;
    let envelope = parse_envelope(&text)?;
    println!("{}", summarize(&envelope));
    Ok(())
}

fn write_policy_set_file(path: &Utf8Path, envelope: &PolicySetEnvelope) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    let data = serialize_envelope(envelope)?;
    std::fs::write(path, data).with_context(|| format!("write policy set: {}", path))?;
    Ok(())
}
