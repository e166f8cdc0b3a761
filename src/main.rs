use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use driftwatch_analyze::classify::RiskClassifier;
use driftwatch_analyze::github::GitHubClient;
use driftwatch_analyze::llm::AdvisoryClient;
use driftwatch_analyze::pipeline::UpdatePipeline;
use driftwatch_analyze::report::RunReport;
use driftwatch_analyze::script;
use driftwatch_core::{DriftConfig, OutputFormat, PipelineConfig};
use driftwatch_scan::inventory::build_inventory;

#[derive(Parser)]
#[command(
    name = "driftwatch",
    version,
    about = "Find out which local checkouts are behind upstream, and which are safe to pull",
    long_about = "driftwatch scans a directory tree for git checkouts, compares each one against\n\
                   its upstream default branch on GitHub, and asks an LLM whether the incoming\n\
                   commits are safe to pull. Safe repositories are collected into a reviewable\n\
                   update script; risky ones are flagged for manual review.\n\n\
                   Examples:\n  \
                     driftwatch init                       Create a config file\n  \
                     driftwatch check --root ~/src         Analyze every checkout under ~/src\n  \
                     driftwatch check --dry-run            Analyze without writing the script\n  \
                     driftwatch check --format json        Machine-readable results\n  \
                     driftwatch inventory ~/src            Write a repos.json snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: <config dir>/driftwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logs for driftwatch crates)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze local repositories for upstream updates
    #[command(long_about = "Analyze local repositories for upstream updates.\n\n\
        Discovers git checkouts under the root, compares each HEAD with the upstream\n\
        default branch, classifies incoming commits, and sorts repositories into\n\
        up to date, safe to update, needs review, and error. Writes a bash script\n\
        that pulls the safe ones unless --dry-run is given.\n\n\
        Examples:\n  driftwatch check --root ~/src\n  driftwatch check --concurrency 8 --script pull.sh\n  driftwatch check --dry-run --format markdown")]
    Check {
        /// Directory to scan (default: [scan] root from config)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Analyze only; do not write the update script
        #[arg(long)]
        dry_run: bool,

        /// Repositories analyzed in parallel (default: [pipeline] concurrency, 4)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Where to write the update script (default: update_script.sh)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Directory depth searched for repositories (default: 3)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Write a JSON inventory of local repositories
    #[command(long_about = "Write a JSON inventory of local repositories.\n\n\
        Lists every checkout with a remote, its normalized URL and the time of its\n\
        latest commit, and writes the snapshot to repos.json.\n\n\
        Examples:\n  driftwatch inventory ~/src\n  driftwatch inventory -o snapshot.json --depth 2")]
    Inventory {
        /// Directory to scan (default: [scan] root from config, then the current directory)
        path: Option<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "repos.json")]
        output: PathBuf,

        /// Directory depth searched for repositories (default: 3)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Create a default configuration file
    #[command(long_about = "Create a default configuration file.\n\n\
        Writes a commented template to the config path (or --config).\n\
        Fails if the file already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[36m~\x1b[0m \x1b[1mdriftwatch\x1b[0m v{version}: know which checkouts are safe to pull\n");

        println!("Quick start:");
        println!("  \x1b[36mdriftwatch init\x1b[0m               Create a config file");
        println!("  \x1b[36mdriftwatch check --root ~/src\x1b[0m Analyze your checkouts\n");

        println!("All commands:");
        println!("  \x1b[32mcheck\x1b[0m      Compare checkouts with upstream and classify updates");
        println!("  \x1b[32minventory\x1b[0m  Write a repos.json snapshot of local checkouts");
        println!("  \x1b[32minit\x1b[0m       Create default configuration\n");
    } else {
        println!("driftwatch v{version}: know which checkouts are safe to pull\n");

        println!("Quick start:");
        println!("  driftwatch init               Create a config file");
        println!("  driftwatch check --root ~/src Analyze your checkouts\n");

        println!("All commands:");
        println!("  check      Compare checkouts with upstream and classify updates");
        println!("  inventory  Write a repos.json snapshot of local checkouts");
        println!("  init       Create default configuration\n");
    }

    println!("Run 'driftwatch <command> --help' for details.");
}

/// Install the global subscriber. Logs go to stderr; `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool, ansi: bool) {
    let default = if verbose {
        "warn,driftwatch=debug,driftwatch_core=debug,driftwatch_scan=debug,driftwatch_analyze=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(DriftConfig::default_path)
}

fn load_config(explicit: Option<&Path>) -> Result<DriftConfig> {
    if let Some(path) = explicit {
        return Ok(DriftConfig::from_file(path)?);
    }
    match DriftConfig::default_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading config");
            Ok(DriftConfig::from_file(&path)?)
        }
        _ => Ok(DriftConfig::default()),
    }
}

fn spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

fn progress_bar(len: usize) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new(len as u64);
    if let Ok(style) =
        indicatif::ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

struct CheckArgs {
    root: Option<PathBuf>,
    dry_run: bool,
    concurrency: Option<usize>,
    script: Option<PathBuf>,
    depth: Option<usize>,
}

async fn run_check(config: &DriftConfig, args: CheckArgs, format: OutputFormat) -> Result<()> {
    let Some(root) = args.root.or_else(|| config.scan_root()) else {
        miette::bail!(miette::miette!(
            help = "Pass --root or set `root` under [scan] in your config file",
            "No repository root configured"
        ));
    };
    if !root.is_dir() {
        miette::bail!("Repository root directory not found: {}", root.display());
    }

    let Some(token) = config.github_token() else {
        miette::bail!(miette::miette!(
            help = "Set GITHUB_TOKEN or add `token` under [github] in your config file",
            "No GitHub token configured"
        ));
    };
    let hosting = Arc::new(GitHubClient::new(&token, config.github.api_base.as_deref())?);

    let classifier = match config.advisory_api_key() {
        Some(key) => RiskClassifier::new(Arc::new(AdvisoryClient::new(&config.advisory, key)?)),
        None => {
            tracing::warn!(
                env = config.advisory.provider.env_var(),
                "no advisory API key configured; every update gets the fallback judgment"
            );
            RiskClassifier::without_advisory()
        }
    };

    let depth = args.depth.unwrap_or(config.scan.max_depth);
    let scanning = spinner(&format!("Scanning {}...", root.display()));
    let repos = driftwatch_scan::scan_repositories(&root, depth).inspect_err(|_e| {
        if let Some(pb) = &scanning {
            pb.finish_with_message("Failed");
        }
    })?;
    if let Some(pb) = scanning {
        pb.finish_and_clear();
    }
    if repos.is_empty() {
        eprintln!("No git repositories found under {}", root.display());
        return Ok(());
    }
    eprintln!("Found {} repositories", repos.len());

    let pipeline_config = PipelineConfig {
        concurrency: args.concurrency.unwrap_or(config.pipeline.concurrency),
    };
    let pipeline = UpdatePipeline::new(hosting, classifier, &pipeline_config);

    let progress = progress_bar(repos.len());
    let outcomes = pipeline
        .run(&repos, |outcome| {
            if let Some(pb) = &progress {
                pb.set_message(outcome.name.clone());
                pb.inc(1);
            }
        })
        .await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = RunReport::new(outcomes);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Text => print!("{report}"),
    }

    let script_path = args.script.unwrap_or_else(|| config.script.output.clone());
    match script::generate_update_script(&report.outcomes, Local::now()) {
        Some(_) if args.dry_run => {
            eprintln!("Dry run: update script not written");
        }
        Some(content) => {
            script::write_script(&script_path, &content)?;
            eprintln!(
                "Generated update script: {path}\n\
                 Review the script before executing:\n  cat {path}\n  {run}",
                path = script_path.display(),
                run = invocation(&script_path)
            );
        }
        None => {}
    }

    Ok(())
}

fn run_inventory(
    config: &DriftConfig,
    path: Option<PathBuf>,
    output: &Path,
    depth: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let root = path
        .or_else(|| config.scan_root())
        .unwrap_or_else(|| PathBuf::from("."));
    let depth = depth.unwrap_or(config.scan.max_depth);

    let repos = driftwatch_scan::scan_repositories(&root, depth)?;
    let inventory = build_inventory(&repos, Local::now());
    inventory.write(output)?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&inventory).into_diagnostic()?
            );
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            print!("{inventory}");
            println!(
                "\nSaved {} repositories to {}",
                inventory.metadata.total_count,
                output.display()
            );
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# driftwatch configuration

[scan]
# Directory searched for git checkouts (or pass --root)
# root = "~/projects"
# max_depth = 3

[github]
# Personal access token (or set GITHUB_TOKEN / GH_TOKEN)
# token = "ghp_..."
# api_base = "https://api.github.com"

[advisory]
# "gemini" or "openai" (any OpenAI-compatible chat completions endpoint)
# provider = "gemini"
# model = "gemini-1.5-flash"
# api_key = "..."            # or GEMINI_API_KEY / OPENAI_API_KEY
# base_url = "https://generativelanguage.googleapis.com"
# temperature = 0.2
# top_k = 40
# top_p = 0.95
# max_output_tokens = 1024
# timeout_secs = 120

[pipeline]
# concurrency = 4

[script]
# output = "update_script.sh"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }));
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    init_tracing(cli.verbose, use_color);

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Check {
            root,
            dry_run,
            concurrency,
            script,
            depth,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let args = CheckArgs {
                root,
                dry_run,
                concurrency,
                script,
                depth,
            };
            run_check(&config, args, cli.format).await?;
        }
        Some(Command::Inventory {
            path,
            ref output,
            depth,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            run_inventory(&config, path, output, depth, cli.format)?;
        }
        Some(Command::Init) => {
            let Some(path) = config_path(cli.config.as_deref()) else {
                miette::bail!(miette::miette!(
                    help = "Pass --config to choose where to write the file",
                    "Could not determine the configuration directory"
                ));
            };
            if path.exists() {
                miette::bail!("{} already exists", path.display());
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            std::fs::write(&path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {} with default configuration", path.display());
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "driftwatch", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Command line that runs the script at `path` from the current directory.
fn invocation(path: &Path) -> String {
    if path.is_absolute() || path.starts_with(".") || path.starts_with("..") {
        path.display().to_string()
    } else {
        format!("./{}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_parses() {
        let config = DriftConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.scan.max_depth, 3);
        assert_eq!(config.pipeline.concurrency, 4);
    }

    #[test]
    fn script_invocation_keeps_absolute_paths() {
        assert_eq!(invocation(Path::new("/tmp/pull.sh")), "/tmp/pull.sh");
        assert_eq!(invocation(Path::new("update_script.sh")), "./update_script.sh");
        assert_eq!(invocation(Path::new("out/pull.sh")), "./out/pull.sh");
        assert_eq!(invocation(Path::new("../pull.sh")), "../pull.sh");
    }

    #[test]
    fn check_flags_parse() {
        let cli = Cli::try_parse_from([
            "driftwatch",
            "check",
            "--root",
            "/src",
            "--dry-run",
            "--concurrency",
            "8",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Some(Command::Check {
                root,
                dry_run,
                concurrency,
                ..
            }) => {
                assert_eq!(root, Some(PathBuf::from("/src")));
                assert!(dry_run);
                assert_eq!(concurrency, Some(8));
            }
            _ => panic!("expected check"),
        }
    }
}
