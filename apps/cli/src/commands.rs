//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use linkaudit_core::{AuditPlan, AuditResult, ProgressReporter, run_audit};
use linkaudit_shared::{
    AppConfig, AuditOptions, init_config, load_config, load_config_from, validate_registry,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// linkaudit — keep a curated link registry fresh.
#[derive(Parser)]
#[command(
    name = "linkaudit",
    version,
    about = "Audit tracked resource links for reachability and fiscal-year freshness.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Audit every tracked link and write the freshness report.
    Run {
        /// Config file path (defaults to ~/.linkaudit/linkaudit.toml).
        #[arg(short, long)]
        config: Option<String>,

        /// Report output path (overrides the config default).
        #[arg(short, long)]
        out: Option<String>,

        /// Reference date for the expected fiscal cycle (YYYY-MM-DD,
        /// defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// Probe and classify a single URL without searching.
    Check {
        /// URL to check.
        url: String,

        /// Reference date for the expected fiscal cycle (YYYY-MM-DD,
        /// defaults to today).
        #[arg(long)]
        date: Option<String>,

        /// Also list anchor hrefs found on the page (best-effort).
        #[arg(long)]
        links: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "linkaudit=info",
        1 => "linkaudit=debug",
        _ => "linkaudit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { config, out, date } => {
            cmd_run(config.as_deref(), out.as_deref(), date.as_deref()).await
        }
        Command::Check { url, date, links } => cmd_check(&url, date.as_deref(), links).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

fn load_config_opt(path: Option<&str>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(std::path::Path::new(p))?,
        None => load_config()?,
    };
    Ok(config)
}

fn parse_reference_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|e| eyre!("invalid --date '{d}' (expected YYYY-MM-DD): {e}")),
        None => Ok(Local::now().date_naive()),
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&str>, out: Option<&str>, date: Option<&str>) -> Result<()> {
    let config = load_config_opt(config_path)?;

    // Fail fast on a malformed registry; everything later is per-link.
    validate_registry(&config)?;

    let report_path = match out {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(&config.defaults.report_path),
    };

    let reference_date = parse_reference_date(date)?;
    let options = AuditOptions::from(&config);

    let categories = config.categories.len();
    let links: usize = config.categories.iter().map(|c| c.urls.len()).sum();
    info!(categories, links, report = %report_path.display(), "starting link audit");

    let plan = AuditPlan {
        config,
        options,
        report_path,
        reference_date,
    };

    let reporter = CliProgress::new();
    let result = run_audit(&plan, &reporter).await?;

    // Print summary
    println!();
    println!("  Link audit complete!");
    println!("  Run:         {}", result.run_id);
    println!("  Links:       {}", result.links_checked);
    println!("  Searches:    {}", result.searches_run);
    println!("  Suggestions: {}", result.suggestions_found);
    println!("  Report:      {}", result.report_path.display());
    println!("  Time:        {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

async fn cmd_check(url: &str, date: Option<&str>, list_links: bool) -> Result<()> {
    // Validate before probing so typos fail with a useful message
    let parsed_url = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    let config = load_config()?;
    let options = AuditOptions::from(&config);
    let reference_date = parse_reference_date(date)?;

    let expected = linkaudit_freshness::current_cycle(reference_date);
    let prober = linkaudit_probe::Prober::new(options.probe_timeout)?;

    info!(url, expected_cycle = %expected, "checking single link");

    let outcome = prober.probe(url).await;
    let probe = &outcome.result;

    let detected = linkaudit_freshness::extract_year_range(&probe.final_url)
        .or_else(|| linkaudit_freshness::extract_year_range(&probe.html_title))
        .or_else(|| {
            outcome
                .body_excerpt
                .as_deref()
                .and_then(linkaudit_freshness::extract_year_range)
        });
    let detected_year = detected.map(|r| r.to_string()).unwrap_or_default();
    let freshness = linkaudit_freshness::classify(&detected_year, &expected);

    println!();
    println!("  URL:           {}", probe.original_url);
    println!("  Final URL:     {}", probe.final_url);
    println!("  Status:        {}", probe.status);
    println!("  Alive:         {}", if probe.is_alive { "yes" } else { "no" });
    println!("  Auth wall:     {}", if probe.auth_wall { "yes" } else { "no" });
    println!("  Content-Type:  {}", probe.content_type);
    println!("  Last-Modified: {}", probe.last_modified);
    println!("  Title:         {}", probe.html_title);
    println!("  Detected year: {detected_year}");
    println!("  Expected year: {expected}");
    println!("  Freshness:     {freshness}");
    println!();

    if list_links {
        let base = Url::parse(&probe.final_url).unwrap_or(parsed_url);
        let links = outcome
            .body_excerpt
            .as_deref()
            .map(|html| linkaudit_probe::extract_links(html, &base))
            .unwrap_or_default();

        if links.is_empty() {
            println!("  No links found (page not HTML, dead, or empty).");
        } else {
            println!("  Links found:");
            for link in links {
                println!("    {link}");
            }
        }
        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn link_checked(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Checking [{current}/{total}] {url}"));
    }

    fn done(&self, _result: &AuditResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
