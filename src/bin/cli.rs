//! Publisher CLI
//!
//! Zero-argument runs publish everything due today.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use publisher::{
    error::Result,
    models::{Config, PathsConfig},
    pipeline::{self, Publisher},
    services::IndexingNotifier,
    storage::{LocalSite, RunLock, SiteState},
    utils::http,
};

/// Scheduled article publisher
#[derive(Parser, Debug)]
#[command(
    name = "publisher",
    version,
    about = "Publish scheduled articles, cascade the homepage and notify search engines"
)]
struct Cli {
    /// Site root directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Config file (default: {root}/publisher.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run as if today were this date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Publish every due scheduled article (default)
    #[default]
    Publish,

    /// Regenerate the sitemap from the main pages and every live article
    RebuildSitemap,

    /// Submit the sitemap to Search Console, ping endpoints and IndexNow
    SubmitSitemap,

    /// Validate configuration and site layout
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::load_or_default(cli.root.join("publisher.toml")),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    exit_code(run(cli).await)
}

/// 0 when the command fully succeeded (or had nothing to do), 1 otherwise.
fn exit_code(result: Result<bool>) -> ExitCode {
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command. `Ok(false)` means it ran but something failed.
async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli)?;
    let today = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    let site = LocalSite::new(&cli.root, &config.paths);

    match cli.command.unwrap_or_default() {
        Command::Publish => {
            let lock_path = PathsConfig::resolve(&cli.root, &config.paths.lock_file);
            let _lock = RunLock::acquire(
                lock_path,
                Duration::from_secs(config.lock.stale_after_secs),
            )
            .await?;

            let client = http::create_client(&config.http)?;
            let notifier = IndexingNotifier::from_config(&config, &cli.root, client);
            let report = Publisher::new(&site, &config, &notifier).run(today).await?;

            for failure in &report.failures {
                log::error!(
                    "[publish] {} left in place: {}",
                    failure.descriptor,
                    failure.error
                );
            }
            for article in report.published.iter().filter(|a| !a.is_complete()) {
                for step in &article.errors {
                    log::error!(
                        "[publish] {} step {} failed: {}",
                        article.descriptor,
                        step.step,
                        step.error
                    );
                }
            }
            Ok(report.is_success())
        }

        Command::RebuildSitemap => {
            let summary = pipeline::rebuild_sitemap(&site, &config, today).await?;
            log::info!(
                "[rebuild] {} URLs ({} pages, {} articles)",
                summary.total(),
                summary.pages,
                summary.articles
            );
            Ok(true)
        }

        Command::SubmitSitemap => {
            let client = http::create_client(&config.http)?;
            pipeline::submit_sitemap(&site, &config, &cli.root, client).await;
            Ok(true)
        }

        Command::Validate => validate_site(&site, &config, &cli.root).await,
    }
}

async fn validate_site(site: &LocalSite, config: &Config, root: &Path) -> Result<bool> {
    log::info!("Validating site at {}", root.display());
    log::info!("✓ Config OK ({} homepage slots)", config.homepage.slots.len());

    let mut ok = true;
    let snapshot = site.snapshot_slots(&config.homepage.slots).await?;
    for (i, slot) in config.homepage.slots.iter().enumerate() {
        if snapshot.content(i).is_none() {
            log::warn!("Homepage slot {slot} has no file");
        }
    }

    match site.read_sitemap().await? {
        Some(xml) => match pipeline::sitemap::parse_locs(&xml) {
            Ok(locs) => log::info!("✓ Sitemap OK ({} URLs)", locs.len()),
            Err(e) => {
                log::error!("Sitemap is malformed: {e}");
                ok = false;
            }
        },
        None => log::warn!("No sitemap file"),
    }

    let credentials = PathsConfig::resolve(root, &config.paths.credentials_file);
    if !credentials.exists() {
        log::warn!("No service account at {}", credentials.display());
    }
    if std::env::var(&config.indexing.indexnow_key_env).is_err() {
        log::warn!("{} is not set", config.indexing.indexnow_key_env);
    }

    if ok {
        log::info!("All validations passed!");
    }
    Ok(ok)
}
