mod config;
mod diff;
mod fetcher;
mod notifier;
mod product;
mod runner;
mod store;
mod utils;

use anyhow::Result;
use clap::Parser;

use crate::{
    config::Settings,
    fetcher::CatalogFetcher,
    notifier::EmailNotifier,
    runner::{RunOptions, RunOutcome},
    store::JsonStore,
};

#[derive(Debug, Parser)]
#[command(name = "shuttlewatch", version, about = "Watch a shuttlecock catalog and email price changes")]
struct Cli {
    /// Override SCRAPE_URL
    #[arg(long)]
    url: Option<String>,

    /// Override DATA_FILE
    #[arg(long)]
    data_file: Option<String>,

    /// Log changes without sending email or updating the data file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(url) = cli.url {
        settings.scrape_url = url;
    }
    if let Some(path) = cli.data_file {
        settings.data_file = path;
    }
    settings.validate()?;

    let fetcher = CatalogFetcher::new(&settings)?;
    let store = JsonStore::new(&settings.data_file)?;
    let notifier = EmailNotifier::new(&settings);

    log::info!(
        "app.start url={} data_file={} smtp={}:{} email={}",
        settings.scrape_url,
        store.path().display(),
        settings.smtp_server,
        settings.smtp_port,
        if notifier.is_configured() { "on" } else { "off" }
    );

    let outcome = runner::run(&fetcher, &store, &notifier, RunOptions { dry_run: cli.dry_run })?;
    match outcome {
        RunOutcome::FetchFailed => log::warn!("app.done result=no_data"),
        RunOutcome::StoreUnreadable => log::warn!("app.done result=store_unreadable"),
        RunOutcome::Unchanged => log::info!("app.done result=unchanged"),
        RunOutcome::Changed { changes, persisted } => {
            log::info!("app.done result=changed changes={} persisted={}", changes.len(), persisted)
        }
    }
    Ok(())
}
