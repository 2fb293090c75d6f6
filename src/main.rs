use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use newsgram::api::NewsApi;
use newsgram::app::{App, AppSettings, EVENT_CHANNEL_CAPACITY};
use newsgram::config::Config;
use newsgram::location::UrlSync;
use newsgram::selection::SelectionState;

/// Environment variable naming the backend URL.
const API_URL_ENV: &str = "NEWSGRAM_API_URL";

/// Get the config file path (~/.config/newsgram/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("newsgram")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "newsgram",
    version,
    about = "Terminal client for the NewsGram news backend"
)]
struct Args {
    /// Backend base URL (overrides NEWSGRAM_API_URL and the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Feed link to open, e.g. "/?category=technology"
    #[arg(long, value_name = "URL")]
    link: Option<String>,

    /// Initial language code (en, es, fr, ...)
    #[arg(long, value_name = "CODE")]
    language: Option<String>,

    /// Alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with the link printed on exit
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let env_url = std::env::var(API_URL_ENV).ok();
    let api_url = config.resolve_api_url(args.api_url.as_deref(), env_url.as_deref());
    let api = NewsApi::new(&api_url, config.request_timeout())
        .with_context(|| format!("Invalid backend URL: {}", api_url))?;

    let link = match &args.link {
        Some(link) => UrlSync::from_link(link, &config.link_base)
            .with_context(|| format!("Invalid feed link: {}", link))?,
        None => UrlSync::root(&config.link_base)
            .with_context(|| format!("Invalid link_base: {}", config.link_base))?,
    };

    let language = args
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| config.default_language.clone());

    tracing::info!(api_url = %api.base_url(), link = %link.location(), language = %language, "Starting");

    let settings = AppSettings {
        category_limit: config.effective_category_limit(),
        notice_timeout: config.notice_timeout(),
    };
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut app = App::new(api, link, SelectionState::new(language), settings, event_tx);

    newsgram::ui::run(&mut app, event_rx).await?;

    // Reopen the same view with --link
    println!("{}", app.link());
    Ok(())
}
