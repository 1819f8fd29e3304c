use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use tagfeed::app::{App, AppEvent};
use tagfeed::config::Config;
use tagfeed::ui;

/// Get the config directory path (~/.config/tagfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("tagfeed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "tagfeed",
    version,
    about = "Terminal reader for tagged article feeds with infinite scrolling"
)]
struct Args {
    /// Tag to open on startup (overrides `default_tag`)
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,

    /// Posts per page (overrides `per_page`)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    per_page: Option<u32>,

    /// API base URL (overrides `base_url`)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Config file (default: ~/.config/tagfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(tag) = &self.tag {
            config.default_tag = tag.clone();
        }
        if let Some(per_page) = self.per_page {
            config.per_page = per_page;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never land in the alternate screen buffer.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let config = args.apply_overrides(config);
    config.validate().context("Invalid command line override")?;
    let config = config.normalized();

    tracing::info!(
        tag = %config.default_tag,
        per_page = config.per_page,
        base_url = %config.base_url,
        "Starting"
    );

    let mut app = App::new(config).context("Failed to create application")?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    Ok(())
}
