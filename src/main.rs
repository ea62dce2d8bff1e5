use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

mod api;
mod app;
mod config;
mod invalidation;
mod logging;
mod logview;
mod register;
mod ui;

use api::{AdminApi, AdminClient};
use app::{App, Screen};
use config::Config;
use register::signin::{BrowserLauncher, SignInLauncher};

#[derive(Parser)]
#[command(name = "siteops")]
#[command(about = "Terminal admin console for page-hosting service operations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the service log viewer
    Logs,

    /// Open the CDN push-invalidation credential form
    Invalidate {
        /// Preselect a CDN provider (fastly, akamai, cloudfront)
        #[arg(short = 't', long = "type")]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let logging = logging::init_logging(&config, true, cli.debug)?;
    if let Some(path) = &logging.log_file_path {
        tracing::info!(path = %path.display(), "logging to file");
    }

    let (screen, provider) = match &cli.command {
        None => (Screen::Register, None),
        Some(Commands::Logs) => (Screen::Logs, None),
        Some(Commands::Invalidate { provider }) => (Screen::Invalidation, provider.clone()),
    };

    let api: Arc<dyn AdminApi> = Arc::new(AdminClient::new(config.endpoints.clone())?);
    let launcher: Arc<dyn SignInLauncher> = Arc::new(BrowserLauncher::new());

    let mut app = App::new(config, api, launcher, screen, provider.as_deref());
    app.run().await
}
