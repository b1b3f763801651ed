//! # headless-press CLI (`hpress`)
//!
//! ## Usage
//!
//! ```bash
//! hpress --config ./config/hpress.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hpress serve` | Start the HTTP server |
//! | `hpress resolve <path>` | Resolve one path and print the JSON outcome |
//! | `hpress check` | Validate the config and print the effective origins |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use headless_press::cms::{ContentApi, HttpCmsClient};
use headless_press::config;
use headless_press::resolver::Resolver;
use headless_press::server;

/// Presentation layer for a headless WordPress CMS.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/hpress.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "hpress", version, about = "Presentation layer for a headless WordPress CMS")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/hpress.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Resolve a single path against the CMS and print the outcome as JSON.
    Resolve {
        /// Request path, e.g. `/about/` or `/preview/42`.
        path: String,

        /// Preview session token (the `wp_jwt` cookie value).
        #[arg(long)]
        session: Option<String>,
    },

    /// Load and validate the config, then print the effective origins.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Resolve { path, session } => {
            let client = HttpCmsClient::new(&cfg.cms)?;
            let mut resolver = Resolver::new(ContentApi::new(Arc::new(client)), cfg.rewriter());
            if let Some((username, password)) = cfg.preview.credentials() {
                resolver = resolver.with_credentials(username, password);
            }
            let resolution = resolver.resolve(&path, session.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        Commands::Check => {
            let rewriter = cfg.rewriter();
            println!("graphql endpoint: {}", cfg.cms.graphql_url);
            println!(
                "backend origin:   {}",
                cfg.backend_origin().as_deref().unwrap_or("(none)")
            );
            println!(
                "backend hostname: {}",
                cfg.cms.backend_hostname.as_deref().unwrap_or("(none)")
            );
            println!(
                "frontend origin:  {}",
                rewriter.frontend_origin().as_deref().unwrap_or("(none)")
            );
            println!(
                "url rewriting:    {}",
                if rewriter.is_active() { "on" } else { "off" }
            );
            println!(
                "preview:          {}",
                match (cfg.preview.secret.is_some(), cfg.preview.credentials().is_some()) {
                    (true, true) => "configured",
                    (true, false) => "secret set, credentials missing",
                    (false, _) => "disabled",
                }
            );
        }
    }

    Ok(())
}
