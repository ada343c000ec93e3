//! Fernleaf CLI - Inspect what the storefront sees in the CMS.
//!
//! # Usage
//!
//! ```bash
//! # Which entity kind does a path resolve to?
//! fernleaf resolve /about/team
//!
//! # Are the REST and GraphQL APIs reachable?
//! fernleaf ping
//!
//! # List products the way the catalog shows them
//! fernleaf products --category bedding --sort price-desc
//! ```
//!
//! # Commands
//!
//! - `resolve` - Run the slug resolution chain for a path
//! - `ping` - Check CMS reachability
//! - `products` - List catalog products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Log filter when `RUST_LOG` is unset. Command results are logged at info.
const DEFAULT_LOG_FILTER: &str = "fernleaf=info,fernleaf_storefront=warn";

#[derive(Parser)]
#[command(name = "fernleaf")]
#[command(author, version, about = "Fernleaf CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a path against the CMS and report what matched
    Resolve {
        /// Request path, e.g. `/about/team`
        path: String,
    },
    /// Check that the REST and GraphQL APIs answer
    Ping,
    /// List products as the catalog would show them
    Products {
        /// Product category slug
        #[arg(short, long)]
        category: Option<String>,

        /// Sort key (`price`, `price-desc`, `date`, `popularity`, `rating`, `name`)
        #[arg(short, long, default_value = "")]
        sort: String,
    },
}

#[tokio::main]
async fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cms = commands::connect()?;
    match cli.command {
        Commands::Resolve { path } => commands::resolve::run(&cms, &path).await?,
        Commands::Ping => commands::ping::run(&cms).await?,
        Commands::Products { category, sort } => {
            commands::products::run(&cms, category.as_deref(), &sort).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn test_default_filter_shows_command_output() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_parses_products_command() {
        let cli = Cli::parse_from(["fernleaf", "products", "--category", "linen", "--sort", "price"]);
        assert!(matches!(
            cli.command,
            Commands::Products { category: Some(ref c), ref sort } if c == "linen" && sort == "price"
        ));
    }
}
