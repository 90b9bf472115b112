// hubbub command-line front end.
// Renders gist comment widgets to stdout and manages the local cache.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hubbub::cache::{KeyValueStore, MemoryStore};
use hubbub::pipeline::{source_from_config, store_from_config};
use hubbub::{Config, Element, Hubbub, ListOutcome, Result, StaleRead, WidgetVariant};

/// Render GitHub Gist comments as HTML.
#[derive(Parser, Debug)]
#[command(name = "hubbub")]
#[command(version)]
struct Args {
    /// GitHub API root
    #[arg(long, env = "HUBBUB_API_ROOT")]
    api_root: Option<String>,

    /// Cache directory (defaults to the platform cache dir)
    #[arg(long, env = "HUBBUB_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one widget per gist and print the markup
    Render {
        /// Gist URLs (url variant) or ids (id variant)
        #[arg(required = true)]
        gists: Vec<String>,

        /// Widget addressing and layout
        #[arg(long, value_enum, default_value_t = WidgetVariant::UrlAttribute)]
        variant: WidgetVariant,

        /// Read `{gist}.json` and `{comment}.html` from this directory
        #[arg(long, env = "HUBBUB_FIXTURES")]
        fixtures: Option<PathBuf>,

        /// What an expired cache entry yields
        #[arg(long, value_enum, default_value_t = StaleRead::Miss)]
        stale_read: StaleRead,

        /// Keep the cache in memory for this run only
        #[arg(long)]
        no_cache: bool,
    },
    /// Manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Delete every cached comment list and rendered body
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the markup.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(api_root) = args.api_root {
        config.api_root = api_root;
    }
    if let Some(cache_dir) = args.cache_dir {
        config.cache_dir = Some(cache_dir);
    }

    match args.command {
        Command::Render {
            gists,
            variant,
            fixtures,
            stale_read,
            no_cache,
        } => {
            config.variant = variant;
            config.stale_read = stale_read;
            if fixtures.is_some() {
                config.fixtures_dir = fixtures;
            }
            render(config, &gists, no_cache).await
        }
        Command::Cache {
            action: CacheAction::Clear,
        } => {
            store_from_config(&config)?.clear()?;
            info!("cache cleared");
            Ok(())
        }
    }
}

async fn render(config: Config, gists: &[String], no_cache: bool) -> Result<()> {
    let hubbub = if no_cache {
        let source = source_from_config(&config)?;
        Hubbub::new(config, source, Arc::new(MemoryStore::new()))
    } else {
        Hubbub::from_config(config)?
    };

    let mut page = Element::new("body");
    for gist in gists {
        let report = hubbub.append_widget(&mut page, gist).await?;
        if report.list == ListOutcome::Failed {
            info!(gist_id = %report.gist_id, "comments unavailable");
        }
    }

    for widget in page.child_elements() {
        println!("{}", widget.to_html());
    }
    Ok(())
}
