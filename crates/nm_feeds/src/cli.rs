use chrono::Utc;
use clap::{Args, Subcommand};
use nm_core::{Error, Result};

use crate::collector::FeedCollector;

#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    #[command(subcommand)]
    pub command: FeedCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FeedCommands {
    /// List the feed registry by category
    List,
    /// Fetch one feed (by URL) or every feed of a category and print the normalized items
    Fetch {
        /// A category name (e.g. politics) or a feed URL from the registry
        target: String,
    },
}

pub async fn handle_command(args: FeedArgs, collector: &FeedCollector) -> Result<()> {
    match args.command {
        FeedCommands::List => {
            for category in nm_core::Category::ALL {
                println!("{}:", category);
                for endpoint in collector.registry().by_category(category) {
                    println!("  - {} ({})", endpoint.source, endpoint.url);
                }
            }
        }
        FeedCommands::Fetch { target } => {
            let endpoints: Vec<_> = collector
                .registry()
                .select(&target)
                .into_iter()
                .cloned()
                .collect();
            if endpoints.is_empty() {
                return Err(Error::Config(format!(
                    "No feed or category matches: {}",
                    target
                )));
            }

            let report = collector.collect_from(&endpoints, Utc::now()).await;
            for item in &report.items {
                println!(
                    "🆕 [{}] {} - {} ({})",
                    item.source,
                    item.title,
                    item.link,
                    item.published_at.format("%Y-%m-%d %H:%M")
                );
            }
            for failure in &report.failures {
                eprintln!("Failed to fetch {}: {}", failure.url, failure.error);
            }
            println!(
                "Found {} items from {} feeds ({} failed)",
                report.items.len(),
                report.feeds_ok,
                report.feeds_failed()
            );
        }
    }
    Ok(())
}
