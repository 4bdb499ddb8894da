//! Command-line interface definitions for Top News.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global options can also be supplied through environment variables.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Top News scraper.
///
/// # Examples
///
/// ```sh
/// # Every active source
/// top_news news
///
/// # One source, pretty-printed, with a 20 second overall deadline
/// top_news --pretty --deadline-secs 20 news --source thedailystar
///
/// # Configured sources
/// top_news sources
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML configuration replacing the built-in sources
    #[arg(short, long, env = "TOP_NEWS_CONFIG")]
    pub config: Option<String>,

    /// Give up on sources still running after this many seconds
    #[arg(long, env = "TOP_NEWS_DEADLINE_SECS")]
    pub deadline_secs: Option<u64>,

    /// Pretty-print the JSON envelope
    #[arg(long)]
    pub pretty: bool,

    /// Also write the envelope to `{dir}/{date}/{name}.json`
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List articles from every active source, or from one
    News {
        /// Source name, e.g. `thedailystar`
        #[arg(short, long)]
        source: Option<String>,
    },
    /// List configured sources
    Sources,
    /// Report that the scraper is up
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_news_all() {
        let cli = Cli::parse_from(["top_news", "news"]);
        assert_eq!(cli.command, Command::News { source: None });
        assert!(!cli.pretty);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_cli_news_by_source_with_globals() {
        let cli = Cli::parse_from([
            "top_news",
            "--pretty",
            "--deadline-secs",
            "20",
            "-j",
            "/tmp/json",
            "news",
            "-s",
            "cnn",
        ]);
        assert_eq!(
            cli.command,
            Command::News {
                source: Some("cnn".to_string())
            }
        );
        assert!(cli.pretty);
        assert_eq!(cli.deadline_secs, Some(20));
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
    }

    #[test]
    fn test_cli_sources() {
        let cli = Cli::parse_from(["top_news", "-c", "sources.yaml", "sources"]);
        assert_eq!(cli.command, Command::Sources);
        assert_eq!(cli.config.as_deref(), Some("sources.yaml"));
    }
}
