//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Build and maintain personalized book discovery queues.
///
/// Bookswipe sources candidate books from Open Library subjects and
/// generative suggestions, enriches them with edition, author and cover
/// data, and keeps a shuffled, de-duplicated queue per user.
#[derive(Parser, Debug)]
#[command(name = "bookswipe")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// SQLite database file (overrides `database_path` from the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/bookswipe/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Open Library base URL
    #[arg(long, global = true, value_name = "URL", value_parser = parse_http_url)]
    pub catalog_url: Option<String>,

    /// Cover lookup service base URL
    #[arg(long, global = true, value_name = "URL", value_parser = parse_http_url)]
    pub cover_url: Option<String>,

    /// API key for the suggestion service; suggestions are off without one
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub suggest_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations on one user's queue.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a profile and seed its queue from trending books
    Setup {
        #[arg(long)]
        user: String,
    },
    /// Run the discovery pipeline for a user
    Fetch {
        #[arg(long)]
        user: String,
    },
    /// Move a book to the liked set
    Like {
        #[arg(long)]
        user: String,
        /// Book document id, e.g. OL45804W
        #[arg(long)]
        book: String,
    },
    /// Move a book to the disliked set
    Dislike {
        #[arg(long)]
        user: String,
        /// Book document id, e.g. OL45804W
        #[arg(long)]
        book: String,
    },
    /// Show a user's preference profile
    Profile {
        #[arg(long)]
        user: String,
        /// Recompute preferences from swipe history first
        #[arg(long)]
        refresh: bool,
    },
}

fn parse_http_url(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("invalid URL '{raw}': {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("expected an http(s) URL, got '{raw}'"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_fetch_parses_user() {
        let args = Args::try_parse_from(["bookswipe", "fetch", "--user", "u1"]).unwrap();
        assert_eq!(
            args.command,
            Command::Fetch {
                user: "u1".to_string()
            }
        );
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.db.is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["bookswipe", "-v", "fetch", "--user", "u1"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["bookswipe", "fetch", "--user", "u1", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["bookswipe", "--quiet", "setup", "--user", "u1"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_like_requires_book() {
        let err = Args::try_parse_from(["bookswipe", "like", "--user", "u1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args =
            Args::try_parse_from(["bookswipe", "dislike", "--user", "u1", "--book", "OL1W"])
                .unwrap();
        assert_eq!(
            args.command,
            Command::Dislike {
                user: "u1".to_string(),
                book: "OL1W".to_string()
            }
        );
    }

    #[test]
    fn test_cli_profile_refresh_flag() {
        let args =
            Args::try_parse_from(["bookswipe", "profile", "--user", "u1", "--refresh"]).unwrap();
        assert!(matches!(args.command, Command::Profile { refresh: true, .. }));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Args::try_parse_from(["bookswipe"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["bookswipe", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["bookswipe", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_service_urls_are_validated() {
        let args = Args::try_parse_from([
            "bookswipe",
            "--catalog-url",
            "http://localhost:9000/",
            "fetch",
            "--user",
            "u1",
        ])
        .unwrap();
        assert_eq!(args.catalog_url.as_deref(), Some("http://localhost:9000"));

        let err = Args::try_parse_from([
            "bookswipe",
            "--cover-url",
            "ftp://covers",
            "fetch",
            "--user",
            "u1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["bookswipe", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
