//! ayna-m3u - keeps an Ayna OTT session alive and turns its channel
//! listings into M3U playlists.

mod commands;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name inside `--log-file`
const LOG_FILE: &str = "ayna-m3u.log";

#[derive(Parser)]
#[command(name = "ayna-m3u", about = "Build M3U playlists from the Ayna OTT web API", version)]
struct Cli {
    /// Path to configuration file (default: ~/.config/ayna-m3u/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to ayna-m3u.log in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Store account credentials and perform a fresh login
    Login {
        /// Account login (email or phone); prompted when omitted
        #[arg(long)]
        user: Option<String>,
    },
    /// Forget the stored token
    Logout {
        /// Also delete the account password from the keychain
        #[arg(long)]
        forget_password: bool,
    },
    /// Print a valid access token, refreshing or logging in as needed
    Token {
        /// Refresh even if the stored token is still valid
        #[arg(long)]
        force_refresh: bool,
    },
    /// Show the stored token state without touching the network
    Status,
    /// Keep the token fresh until interrupted
    Watch {
        /// Seconds between checks
        #[arg(long, default_value = "600")]
        interval: u64,
    },
    /// Save the raw category listing
    Categories {
        #[arg(long, default_value = "data.json")]
        output: PathBuf,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "10")]
        per_page: u32,
    },
    /// Build a playlist from a saved category listing
    Playlist {
        #[arg(long, default_value = "data.json")]
        input: PathBuf,
        #[arg(long, default_value = "playlist.m3u")]
        output: PathBuf,
        /// group-title for every entry
        #[arg(long, default_value = "Live")]
        group: String,
    },
    /// Merge channel files, check every stream and split good from bad links
    Merge {
        /// Channel JSON files, earlier files win on duplicate ids
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "AynaOTT.m3u")]
        output: PathBuf,
        #[arg(long, default_value = "bad_links.m3u")]
        bad_output: PathBuf,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref());
    info!("ayna-m3u starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Login { user } => commands::auth::login(config_path, user).await?,
        Commands::Logout { forget_password } => {
            commands::auth::logout(config_path, forget_password)?
        }
        Commands::Token { force_refresh } => {
            commands::auth::token(config_path, force_refresh).await?
        }
        Commands::Status => commands::auth::status(config_path)?,
        Commands::Watch { interval } => commands::auth::watch(config_path, interval).await?,
        Commands::Categories {
            output,
            page,
            per_page,
        } => commands::playlist::categories(config_path, &output, page, per_page).await?,
        Commands::Playlist {
            input,
            output,
            group,
        } => commands::playlist::playlist(config_path, &input, &output, &group).await?,
        Commands::Merge {
            files,
            output,
            bad_output,
        } => commands::playlist::merge(config_path, &files, &output, &bad_output).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_token_defaults() {
        let cli = Cli::parse_from(["ayna-m3u", "token"]);
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Token { force_refresh } => assert!(!force_refresh),
            _ => panic!("expected Token command"),
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ayna-m3u",
            "token",
            "--force-refresh",
            "--config",
            "/etc/ayna.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ayna.json")));
        match cli.command {
            Commands::Token { force_refresh } => assert!(force_refresh),
            _ => panic!("expected Token command"),
        }
    }

    #[test]
    fn cli_parse_playlist_defaults() {
        let cli = Cli::parse_from(["ayna-m3u", "playlist"]);
        match cli.command {
            Commands::Playlist {
                input,
                output,
                group,
            } => {
                assert_eq!(input, PathBuf::from("data.json"));
                assert_eq!(output, PathBuf::from("playlist.m3u"));
                assert_eq!(group, "Live");
            }
            _ => panic!("expected Playlist command"),
        }
    }

    #[test]
    fn cli_parse_merge() {
        let cli = Cli::parse_from([
            "ayna-m3u", "merge", "a.json", "b.json", "--output", "good.m3u",
        ]);
        match cli.command {
            Commands::Merge {
                files,
                output,
                bad_output,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert_eq!(output, PathBuf::from("good.m3u"));
                assert_eq!(bad_output, PathBuf::from("bad_links.m3u"));
            }
            _ => panic!("expected Merge command"),
        }
    }

    #[test]
    fn cli_merge_requires_files() {
        assert!(Cli::try_parse_from(["ayna-m3u", "merge"]).is_err());
    }

    #[test]
    fn cli_parse_watch_interval() {
        let cli = Cli::parse_from(["ayna-m3u", "watch", "--interval", "30"]);
        match cli.command {
            Commands::Watch { interval } => assert_eq!(interval, 30),
            _ => panic!("expected Watch command"),
        }
    }
}
