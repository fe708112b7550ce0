//! CLI module for Vidask.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Vidask - Ask questions about YouTube videos
///
/// Processes a video's captions into a searchable index, summarizes it, and answers
/// questions grounded in the transcript.
#[derive(Parser, Debug)]
#[command(name = "vidask")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDASK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive session: process a video, then ask questions about it
    Session {
        /// YouTube URL or video ID to process on startup
        url: Option<String>,
    },

    /// Start HTTP API server with one session per client
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_with_url() {
        let cli = Cli::parse_from(["vidask", "-vv", "session", "https://youtu.be/dQw4w9WgXcQ"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Session { url } => {
                assert_eq!(url.as_deref(), Some("https://youtu.be/dQw4w9WgXcQ"))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["vidask", "serve"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
