use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `palate` - taste profiles from descriptions, and ranking by them.
#[derive(Parser, Debug)]
#[command(name = "palate")]
#[command(version)]
#[command(
    about = "Cluster liked/disliked descriptions into a taste profile and rank posts against it.",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: $PALATE_CONFIG, then ~/.palate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a cluster request (JSON) and print the liked/disliked centroids
    Cluster {
        /// Read the request from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Read a rank request (JSON) and print the top posts
    Rank {
        /// Read the request from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Default number of posts to return when the request has no topN
        #[arg(long)]
        top_n: Option<usize>,

        /// Default dislike weight when the request has no dislikeWeight
        #[arg(long)]
        dislike_weight: Option<f64>,
    },

    /// Start the HTTP service
    Serve {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
