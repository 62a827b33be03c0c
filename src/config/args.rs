//! Command-line argument parsing

use clap::Parser;

/// Shortener - counter-based URL shortener with batched click analytics
#[derive(Parser, Debug, Default)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "A URL shortener service", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub generate_config: bool,
}
