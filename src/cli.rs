use std::path::PathBuf;

use clap::Parser;

/// A policy-driven SOCKS5 proxy gateway.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Raise log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
