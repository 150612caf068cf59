//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Explore COVID-19 figures aggregated along World, continents and countries
#[derive(Parser, Debug)]
#[command(name = "covtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./covtree.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Dataset CSV (overrides data_file from config)
    #[arg(short = 'f', long, global = true, value_hint = ValueHint::FilePath)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Per-country values for one month, largest first
    Snapshot {
        /// Month, e.g. "March 2021"
        month: String,
        /// Metric view, e.g. cases, deaths-normalised
        #[arg(short, long)]
        view: Option<String>,
        /// World or a continent
        #[arg(short, long)]
        region: Option<String>,
        /// Show only the first N countries
        #[arg(short, long)]
        top: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Per-country values over a range of months
    Series {
        /// Metric view, e.g. cases, deaths-normalised
        #[arg(short, long)]
        view: Option<String>,
        /// World or a continent
        #[arg(short, long)]
        region: Option<String>,
        /// First month (default: first month in the data)
        #[arg(long)]
        from: Option<String>,
        /// Last month (default: last month in the data)
        #[arg(long)]
        to: Option<String>,
        /// Restrict to these countries (repeatable)
        #[arg(long = "country")]
        countries: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the region hierarchy as tree
    Tree {
        /// World or a continent
        #[arg(short, long)]
        region: Option<String>,
    },

    /// List continents with their number of countries
    Regions,

    /// List months present in the data
    Months,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
