//! CLI argument parsing for skilltime

use crate::arguments::ArgumentSpec;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse `NAME` or `NAME=VAL1,VAL2,...` into an argument spec
fn parse_argument_spec(raw: &str) -> Result<ArgumentSpec, String> {
    let (name, values) = match raw.split_once('=') {
        Some((name, values)) => (
            name,
            values
                .split(',')
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => (raw, Vec::new()),
    };
    if name.is_empty() {
        return Err(format!("missing argument name in '{}'", raw));
    }
    Ok(ArgumentSpec::new(name, values))
}

#[derive(Parser, Debug)]
#[command(name = "skilltime")]
#[command(version)]
#[command(
    about = "Obtain data for the lookup execution time estimator",
    long_about = "Import skill execution times into the lookup store from\n  \
                  1. recorded skiller status events (bblog)\n  \
                  2. samples of a bounded Gaussian mixture (generate)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive lookup entries from a recorded skiller log
    Bblog(BblogArgs),
    /// Create lookup entries from a bounded Gaussian mixture
    Generate(GenerateArgs),
}

/// Options shared by all sources
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Root directory of the document store
    #[arg(long = "store-dir", value_name = "DIR", default_value = "skilltime-store")]
    pub store_dir: PathBuf,

    /// Name of the lookup database
    #[arg(long = "db", default_value = "skills")]
    pub db: String,

    /// Name of the lookup collection
    #[arg(short = 'c', long = "collection", default_value = "exec_times")]
    pub collection: String,

    /// Only compute entries, never write or drop anything
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Clear all old data from the lookup collection first
    #[arg(long = "drop-collection-first")]
    pub drop_collection_first: bool,

    /// Enable trace-level logging
    #[arg(long = "debug")]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "debug")]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct BblogArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Ignore entries with a duration (seconds) smaller than this
    #[arg(short = 'l', long = "lower-bound", default_value_t = 0.0)]
    pub lower_bound: f64,

    /// Ignore entries with a duration (seconds) larger than this
    #[arg(short = 'u', long = "upper-bound", default_value_t = f64::INFINITY)]
    pub upper_bound: f64,

    /// Store root holding the skiller log (default: --store-dir)
    #[arg(long = "src-store-dir", value_name = "DIR")]
    pub src_store_dir: Option<PathBuf>,

    /// Name of the skiller log database
    #[arg(long = "src-db", default_value = "fflog")]
    pub src_db: String,

    /// Name of the skiller log collection
    #[arg(long = "src-col", default_value = "SkillerInterface.Skiller")]
    pub src_col: String,

    /// Delete the skiller log collection after a successful pass
    #[arg(long = "drop-src-col")]
    pub drop_src_col: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// TOML file with generate settings; command-line values take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of entries to generate
    #[arg(short = 'n', long = "quantity")]
    pub quantity: Option<usize>,

    /// Skill name to generate entries for
    #[arg(short = 's', long = "skill-name")]
    pub skill_name: Option<String>,

    /// Skill argument and its candidate values, chosen from at random
    ///
    /// With fewer than two values the argument is written as the placeholder '*'.
    #[arg(short = 'a', long = "skill-args", value_name = "NAME[=VAL,...]",
          value_parser = parse_argument_spec)]
    pub skill_args: Vec<ArgumentSpec>,

    /// Mean and standard deviation of one Gaussian, repeat for a mixture
    #[arg(short = 'g', long = "gauss-params", num_args = 2,
          value_names = ["MEAN", "STDDEV"], allow_negative_numbers = true)]
    pub gauss_params: Vec<f64>,

    /// Weight of each Gaussian (default 1)
    #[arg(short = 'w', long = "dist-weights", num_args = 1..)]
    pub dist_weights: Option<Vec<f64>>,

    /// Clip the distribution to this lower bound
    #[arg(short = 'l', long = "lower-bound", allow_negative_numbers = true)]
    pub lower_bound: Option<f64>,

    /// Clip the distribution to this upper bound
    #[arg(short = 'u', long = "upper-bound", allow_negative_numbers = true)]
    pub upper_bound: Option<f64>,

    /// Give up after this many draws in total
    #[arg(long = "max-draws")]
    pub max_draws: Option<u64>,

    /// Seed for reproducible samples
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}
