//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::MAX_TRAVERSAL_DEPTH;

#[derive(Parser, Debug)]
#[command(
    name = "treescope",
    about = "Query, snapshot, and profile component trees captured as JSON fixtures",
    after_help = "\
EXAMPLES:
    treescope tree.json --query 'Pressable:has-press'     Find pressable nodes
    treescope tree.json --snapshot --depth 3              Print a bounded snapshot
    treescope --replay session.json --export trace.json   Profile commits, export a trace
    treescope tree.json --request '{\"method\":\"tree.inspect\",\"params\":{\"uid\":\"0.1\"},\"id\":1}'"
)]
pub struct Args {
    /// Tree fixture to operate on
    #[arg(value_name = "TREE")]
    pub tree: Option<PathBuf>,

    /// Selector to evaluate against the tree
    #[arg(short, long, value_name = "SELECTOR")]
    pub query: Option<String>,

    /// Print a nested snapshot of the tree
    #[arg(short, long)]
    pub snapshot: bool,

    /// Maximum snapshot depth
    #[arg(long, default_value_t = MAX_TRAVERSAL_DEPTH)]
    pub depth: usize,

    /// Session fixture to replay through the render profiler
    #[arg(long, value_name = "SESSION", conflicts_with = "tree")]
    pub replay: Option<PathBuf>,

    /// Export replayed renders as a Chrome trace (requires --replay)
    #[arg(long, value_name = "FILE", requires = "replay")]
    pub export: Option<PathBuf>,

    /// Only profile these components (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub components: Option<Vec<String>>,

    /// Ignore these components (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub ignore: Vec<String>,

    /// Execute a single JSON request against the tree; `-` reads lines from stdin
    #[arg(long, value_name = "JSON")]
    pub request: Option<String>,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
