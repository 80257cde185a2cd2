//! # treescope - Main Entry Point
//!
//! Operates on trees captured as JSON fixtures:
//! - **Query** (`treescope tree.json --query SELECTOR`): print matched records
//! - **Snapshot** (`treescope tree.json --snapshot`): print a nested snapshot
//! - **Request** (`treescope tree.json --request JSON`): run protocol requests
//! - **Replay** (`--replay session.json`): profile a sequence of commits and
//!   print the render report, optionally exporting a Chrome trace

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufWriter};
use std::path::Path;
use std::rc::Rc;

use treescope::cli::Args;
use treescope::config::EngineConfig;
use treescope::domain::RendererId;
use treescope::engine::{Engine, ManualClock};
use treescope::export::ChromeTraceExporter;
use treescope::geometry::FrameGeometry;
use treescope::host::fixture::{load_session, load_tree};
use treescope::protocol::handle_line;
use treescope::tracking::ProfileOptions;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// Simulated time between replayed commits (one 60 Hz frame)
const REPLAY_COMMIT_INTERVAL_MS: f64 = 16.0;

const RENDERER: RendererId = RendererId(1);

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.to_string().to_lowercase().contains("missing required argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(ref session) = args.replay {
        return replay(&args, config, session);
    }

    let Some(ref tree_path) = args.tree else {
        anyhow::bail!(
            "Missing required argument: TREE or --replay\n\n\
             Usage:\n  \
             treescope tree.json --query 'Button'     Query a tree\n  \
             treescope --replay session.json          Profile a session\n\n\
             Run 'treescope --help' for more options"
        );
    };

    let tree = load_tree(tree_path)?;
    let mut engine = Engine::new(config);
    engine.on_commit(RENDERER, &tree);

    if let Some(ref request) = args.request {
        if request == "-" {
            for line in std::io::stdin().lock().lines() {
                let line = line.context("Failed to read request from stdin")?;
                if line.trim().is_empty() {
                    continue;
                }
                println!("{}", handle_line(&mut engine, Some(&tree), &FrameGeometry, &line));
            }
        } else {
            println!("{}", handle_line(&mut engine, Some(&tree), &FrameGeometry, request));
        }
        return Ok(());
    }

    if let Some(ref selector) = args.query {
        let matches = engine.query_selector(&tree, &FrameGeometry, selector);
        info!("{} nodes matched {selector:?}", matches.len());
        return print_json(&matches);
    }

    if args.snapshot {
        return print_json(&engine.snapshot(&tree, &FrameGeometry, args.depth));
    }

    anyhow::bail!("Missing required argument: one of --query, --snapshot or --request")
}

fn replay(args: &Args, config: EngineConfig, session: &Path) -> Result<()> {
    let commits = load_session(session)?;
    let clock = Rc::new(ManualClock::default());
    let mut engine = Engine::with_clock(config, Box::new(Rc::clone(&clock)));

    let options = ProfileOptions { components: args.components.clone(), ignore: args.ignore.clone() };
    engine.start_profiling(&options);
    for tree in &commits {
        clock.advance(REPLAY_COMMIT_INTERVAL_MS);
        engine.on_commit(RENDERER, tree);
    }
    let report = engine.stop_profiling();
    info!("Replayed {} commits from {}", commits.len(), session.display());

    if let Some(ref export_path) = args.export {
        let mut exporter = ChromeTraceExporter::new();
        exporter.add_renders(engine.buffers().renders.iter());
        let file = File::create(export_path)
            .with_context(|| format!("Failed to create {}", export_path.display()))?;
        exporter.export(BufWriter::new(file))?;
        info!("Exported {} trace events to {}", exporter.event_count(), export_path.display());
    }

    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
