//! `instancer`: build an instance dataset from a geometry snapshot and write
//! it as JSON.

mod args;
mod config;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use instancer_core::export::{read_json, write_json, write_json_pretty};
use instancer_core::instancing::{InstanceDataset, TransformBuilder};
use instancer_core::session::MemorySession;

use args::Args;

/// Matrix entries may drift by float formatting on the way through JSON.
const VERIFY_TOLERANCE: f32 = 1e-5;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config::load_or_default(&args.config);
    args.apply_to(&mut config);

    let text = std::fs::read_to_string(&args.snapshot)
        .map_err(|e| format!("failed to read {}: {e}", args.snapshot.display()))?;
    let session = MemorySession::from_json(&text)
        .map_err(|e| format!("failed to parse {}: {e}", args.snapshot.display()))?;

    let parts = if args.parts.is_empty() {
        session.part_refs()
    } else {
        args.parts.clone()
    };
    log::info!(
        "Snapshot {}: probing {} of {} parts",
        args.snapshot.display(),
        parts.len(),
        session.parts.len()
    );

    let mut builder = TransformBuilder::new(&session, parts)
        .with_names(config.attributes.clone())
        .with_normal_mode(config.normal_rotation)
        .with_log_missing(config.log_missing);
    // A failed build still writes its (empty) payload so stale data is replaced.
    let built = builder.build();

    let path = config.output_path.as_path();
    if args.pretty {
        write_json_pretty(builder.dataset(), path)?;
    } else {
        write_json(builder.dataset(), path)?;
    }
    log::info!("Wrote {}", path.display());

    if args.verify {
        verify(builder.dataset(), path)?;
    }

    built.map_err(Into::into)
}

fn verify(expected: &InstanceDataset, path: &Path) -> Result<(), String> {
    let read = read_json(path).map_err(|e| format!("verify: {e}"))?;
    match read {
        None if !expected.is_valid() => {
            log::info!("Verified empty payload");
            Ok(())
        }
        Some(read) if datasets_match(expected, &read) => {
            log::info!("Verified {} points", read.points.len());
            Ok(())
        }
        _ => Err(format!("verify: {} does not match the built dataset", path.display())),
    }
}

fn datasets_match(a: &InstanceDataset, b: &InstanceDataset) -> bool {
    a.prototypes == b.prototypes
        && a.points.len() == b.points.len()
        && a.points.iter().zip(&b.points).all(|(p, q)| {
            p.prototype_index == q.prototype_index
                && (p.model_to_world - q.model_to_world).amax() <= VERIFY_TOLERANCE
                && (p.position - q.position).amax() <= VERIFY_TOLERANCE
        })
}
