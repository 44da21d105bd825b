//! Command line arguments.
//!
//! Flags given here override values loaded from the config file.

use std::path::PathBuf;

use clap::Parser;
use instancer_core::instancing::NormalRotationMode;
use instancer_core::session::PartRef;

use crate::config::InstancerConfig;

/// Extract an instancing dataset from a geometry snapshot.
#[derive(Parser, Debug)]
#[command(
    name = "instancer",
    about = "Extract per-point instance transforms from a geometry snapshot",
    long_about = "Reads the point attributes of a captured geometry snapshot, builds one\n\
        model matrix and prototype index per point, and writes the instance JSON.\n\
        \n\
        EXAMPLES:\n\
          # Use defaults from ./instancer.toml\n\
          instancer --snapshot scatter.json\n\
        \n\
          # Only read part 0 of geometry 3, write indented JSON\n\
          instancer --snapshot scatter.json --part 3:0 --pretty -o out/instances.json",
    version
)]
pub struct Args {
    /// Geometry snapshot (JSON) to read attributes from.
    #[arg(long, short)]
    pub snapshot: PathBuf,

    /// Config file. Missing files fall back to defaults.
    #[arg(long, default_value = "instancer.toml")]
    pub config: PathBuf,

    /// Output path for the instance JSON.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// How normals become rotations when no orientation is present.
    #[arg(long, value_enum)]
    pub normal_mode: Option<CliNormalMode>,

    /// Parts to probe, as `geo:part`, in order. Defaults to every part.
    #[arg(long = "part", value_parser = parse_part_ref)]
    pub parts: Vec<PartRef>,

    /// Write indented JSON.
    #[arg(long)]
    pub pretty: bool,

    /// Read the written file back and compare it to the built dataset.
    #[arg(long)]
    pub verify: bool,

    /// Do not log missing optional attributes.
    #[arg(long)]
    pub quiet_missing: bool,
}

impl Args {
    /// Apply command line overrides on top of a loaded config.
    pub fn apply_to(&self, config: &mut InstancerConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(mode) = self.normal_mode {
            config.normal_rotation = mode.into();
        }
        if self.quiet_missing {
            config.log_missing = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliNormalMode {
    /// Shortest arc from +Y to the normal.
    ShortestArc,
    /// Degree-scaled arc used by older exports.
    LegacyDegrees,
}

impl From<CliNormalMode> for NormalRotationMode {
    fn from(mode: CliNormalMode) -> Self {
        match mode {
            CliNormalMode::ShortestArc => NormalRotationMode::ShortestArc,
            CliNormalMode::LegacyDegrees => NormalRotationMode::LegacyDegrees,
        }
    }
}

fn parse_part_ref(s: &str) -> Result<PartRef, String> {
    let (geo, part) = s
        .split_once(':')
        .ok_or_else(|| format!("expected geo:part, got \"{s}\""))?;
    let geo_id = geo
        .trim()
        .parse()
        .map_err(|e| format!("invalid geo id \"{geo}\": {e}"))?;
    let part_id = part
        .trim()
        .parse()
        .map_err(|e| format!("invalid part id \"{part}\": {e}"))?;
    Ok(PartRef::new(geo_id, part_id))
}
