use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::App;
use phage_core::{build_headless_app, SimulationConfig};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A 16x16 lattice with short burst times, so infection spreads quickly.
pub fn small_colony_config() -> anyhow::Result<SimulationConfig> {
    let path = fixture_path("small_colony.json");
    SimulationConfig::from_file(&path)
        .with_context(|| format!("loading fixture {}", path.display()))
}

pub fn small_colony_app() -> anyhow::Result<App> {
    build_headless_app(small_colony_config()?).context("building small colony app")
}
