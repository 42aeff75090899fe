//! Shared test fixtures for integration and E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use gridlam::models::{CellId, Direction, Laminate, Ply, PlyKind, Project};
use gridlam::parser::save_project;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Parses a cell identifier.
pub fn cell(text: &str) -> CellId {
    CellId::parse(text).unwrap()
}

/// Structural CFRP plies at the given angles.
pub fn plies(angles: &[f64]) -> Vec<Ply> {
    angles
        .iter()
        .map(|a| Ply::new("CFRP", Some(*a)).unwrap())
        .collect()
}

/// Laminate of structural CFRP plies.
pub fn laminate(name: &str, angles: &[f64]) -> Laminate {
    Laminate::with_plies(name, plies(angles)).unwrap()
}

/// Non-structural ply at `angle`.
pub fn non_structural(angle: f64) -> Ply {
    Ply::new("PEEL", Some(angle))
        .unwrap()
        .with_kind(PlyKind::NonStructural)
}

/// Sequence of optional orientations, `None` for blanked slots.
pub fn orientations(laminate: &Laminate) -> Vec<Option<f64>> {
    laminate.orientations()
}

/// 2x2 grid of cells, every laminate symmetric and balanced.
///
/// ```text
/// C1 - C2      C1, C2: L1 [45/-45/0/-45/45]
/// |    |       C3:     L2 [45/-45/0/0/-45/45]
/// C3 - C4      C4:     L1
/// ```
pub fn sound_project() -> Project {
    let mut project = Project::new();
    project
        .add_laminate(laminate("L1", &[45.0, -45.0, 0.0, -45.0, 45.0]))
        .unwrap();
    project
        .add_laminate(laminate("L2", &[45.0, -45.0, 0.0, 0.0, -45.0, 45.0]))
        .unwrap();
    for (id, name) in [("C1", "L1"), ("C2", "L1"), ("C3", "L2"), ("C4", "L1")] {
        project.assign(cell(id), name).unwrap();
    }
    let graph = &mut project.graph;
    graph.link(&cell("C1"), Direction::Right, &cell("C2")).unwrap();
    graph.link(&cell("C1"), Direction::Down, &cell("C3")).unwrap();
    graph.link(&cell("C3"), Direction::Right, &cell("C4")).unwrap();
    graph.link(&cell("C2"), Direction::Down, &cell("C4")).unwrap();
    project
}

/// Project with a not-symmetric laminate, an unbalanced laminate and an
/// isolated cell pair.
pub fn faulty_project() -> Project {
    let mut project = sound_project();
    project
        .add_laminate(laminate("L3", &[45.0, 45.0, 0.0, -45.0, 45.0]))
        .unwrap();
    project.add_laminate(laminate("L4", &[30.0, 0.0, 30.0])).unwrap();
    project.assign(cell("C7"), "L3").unwrap();
    project.assign(cell("C8"), "L4").unwrap();
    project
        .graph
        .link(&cell("C7"), Direction::Right, &cell("C8"))
        .unwrap();
    project
}

/// Writes `project` into a fresh temp directory.
///
/// The `TempDir` must be kept alive for the file to exist.
pub fn write_project(project: &Project) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("project.json");
    let mut project = project.clone();
    save_project(&mut project, &path).unwrap();
    (path, temp_dir)
}

/// Path to the gridlam binary.
pub fn gridlam_bin() -> &'static str {
    env!("CARGO_BIN_EXE_gridlam")
}

/// Runs gridlam with a config file inside `config_dir` so the user's own
/// configuration never leaks into a test.
pub fn run(args: &[&str], config_dir: &Path) -> Output {
    let config = config_dir.join("config.toml");
    Command::new(gridlam_bin())
        .args(args)
        .arg("--config")
        .arg(&config)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Parses stdout as JSON.
pub fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}
