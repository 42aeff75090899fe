//! End-to-end tests for `gridlam config` commands.

use gridlam::config::Config;

mod fixtures;
use fixtures::*;

#[test]
fn test_config_show_defaults_as_toml() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = run(&["config", "show"], temp_dir.path());

    assert_eq!(
        output.status.code(),
        Some(0),
        "Show config should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Config = toml::from_str(&stdout).expect("Should parse TOML output");
    assert_eq!(parsed, Config::default());
}

#[test]
fn test_config_show_json_schema() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = run(&["config", "show", "--json"], temp_dir.path());

    assert_eq!(output.status.code(), Some(0));
    let result = stdout_json(&output);
    assert_eq!(result["labels"]["sequence_prefix"], "Seq");
    assert_eq!(result["labels"]["start"], 1);
    assert_eq!(result["search"]["allow_non_45"], false);
    assert_eq!(result["logging"]["level"], "warn");
}

#[test]
fn test_config_set_persists() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = run(
        &["config", "set", "--ply-prefix", "P", "--allow-non-45", "true"],
        temp_dir.path(),
    );
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let saved = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
    assert_eq!(saved.labels.ply_prefix, "P");
    assert!(saved.search.allow_non_45);

    let output = run(&["config", "show", "--json"], temp_dir.path());
    assert_eq!(stdout_json(&output)["labels"]["ply_prefix"], "P");
}

#[test]
fn test_config_set_rejects_invalid_values() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = run(&["config", "set", "--start", "0"], temp_dir.path());
    assert_eq!(output.status.code(), Some(3));
    assert!(!temp_dir.path().join("config.toml").exists());

    let output = run(&["config", "set"], temp_dir.path());
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_broken_explicit_config_is_io_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("config.toml"), "[labels\n").unwrap();
    let output = run(&["config", "show"], temp_dir.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_configured_labels_drive_reorder() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[labels]\nply_prefix = \"Lage\"\nseparator = \"\"\n",
    )
    .unwrap();

    let mut project = sound_project();
    for laminate in &mut project.laminates {
        for ply in &mut laminate.plies {
            ply.ply_label.clear();
        }
    }
    let path = temp_dir.path().join("project.json");
    let mut to_save = project.clone();
    gridlam::parser::save_project(&mut to_save, &path).unwrap();

    let output = run(&["reorder", "-p", path.to_str().unwrap()], temp_dir.path());
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let saved = gridlam::parser::parse_project(&path).unwrap();
    assert_eq!(saved.laminates[0].plies[0].ply_label, "Lage1");
}
