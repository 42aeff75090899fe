//! End-to-end tests for `gridlam check` commands.

mod fixtures;
use fixtures::*;

#[test]
fn test_verify_sound_project() {
    let (path, temp_dir) = write_project(&sound_project());
    let output = run(
        &["check", "verify", "--project", path.to_str().unwrap()],
        temp_dir.path(),
    );

    assert_eq!(
        output.status.code(),
        Some(0),
        "Sound project should verify. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓"), "Output should indicate success");
}

#[test]
fn test_verify_faulty_project_json() {
    let (path, temp_dir) = write_project(&faulty_project());
    let output = run(
        &["check", "verify", "--project", path.to_str().unwrap(), "--json"],
        temp_dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    let errors = result["errors"].as_array().unwrap();
    assert!(errors
        .iter()
        .any(|e| e["kind"] == "not_symmetric" && e["laminate"] == "L3"));
    assert!(errors
        .iter()
        .any(|e| e["kind"] == "unbalanced" && e["laminate"] == "L4"));
    let warnings = result["warnings"].as_array().unwrap();
    assert!(warnings.iter().any(|w| w["kind"] == "disconnected_block"));
}

#[test]
fn test_verify_strict_fails_on_warnings() {
    let mut project = sound_project();
    project.cells.push(cell("C9"));
    let (path, temp_dir) = write_project(&project);
    let project_arg = path.to_str().unwrap();

    let lenient = run(&["check", "verify", "-p", project_arg], temp_dir.path());
    assert_eq!(lenient.status.code(), Some(0));

    let strict = run(
        &["check", "verify", "-p", project_arg, "--strict"],
        temp_dir.path(),
    );
    assert_eq!(strict.status.code(), Some(1));
}

#[test]
fn test_symmetry_json_per_laminate() {
    let (path, temp_dir) = write_project(&faulty_project());
    let output = run(
        &[
            "check",
            "symmetry",
            "--project",
            path.to_str().unwrap(),
            "--laminate",
            "L3",
            "--json",
        ],
        temp_dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result.as_array().unwrap().len(), 1);
    assert_eq!(result[0]["laminate"], "L3");
    assert_eq!(result[0]["is_symmetric"], false);
    assert_eq!(result[0]["centers"], serde_json::json!([2]));
    assert_eq!(result[0]["first_mismatch"], serde_json::json!([1, 3]));
}

#[test]
fn test_symmetry_unknown_laminate_is_invalid_input() {
    let (path, temp_dir) = write_project(&sound_project());
    let output = run(
        &["check", "symmetry", "-p", path.to_str().unwrap(), "-l", "Nope"],
        temp_dir.path(),
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_balance_reports_unpaired_angles() {
    let (path, temp_dir) = write_project(&faulty_project());
    let output = run(
        &["check", "balance", "-p", path.to_str().unwrap(), "--json"],
        temp_dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    let l4 = result
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["laminate"] == "L4")
        .unwrap();
    assert_eq!(l4["is_balanced"], false);
    assert_eq!(l4["unbalanced_angles"], serde_json::json!([30.0]));
}

#[test]
fn test_duplicates_and_aml() {
    let mut project = sound_project();
    project
        .add_laminate(laminate("L10", &[45.0, -45.0, 0.0, -45.0, 45.0]))
        .unwrap();
    let (path, temp_dir) = write_project(&project);
    let project_arg = path.to_str().unwrap();

    let output = run(&["check", "duplicates", "-p", project_arg, "--json"], temp_dir.path());
    assert_eq!(output.status.code(), Some(0));
    let groups = stdout_json(&output);
    assert_eq!(groups[0]["laminates"], serde_json::json!(["L1", "L10"]));

    let output = run(&["check", "aml", "-p", project_arg, "--json"], temp_dir.path());
    assert_eq!(output.status.code(), Some(0));
    let aml = stdout_json(&output);
    assert_eq!(aml[0]["laminate"], "L1");
    assert_eq!(aml[0]["aml"], "Soft");
}

#[test]
fn test_missing_project_is_io_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.json");
    let output = run(
        &["check", "verify", "-p", missing.to_str().unwrap()],
        temp_dir.path(),
    );
    assert_eq!(output.status.code(), Some(2));
}
