// End-to-end tests for `titres run` / `titres validate`.
//
// Each test builds a run directory in a tempdir: a run file, GeoJSON/CSV
// snapshots and a reference area collection.
//
// Run with: cargo test -p titres-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn titres() -> Command {
    Command::new(env!("CARGO_BIN_EXE_titres"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    titres()
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn titres")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn square(x: f64, y: f64, size: f64) -> String {
    format!(
        "[[[{x},{y}],[{x2},{y}],[{x2},{y2}],[{x},{y2}],[{x},{y}]]]",
        x2 = x + size,
        y2 = y + size
    )
}

fn feature(props: &str, coords: &str) -> String {
    format!(
        r#"{{"type":"Feature","properties":{props},"geometry":{{"type":"Polygon","coordinates":{coords}}}}}"#
    )
}

fn collection(features: &[String]) -> String {
    format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(","))
}

const RUN_TOML: &str = r#"
name = "Hydrocarbures"

[areas]
file = "communes.geojson"

[output]
file = "out/titres.geojson"

[[domains]]
name = "h"

[[domains.sources]]
date = "2003-01-01"
path = "h-2003.csv"

[[domains.sources]]
date = "2001-01-01"
path = "h-2001.geojson"

[[domains.sources]]
date = "2002-01-01"
path = "h-2002.geojson"
"#;

/// Title 12 is stable for two snapshots then disappears; C7 appears in 2003.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();

    fs::write(p.join("run.toml"), RUN_TOML).unwrap();
    fs::write(
        p.join("communes.geojson"),
        collection(&[
            feature(r#"{"insee":"64300"}"#, &square(0.0, 0.0, 0.1)),
            feature(r#"{"insee":"64400"}"#, &square(0.1, 0.0, 0.1)),
        ]),
    )
    .unwrap();

    let twelve = feature(r#"{"NUMERO":"M12","TYPE":4,"NOM":"Lacq"}"#, &square(0.01, 0.01, 0.02));
    fs::write(p.join("h-2001.geojson"), collection(&[twelve.clone()])).unwrap();
    fs::write(p.join("h-2002.geojson"), collection(&[twelve])).unwrap();
    fs::write(
        p.join("h-2003.csv"),
        "NUMERO;TYPE;NOM;WKT\nC7;1;Pau;POLYGON((0.15 0.01,0.17 0.01,0.17 0.03,0.15 0.03,0.15 0.01))\n",
    )
    .unwrap();
    dir
}

fn read_output(dir: &Path) -> serde_json::Value {
    let content = fs::read_to_string(dir.join("out/titres.geojson")).unwrap();
    serde_json::from_str(&content).unwrap()
}

// ===========================================================================
// titres run
// ===========================================================================

#[test]
fn run_writes_history() {
    let dir = fixture();
    let output = run_in(dir.path(), &["run", "run.toml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let doc = read_output(dir.path());
    let features = doc["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);

    let twelve = &features[0]["properties"];
    assert_eq!(twelve["key"], "12");
    assert_eq!(twelve["start"], "2001-01-01");
    assert_eq!(twelve["end"], "2003-01-01");
    assert_eq!(twelve["open"], false);
    assert_eq!(twelve["areas"], serde_json::json!(["64300"]));

    let c7 = &features[1]["properties"];
    assert_eq!(c7["key"], "C7");
    assert_eq!(c7["start"], "2003-01-01");
    assert!(c7["end"].is_null());
    assert_eq!(c7["areas"], serde_json::json!(["64400"]));

    assert!(stderr(&output).contains("domain h: 3 snapshots, 2 titles, 2 records"));
}

#[test]
fn run_json_is_single_document() {
    let dir = fixture();
    let output = run_in(dir.path(), &["run", "run.toml", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["status"], "ok");
    assert_eq!(report["name"], "Hydrocarbures");
    assert!(report["output"]["blake3"].as_str().unwrap().starts_with("blake3:"));
    assert_eq!(report["domains"][0]["records"], 2);
    assert_eq!(report["domains"][0]["snapshots"].as_array().unwrap().len(), 3);
}

#[test]
fn output_flag_overrides_run_file() {
    let dir = fixture();
    let output = run_in(dir.path(), &["run", "run.toml", "--output", "elsewhere.geojson"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("elsewhere.geojson").exists());
    assert!(!dir.path().join("out/titres.geojson").exists());
}

#[test]
fn rerun_produces_identical_output() {
    let dir = fixture();
    assert!(run_in(dir.path(), &["run", "run.toml"]).status.success());
    let first = fs::read(dir.path().join("out/titres.geojson")).unwrap();
    assert!(run_in(dir.path(), &["run", "run.toml"]).status.success());
    let second = fs::read(dir.path().join("out/titres.geojson")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rejected_features_do_not_fail_the_run() {
    let dir = fixture();
    let bad = feature(r#"{"NUMERO":"Z1","TYPE":4}"#, &square(0.0, 0.0, 0.01));
    let unknown = feature(r#"{"NUMERO":"14","TYPE":99}"#, &square(0.0, 0.0, 0.01));
    let twelve = feature(r#"{"NUMERO":"12","TYPE":4,"NOM":"Lacq"}"#, &square(0.01, 0.01, 0.02));
    fs::write(dir.path().join("h-2001.geojson"), collection(&[twelve, bad, unknown])).unwrap();

    let output = run_in(dir.path(), &["run", "run.toml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("2 of 5 features rejected"));
}

#[test]
fn rejected_features_are_reported_at_default_verbosity() {
    let dir = fixture();
    let bad = feature(r#"{"NUMERO":"Z1","TYPE":4}"#, &square(0.0, 0.0, 0.01));
    let unknown = feature(r#"{"NUMERO":"14","TYPE":99}"#, &square(0.0, 0.0, 0.01));
    fs::write(dir.path().join("h-2002.geojson"), collection(&[bad, unknown])).unwrap();

    let output = titres()
        .args(["run", "run.toml"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn titres");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let err = stderr(&output);
    assert!(err.contains("invalid title identifier"), "stderr: {err}");
    assert!(err.contains("Z1"), "stderr: {err}");
    assert!(err.contains("title 14 has no known type or stage"), "stderr: {err}");
    assert!(err.contains("2002-01-01"), "stderr: {err}");
}

// ===========================================================================
// Exit codes (no output on failure)
// ===========================================================================

#[test]
fn missing_config_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["run", "nope.toml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_config_exits_60() {
    let dir = fixture();
    fs::write(dir.path().join("run.toml"), "name = \"x\"\ndomains = []\n").unwrap();
    let output = run_in(dir.path(), &["run", "run.toml"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("at least one domain"));
    assert!(!dir.path().join("out/titres.geojson").exists());
}

#[test]
fn unreadable_snapshot_exits_61_without_output() {
    let dir = fixture();
    fs::remove_file(dir.path().join("h-2003.csv")).unwrap();
    let output = run_in(dir.path(), &["run", "run.toml"]);
    assert_eq!(output.status.code(), Some(61), "stderr: {}", stderr(&output));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn malformed_reference_areas_exit_61() {
    let dir = fixture();
    fs::write(
        dir.path().join("communes.geojson"),
        collection(&[feature(r#"{"nom":"Pau"}"#, &square(0.0, 0.0, 0.1))]),
    )
    .unwrap();
    let output = run_in(dir.path(), &["run", "run.toml"]);
    assert_eq!(output.status.code(), Some(61));
    assert!(stderr(&output).contains("reference area #0"));
}

#[test]
fn unwritable_output_exits_63() {
    let dir = fixture();
    // a file where the output directory should be
    fs::write(dir.path().join("out"), "").unwrap();
    let output = run_in(dir.path(), &["run", "run.toml"]);
    assert_eq!(output.status.code(), Some(63), "stderr: {}", stderr(&output));
}

// ===========================================================================
// titres validate
// ===========================================================================

#[test]
fn validate_ok() {
    let dir = fixture();
    let output = run_in(dir.path(), &["validate", "run.toml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 domain(s), 3 source(s)"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn validate_reports_missing_inputs() {
    let dir = fixture();
    fs::remove_file(dir.path().join("h-2002.geojson")).unwrap();
    let output = run_in(dir.path(), &["validate", "run.toml"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("h-2002.geojson"));
}

#[test]
fn long_version_names_commit_and_engine() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("titres {} (", env!("CARGO_PKG_VERSION"))), "{stdout}");
    assert!(stdout.contains("engine:  titres-recon"), "{stdout}");
}
