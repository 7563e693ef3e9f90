//! Integration tests for the hextactics binary
//!
//! Runs the built executable against the sample data in `data/`.

use std::path::PathBuf;
use std::process::{Command, Output};

fn hextactics(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hextactics"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run hextactics")
}

fn data(file: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "..", "data", file].iter().collect();
    path.to_string_lossy().into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_grid_prints_every_row() {
    let output = hextactics(&["grid", "--width", "5", "--height", "4", "--seed", "3"]);
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Grid 5x4 (seed 3)");
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[2], " . . . .");
}

#[test]
fn test_grid_is_reproducible() {
    let args = ["grid", "--width", "9", "--height", "8", "--roadblock-chance", "0.3", "--seed", "21"];
    assert_eq!(stdout(&hextactics(&args)), stdout(&hextactics(&args)));
}

#[test]
fn test_path_on_open_grid() {
    let output = hextactics(&[
        "path",
        "--width",
        "3",
        "--height",
        "3",
        "--roadblock-chance",
        "0",
        "--from",
        "0,0",
        "--to",
        "2,0",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("Path (0, 0) -> (2, 0): 2 steps, cost 2\n"));
}

#[test]
fn test_path_rejects_off_grid_hex() {
    let output = hextactics(&["path", "--width", "3", "--height", "3", "--from", "0,0", "--to", "9,9"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not on the 3x3 grid"));
}

#[test]
fn test_replay_sample_match_json() {
    let output = hextactics(&[
        "replay",
        "--catalog",
        &data("catalog.json"),
        "--roster",
        &data("roster.json"),
        "--config",
        &data("config.json"),
        "--script",
        &data("script.json"),
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["state"], "Battle");
    assert_eq!(report["steps"], 12);
    assert_eq!(report["units"].as_array().unwrap().len(), 6);
    assert_eq!(report["units"][0]["template"], "knight");
    assert_eq!(report["units"][0]["mana"], 1);
    assert!(report["outcome"].is_null());
}

#[test]
fn test_replay_without_script_stops_in_army_build() {
    let output = hextactics(&[
        "replay",
        "--catalog",
        &data("catalog.json"),
        "--roster",
        &data("roster.json"),
        "--json",
    ]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["state"], "ArmyBuild");
    assert!(report["units"]
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["coord"].is_null()));
}
