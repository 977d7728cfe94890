//! End-to-end tests of the `cv-page` binary against `fixtures/page/`.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/page")
        .join(name)
        .to_str()
        .unwrap()
        .to_string()
}

fn run(args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_cv-page"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cv-page");
    assert!(
        output.status.success(),
        "cv-page {:?} failed:\n{}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn check_lists_every_feature() {
    let out = stdout(&run(&["check", &fixture("index.html")]));
    assert!(out.contains("Navigation: found"), "{out}");
    assert!(out.contains("Sections: home, SKILLS, PROJECT, contact"));
    assert!(out.contains("Typing effect: found"));
    assert!(out.contains("Skill bars: 6"));
    assert!(out.contains("Cards: 4"));
    assert!(out.contains("Filter buttons: 7"));
    assert!(out.contains("Filter select: found"));
    assert!(out.contains("Items: 3"));
}

#[test]
fn simulate_json_report() {
    let out = run(&[
        "simulate",
        &fixture("index.html"),
        &fixture("scenario.toml"),
        "--json",
    ]);
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    assert_eq!(report["time_ms"], 20_000);
    assert_eq!(report["page"]["current_section"], "contact");
    assert_eq!(report["page"]["is_scrolled"], true);
    assert_eq!(report["page"]["skills_animated"], true);
    assert_eq!(report["page"]["projects_loaded"], true);
    assert_eq!(report["filter"], "java");
    assert_eq!(report["visible_projects"], serde_json::json!([0]));
    // paused 4s..12s, then one tick at 17s
    assert_eq!(report["carousel"]["current"], 1);
    assert_eq!(report["scroll_requests"], serde_json::json!([2620.0]));
    assert_eq!(report["notifications"][0]["type"], "cvAppLoaded");
    assert_eq!(report["submissions"][0]["status"], "accepted");

    let prevented: Vec<_> = report["steps"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["prevent_default"] == true)
        .map(|s| s["event"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(prevented, vec!["click", "submit"]);
}

#[test]
fn simulate_text_report() {
    let out = stdout(&run(&[
        "simulate",
        &fixture("index.html"),
        &fixture("scenario.toml"),
    ]));
    assert!(out.starts_with("At 20000ms, scrolled to 2620px"), "{out}");
    assert!(out.contains("    Filter: java"));
    assert!(out.contains("    Slide 2 of 3 (autoplay on)"));
    assert!(out.contains("    001 accepted: Alex <alex@example.com>"));
}

#[test]
fn gen_config_round_trips_through_config_flag() {
    let toml = stdout(&run(&["gen-config"]));
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cv-page.toml");
    std::fs::write(&path, toml).unwrap();
    let out = stdout(&run(&[
        "--config",
        path.to_str().unwrap(),
        "check",
        &fixture("index.html"),
    ]));
    assert!(out.contains("Cards: 4"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[carousel]\ninterval_ms = 0\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_cv-page"))
        .args(["--config", path.to_str().unwrap(), "check", &fixture("index.html")])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("interval_ms"));
}
