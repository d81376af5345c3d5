//! Integration tests for `nfkit curl`.
#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to the compiled `nfkit` binary.
fn nfkit_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("nfkit");
    path
}

const PRESETS: &str = r#"{
  "Loja Centro": { "platform": "tray", "url": "https://tray.example/webhook" },
  "Atacado": { "platform": "plugg", "url": "https://plugg.example/orders", "user": "77" }
}"#;

// ── helpers ─────────────────────────────────────────────────────────────────

fn run(args: &[&str]) -> Output {
    Command::new(nfkit_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("NFKIT_PRESETS")
        .output()
        .expect("run nfkit curl")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

fn preset_file(dir: &Path) -> PathBuf {
    let path = dir.join("presets.json");
    std::fs::write(&path, PRESETS).expect("write presets");
    path
}

// ---------------------------------------------------------------------------
// curl
// ---------------------------------------------------------------------------

#[test]
fn preset_generates_one_command_per_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let presets = preset_file(dir.path());

    let out = run(&[
        "curl",
        "101, 102;103",
        "--presets",
        path_str(&presets),
        "--preset",
        "Loja Centro",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let commands: Vec<&str> = stdout.split("\n\n").filter(|c| !c.is_empty()).collect();
    assert_eq!(commands.len(), 3, "stdout: {stdout}");
    assert!(commands[0].starts_with("curl --location 'https://tray.example/webhook'"));
    assert!(commands[2].ends_with("--data '{\"orderId\":103,\"act\":\"created\"}'"));
}

#[test]
fn flags_override_the_preset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let presets = preset_file(dir.path());

    let out = run(&[
        "curl",
        "A-1",
        "--presets",
        path_str(&presets),
        "--preset",
        "Atacado",
        "--user",
        "88",
        "--format",
        "json",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let line: serde_json::Value =
        serde_json::from_str(stdout.lines().next().expect("line")).expect("json");
    assert_eq!(line["curl"]["id"], "A-1");
    let command = line["curl"]["command"].as_str().expect("command");
    assert!(command.contains("\"user\": 88,"), "{command}");
    assert!(command.contains("https://plugg.example/orders"), "{command}");
}

#[test]
fn save_writes_the_resolved_preset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let presets = dir.path().join("novo.json");

    let out = run(&[
        "curl",
        "5",
        "--presets",
        path_str(&presets),
        "--url",
        "https://hub.example/any",
        "--oi",
        "OI-3",
        "--save",
        "Filial",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("wrote "), "stdout: {stdout}");
    assert!(stdout.contains("\"content\": { \"id\": \"5\", \"oi\": \"OI-3\" }"), "{stdout}");

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&presets).expect("saved")).expect("json");
    assert_eq!(saved["Filial"]["platform"], "any");
    assert_eq!(saved["Filial"]["url"], "https://hub.example/any");
    assert_eq!(saved["Filial"]["oi"], "OI-3");
}

#[test]
fn unknown_preset_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let presets = preset_file(dir.path());

    let out = run(&["curl", "1", "--presets", path_str(&presets), "--preset", "Sumida"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error: preset Sumida"), "stderr: {stderr}");
    assert!(stderr.contains("Atacado, Loja Centro"), "stderr: {stderr}");
}

#[test]
fn missing_url_exits_2() {
    let out = run(&["curl", "1", "--platform", "tray"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no URL"), "stderr: {stderr}");
}
