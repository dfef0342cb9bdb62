//! Integration tests for the `nettopo` CLI binary.
//!
//! Everything runs offline against topology files in a temp dir, with
//! config lookups pointed away from the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `nettopo` binary with env isolation.
fn nettopo_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nettopo");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("NETTOPO_PROFILE")
        .env_remove("NETTOPO_SERVER")
        .env_remove("NETTOPO_TOKEN")
        .env_remove("NETTOPO_FILE")
        .env_remove("NETTOPO_OUTPUT")
        .env_remove("NETTOPO_TIMEOUT");
    cmd
}

const TOPOLOGY: &str = r#"{
  "nodes": [
    { "id": "inet", "name": "ISP", "type": "INTERNET", "status": "ONLINE" },
    { "id": "r1", "name": "Core Router", "type": "ROUTER", "status": "ONLINE", "groupId": "g1" },
    { "id": "s1", "name": "Access Switch", "type": "SWITCH", "status": "ONLINE", "groupId": "g1" }
  ],
  "connections": [
    { "id": "c1", "sourceNodeId": "inet", "targetNodeId": "r1", "isActiveSource": true },
    { "id": "c2", "sourceNodeId": "r1", "targetNodeId": "s1" }
  ],
  "groups": [
    { "id": "g1", "name": "Office" }
  ],
  "groupConnections": []
}"#;

struct Workspace {
    dir: TempDir,
    file: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        Self::with(TOPOLOGY)
    }

    fn with(topology: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("topology.json");
        std::fs::write(&file, topology).unwrap();
        Self { dir, file }
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = nettopo_cmd(self.dir.path());
        cmd.arg("--file").arg(&self.file);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(["-o", "json"]).args(args).output().unwrap();
        assert!(output.status.success(), "{output:?}");
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn saved(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(&self.file).unwrap()).unwrap()
    }
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = nettopo_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("nodes")
            .and(predicate::str::contains("arrange"))
            .and(predicate::str::contains("replay")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nettopo"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_without_source_is_usage_error() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path())
        .args(["nodes", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No topology source"));
}

#[test]
fn test_unknown_profile_lists_alternatives() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path())
        .args(["--profile", "lab", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Profile 'lab' not found"));
}

// ── Offline topology files ──────────────────────────────────────────

#[test]
fn test_nodes_list_filters_by_group() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["-o", "plain", "nodes", "list", "--group", "g1"])
        .assert()
        .success()
        .stdout("r1\ns1\n");
}

#[test]
fn test_missing_node_exits_not_found() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["nodes", "get", "nope"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nodes list"));
}

#[test]
fn test_create_writes_file_back() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["nodes", "create", "--name", "Camera", "--type", "camera", "-g", "g1"])
        .assert()
        .success();

    let saved = ws.saved();
    let nodes = saved["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    let camera = nodes.iter().find(|n| n["name"] == "Camera").unwrap();
    assert_eq!(camera["type"], "CAMERA");
    assert_eq!(camera["groupId"], "g1");
}

#[test]
fn test_read_only_command_leaves_file_untouched() {
    let ws = Workspace::new();
    ws.cmd().arg("status").assert().success();
    assert_eq!(std::fs::read_to_string(&ws.file).unwrap(), TOPOLOGY);
}

#[test]
fn test_status_reports_active_uplink() {
    let ws = Workspace::new();
    let status = ws.json(&["status"]);
    assert_eq!(status["nodeCount"], 3);
    assert_eq!(status["activeSources"][0][0], "r1");
    assert_eq!(status["activeSources"][0][1], "c1");
}

#[test]
fn test_list_active_skips_flagged_lan_link() {
    let flagged_lan = TOPOLOGY.replace(
        r#""targetNodeId": "s1" }"#,
        r#""targetNodeId": "s1", "isActiveSource": true }"#,
    );
    let ws = Workspace::with(&flagged_lan);
    ws.cmd()
        .args(["-o", "plain", "connections", "list", "--active"])
        .assert()
        .success()
        .stdout("c1\n");
}

#[test]
fn test_activate_rejects_non_internet_source() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["connections", "activate", "c2"])
        .assert()
        .code(2);
}

#[test]
fn test_delete_node_cascades_connections() {
    let ws = Workspace::new();
    ws.cmd().args(["nodes", "delete", "r1"]).assert().success();

    let saved = ws.saved();
    assert_eq!(saved["nodes"].as_array().unwrap().len(), 2);
    assert!(saved["connections"].as_array().unwrap().is_empty());
}

#[test]
fn test_arrange_dry_run_does_not_save() {
    let ws = Workspace::new();
    let report = ws.json(&["arrange", "--dry-run"]);
    assert_eq!(report["dryRun"], true);
    assert!(report["arrangement"]["nodes"]["s1"].is_object());
    assert_eq!(std::fs::read_to_string(&ws.file).unwrap(), TOPOLOGY);
}

#[test]
fn test_arrange_places_child_below_parent() {
    let ws = Workspace::new();
    ws.cmd().arg("arrange").assert().success();

    let saved = ws.saved();
    let y = |id: &str| {
        saved["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["id"] == id)
            .unwrap()["positionY"]
            .as_f64()
            .unwrap()
    };
    assert!(y("s1") > y("r1"));
}

#[test]
fn test_replay_applies_events_and_saves_on_request() {
    let ws = Workspace::new();
    let events = ws.dir.path().join("events.jsonl");
    std::fs::write(
        &events,
        concat!(
            r#"{"type":"NODE_STATUS_UPDATE","payload":{"nodeId":"r1","status":"OFFLINE"}}"#,
            "\n",
            r#"{"type":"PING"}"#,
            "\n",
            "not json\n",
            r#"{"type":"SOMETHING_NEW","payload":{}}"#,
            "\n",
        ),
    )
    .unwrap();

    let report = ws.json(&["replay", events.to_str().unwrap()]);
    assert_eq!(report["received"], 4);
    assert_eq!(report["changed"], 1);
    assert_eq!(report["malformed"], 1);
    assert_eq!(std::fs::read_to_string(&ws.file).unwrap(), TOPOLOGY);

    ws.cmd()
        .args(["replay", "--save"])
        .arg(&events)
        .assert()
        .success();
    ws.cmd()
        .args(["-o", "plain", "nodes", "list", "--status", "offline"])
        .assert()
        .success()
        .stdout("r1\n");
}

#[test]
fn test_missing_file_starts_empty_topology() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("new.json");
    nettopo_cmd(home.path())
        .arg("--file")
        .arg(&file)
        .args(["groups", "create", "--name", "Lab"])
        .assert()
        .success();
    assert!(std::fs::read_to_string(&file).unwrap().contains("\"Lab\""));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_then_profiles() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path())
        .args(["config", "init", "--server", "http://localhost:3000", "--name", "lab"])
        .assert()
        .success();
    nettopo_cmd(home.path())
        .args(["-o", "plain", "config", "profiles"])
        .assert()
        .success()
        .stdout("lab\n");
}

#[test]
fn test_config_init_rejects_bad_url() {
    let home = TempDir::new().unwrap();
    nettopo_cmd(home.path())
        .args(["config", "init", "--server", "not a url"])
        .assert()
        .code(2);
}
