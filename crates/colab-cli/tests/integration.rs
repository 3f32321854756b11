#![allow(deprecated)]
use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `colab` with every variable that could leak in from the developer's shell removed.
fn colab(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("colab").unwrap();
    cmd.current_dir(dir.path());
    for var in [
        "COLAB_HOME",
        "COLAB_BOT",
        "COLAB_PROJECT",
        "COLAB_URL",
        "COLAB_ANON_KEY",
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
        "CLAUDE_COLAB_KEY",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn home(dir: &TempDir) -> PathBuf {
    dir.path().join("claude")
}

fn install(dir: &TempDir, bot: &str, key: &str) {
    colab(dir)
        .arg("install")
        .arg("--path")
        .arg(home(dir))
        .args(["--api-key", key, "--bot-name", bot])
        .assert()
        .success();
}

fn add_bot(dir: &TempDir, bot: &str, key: &str) -> assert_cmd::assert::Assert {
    colab(dir)
        .args(["install", "--add-bot", "--path"])
        .arg(home(dir))
        .args(["--api-key", key, "--bot-name", bot])
        .assert()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn bot_dirs(home: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(home)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().join("config.json").exists())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// colab install
// ---------------------------------------------------------------------------

#[test]
fn install_creates_layout() {
    let dir = TempDir::new().unwrap();
    colab(&dir)
        .arg("install")
        .arg("--path")
        .arg(home(&dir))
        .args(["--api-key", "cc_black_key_123456", "--bot-name", "black"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INSTALLATION COMPLETE!"))
        .stdout(predicate::str::contains("Saved API key for BLACK"));

    let h = home(&dir);
    assert!(h.join("vault/notes").is_dir());
    assert!(h.join("vault/START HERE.md").exists());
    assert!(h.join("vault/About Me.md").exists());
    assert!(h.join("shared").is_dir());
    assert!(h.join("keystore.json").exists());
    for file in ["config.json", "ACTIVE_WORK.md", "startup.bat", "startup.sh", "SOP.md"] {
        assert!(h.join("BLACK").join(file).exists(), "missing BLACK/{file}");
    }

    let config: serde_json::Value = serde_json::from_str(&read(&h.join("BLACK/config.json"))).unwrap();
    assert_eq!(config["name"], "BLACK");
    assert_eq!(config["api_key_ref"], "keystore:BLACK");
    assert_eq!(config["role"], "worker");
    assert_eq!(config["settings"]["heartbeat_interval"], 60);
    assert!(!read(&h.join("BLACK/config.json")).contains("cc_black_key_123456"));
}

#[test]
fn install_answers_prompts_from_stdin() {
    let dir = TempDir::new().unwrap();
    let input = format!("{}\ncc_key_one\nworker one\nn\n", home(&dir).display());
    colab(&dir)
        .arg("install")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Install location"));

    assert_eq!(bot_dirs(&home(&dir)), vec!["WORKER_ONE"]);
}

#[test]
fn install_writes_service_config() {
    let dir = TempDir::new().unwrap();
    colab(&dir)
        .arg("install")
        .arg("--path")
        .arg(home(&dir))
        .args(["--api-key", "cc_k", "--bot-name", "bot1"])
        .args(["--service-url", "https://colab.example/", "--anon-key", "anon-123"])
        .assert()
        .success();

    let service: serde_json::Value =
        serde_json::from_str(&read(&home(&dir).join("shared/service.json"))).unwrap();
    assert_eq!(service["url"], "https://colab.example");
    assert_eq!(service["anon_key"], "anon-123");
}

#[test]
fn install_warns_on_unexpected_key_prefix() {
    let dir = TempDir::new().unwrap();
    colab(&dir)
        .arg("install")
        .arg("--path")
        .arg(home(&dir))
        .args(["--api-key", "sk-not-colab", "--bot-name", "bot1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning: API key should start with 'cc_'"));
}

#[test]
fn install_requires_api_key() {
    let dir = TempDir::new().unwrap();
    colab(&dir)
        .arg("install")
        .arg("--path")
        .arg(home(&dir))
        .args(["--bot-name", "bot1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is required"));
}

#[test]
fn install_rejects_unsafe_bot_name() {
    let dir = TempDir::new().unwrap();
    colab(&dir)
        .arg("install")
        .arg("--path")
        .arg(home(&dir))
        .args(["--api-key", "cc_k", "--bot-name", "../escape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid bot name"));
    assert!(!dir.path().join("ESCAPE").exists());
}

#[test]
fn reinstall_keeps_bot_state_and_updates_key() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_old_key");
    let work = home(&dir).join("BLACK/ACTIVE_WORK.md");
    std::fs::write(&work, "# BLACK - Active Work\n\nRefactoring the parser\n").unwrap();

    install(&dir, "BLACK", "cc_new_key");

    assert!(read(&work).contains("Refactoring the parser"));
    colab(&dir)
        .args(["keys", "get", "black", "--reveal", "--home"])
        .arg(home(&dir))
        .assert()
        .success()
        .stdout("cc_new_key\n");
}

// ---------------------------------------------------------------------------
// colab install --add-bot
// ---------------------------------------------------------------------------

#[test]
fn add_bot_twice_yields_two_more_bots() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    let h = home(&dir);

    let before: Vec<(String, Vec<u8>)> = ["config.json", "ACTIVE_WORK.md", "startup.sh", "startup.bat", "SOP.md"]
        .iter()
        .map(|f| (f.to_string(), std::fs::read(h.join("BLACK").join(f)).unwrap()))
        .collect();

    add_bot(&dir, "intolerant", "cc_intolerant").success();
    assert_eq!(bot_dirs(&h), vec!["BLACK", "INTOLERANT"]);
    add_bot(&dir, "ollama", "cc_ollama")
        .success()
        .stdout(predicate::str::contains("Bot OLLAMA added successfully!"));
    assert_eq!(bot_dirs(&h), vec!["BLACK", "INTOLERANT", "OLLAMA"]);

    for (file, bytes) in before {
        assert_eq!(
            std::fs::read(h.join("BLACK").join(&file)).unwrap(),
            bytes,
            "BLACK/{file} changed"
        );
    }

    let store: serde_json::Value = serde_json::from_str(&read(&h.join("keystore.json"))).unwrap();
    assert_eq!(store["BLACK"], "cc_black");
    assert_eq!(store["INTOLERANT"], "cc_intolerant");
    assert_eq!(store["OLLAMA"], "cc_ollama");
}

#[test]
fn add_bot_refuses_existing_bot() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    add_bot(&dir, "black", "cc_other")
        .failure()
        .stderr(predicate::str::contains("bot already exists: BLACK"));

    colab(&dir)
        .args(["keys", "get", "BLACK", "--reveal", "--home"])
        .arg(home(&dir))
        .assert()
        .stdout("cc_black\n");
}

#[test]
fn add_bot_needs_existing_install() {
    let dir = TempDir::new().unwrap();
    add_bot(&dir, "bot1", "cc_k")
        .failure()
        .stderr(predicate::str::contains("no installation at"));
    assert!(!home(&dir).exists());
}

// ---------------------------------------------------------------------------
// Generated scripts
// ---------------------------------------------------------------------------

#[test]
fn startup_scripts_reference_bot_and_path() {
    let dir = TempDir::new().unwrap();
    install(&dir, "worker1", "cc_w1");
    let h = home(&dir);

    let sh = read(&h.join("WORKER1/startup.sh"));
    assert!(sh.starts_with("#!/bin/sh"));
    let expected = format!("colab run --name WORKER1 --home '{}'", h.display());
    assert!(sh.contains(&expected), "startup.sh: {sh}");
    assert!(sh.contains("WORKER1 - Claude Colab Bot"));

    let bat = read(&h.join("WORKER1/startup.bat"));
    let expected = format!("colab run --name WORKER1 --home \"{}\"", h.display());
    assert!(bat.contains(&expected), "startup.bat: {bat}");

    let sop = read(&h.join("WORKER1/SOP.md"));
    assert!(sop.contains("ConnectOptions::named(\"WORKER1\")"));
}

#[cfg(unix)]
#[test]
fn generated_file_modes() {
    use std::os::unix::fs::PermissionsExt;
    let dir = TempDir::new().unwrap();
    install(&dir, "BOT1", "cc_k");
    let mode = |p: PathBuf| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(home(&dir).join("BOT1/startup.sh")), 0o755);
    assert_eq!(mode(home(&dir).join("keystore.json")), 0o600);
}

// ---------------------------------------------------------------------------
// colab keys
// ---------------------------------------------------------------------------

#[test]
fn keystore_round_trips_install_key() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black_key_123456");

    colab(&dir)
        .args(["keys", "list", "--home"])
        .arg(home(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("BLACK"))
        .stdout(predicate::str::contains("cc_b...3456"))
        .stdout(predicate::str::contains("cc_black_key_123456").not());

    colab(&dir)
        .args(["keys", "get", "BLACK", "--reveal"])
        .env("COLAB_HOME", home(&dir))
        .assert()
        .success()
        .stdout("cc_black_key_123456\n");
}

#[test]
fn keys_set_and_remove() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    let h = home(&dir);

    colab(&dir)
        .args(["keys", "set", "ollama", "cc_ollama", "--home"])
        .arg(&h)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored key for OLLAMA"));
    colab(&dir)
        .args(["keys", "remove", "OLLAMA", "--home"])
        .arg(&h)
        .assert()
        .success();
    colab(&dir)
        .args(["keys", "get", "OLLAMA", "--home"])
        .arg(&h)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no key stored for OLLAMA"));
}

// ---------------------------------------------------------------------------
// colab bot
// ---------------------------------------------------------------------------

#[test]
fn bot_list_shows_installed_bots() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    add_bot(&dir, "ollama", "cc_ollama").success();

    colab(&dir)
        .args(["bot", "list", "--json", "--home"])
        .arg(home(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"BLACK\""))
        .stdout(predicate::str::contains("\"OLLAMA\""));
}

#[test]
fn bot_settings_respect_hierarchy() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    colab(&dir)
        .args(["install", "--add-bot", "--role", "grunt", "--path"])
        .arg(home(&dir))
        .args(["--api-key", "cc_ollama", "--bot-name", "ollama"])
        .assert()
        .success();
    let h = home(&dir);

    colab(&dir)
        .args(["bot", "set", "OLLAMA", "max_tokens=200", "--manager", "BLACK", "--home"])
        .arg(&h)
        .assert()
        .success();
    colab(&dir)
        .args(["bot", "set", "BLACK", "mode=lazy", "--manager", "OLLAMA", "--home"])
        .arg(&h)
        .assert()
        .failure()
        .stderr(predicate::str::contains("access denied"));

    let settings: serde_json::Value =
        serde_json::from_str(&read(&h.join("OLLAMA/settings.json"))).unwrap();
    assert_eq!(settings["max_tokens"], 200);
    assert!(!h.join("BLACK/settings.json").exists());
}

// ---------------------------------------------------------------------------
// Remote commands without a service
// ---------------------------------------------------------------------------

#[test]
fn remote_commands_need_service_config() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    colab(&dir)
        .args(["status", "--name", "BLACK", "--home"])
        .arg(home(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("service not configured"));
}

#[test]
fn run_needs_a_bot_name() {
    let dir = TempDir::new().unwrap();
    install(&dir, "BLACK", "cc_black");
    colab(&dir)
        .args(["run", "--once", "--home"])
        .arg(home(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no bot selected"));
}

// ---------------------------------------------------------------------------
// colab run against a service
// ---------------------------------------------------------------------------

#[test]
fn run_once_connects_with_installed_key() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    colab(&dir)
        .arg("install")
        .arg("--path")
        .arg(home(&dir))
        .args(["--api-key", "cc_installed_key_42", "--bot-name", "bot1"])
        .args(["--service-url", server.url().as_str(), "--anon-key", "anon-test"])
        .assert()
        .success();

    let validate = server
        .mock("POST", "/rest/v1/rpc/validate_api_key")
        .match_header("apikey", "anon-test")
        .match_body(Matcher::Json(serde_json::json!({ "p_key": "cc_installed_key_42" })))
        .with_status(200)
        .with_body(r#"[{"team_id": 7, "user_id": "u-1", "claude_name": "BOT1"}]"#)
        .create();
    let beat = server
        .mock("POST", "/rest/v1/rpc/heartbeat")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "p_api_key": "cc_installed_key_42",
            "p_project": "claude-colab",
        })))
        .with_status(200)
        .with_body("true")
        .create();
    let _chat = server
        .mock("POST", "/rest/v1/rpc/get_chat")
        .with_status(200)
        .with_body(r#"[{"id": 5, "author": "BLACK", "message": "@BOT1 can you review?"}]"#)
        .create();
    let _tasks = server
        .mock("GET", "/rest/v1/shared_tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    let output = colab(&dir)
        .env_remove("CLAUDE_COLAB_KEY_BOT1")
        .args(["run", "--once", "--json", "--name", "bot1", "--home"])
        .arg(home(&dir))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let resp: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resp["ok"], true);
    assert_eq!(resp["has_work"], true);
    assert_eq!(resp["mentions"], 1);
    validate.assert();
    beat.assert();
}
