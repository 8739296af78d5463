use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn voicecast_cmd() -> Command {
    cargo_bin_cmd!("voicecast").into()
}

// ============================================================================
// CLI Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    voicecast_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("voicecast"))
        .stdout(predicate::str::contains("multi-speaker scripts"));
}

#[test]
fn test_version_displays() {
    voicecast_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("voicecast"));
}

#[test]
fn test_help_shows_subcommands() {
    voicecast_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("voices"))
        .stdout(predicate::str::contains("clone"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("usage"))
        .stdout(predicate::str::contains("config"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_show_with_defaults() {
    let temp_dir = TempDir::new().unwrap();

    voicecast_cmd()
        .args(["config", "show"])
        .env("HOME", temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("eleven_multilingual_v2"))
        .stdout(predicate::str::contains("max_generations = 5"))
        .stdout(predicate::str::contains("max_voices = 1"));
}

#[test]
fn test_config_set_model_persists() {
    let temp_dir = TempDir::new().unwrap();

    voicecast_cmd()
        .args(["config", "set-model", "eleven_turbo_v2"])
        .env("HOME", temp_dir.path())
        .assert()
        .success();

    voicecast_cmd()
        .args(["config", "show"])
        .env("HOME", temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("eleven_turbo_v2"));
}

// ============================================================================
// Generate Command Tests
// ============================================================================

#[test]
fn test_generate_requires_api_key() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("script.toml");
    fs::write(&script, "[[segment]]\ntext = \"hi\"\nvoice_id = \"v1\"\n").unwrap();

    voicecast_cmd()
        .arg("generate")
        .arg(&script)
        .env("HOME", temp_dir.path())
        .env_remove("ELEVENLABS_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ELEVENLABS_API_KEY"));
}

#[test]
fn test_generate_missing_script_file() {
    let temp_dir = TempDir::new().unwrap();

    voicecast_cmd()
        .args(["generate", "does-not-exist.toml"])
        .env("HOME", temp_dir.path())
        .env("ELEVENLABS_API_KEY", "test-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_generate_rejects_empty_script() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("empty.toml");
    fs::write(&script, "").unwrap();

    voicecast_cmd()
        .arg("generate")
        .arg(&script)
        .env("HOME", temp_dir.path())
        .env("ELEVENLABS_API_KEY", "test-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no segments"));
}

#[test]
fn test_generate_merge_and_zip_conflict() {
    let temp_dir = TempDir::new().unwrap();

    voicecast_cmd()
        .args(["generate", "script.toml", "--merge", "--zip"])
        .env("HOME", temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Usage Command Tests
// ============================================================================

#[test]
fn test_usage_with_in_process_store() {
    let temp_dir = TempDir::new().unwrap();

    // Without a configured store the counters start at zero.
    voicecast_cmd()
        .arg("usage")
        .env("HOME", temp_dir.path())
        .env("ELEVENLABS_API_KEY", "test-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("Voices:      0 / 1"))
        .stdout(predicate::str::contains("Generations: 0 / 5"));
}
