//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interference between tests.

use redakt::anonymization::models::EntityType;
use redakt::anonymization::policy::{Mode, StoragePolicy};
use redakt::config::{load_config, load_config_or_default};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "REDAKT_APPLICATION_LOG_LEVEL",
        "REDAKT_APPLICATION_DRY_RUN",
        "REDAKT_ANONYMIZATION_MODE",
        "REDAKT_BATCH_MAX_PARALLEL",
        "REDAKT_OUTPUT_DIRECTORY",
        "REDAKT_AUDIT_ENABLED",
        "TEST_REDAKT_OUTPUT_DIR",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"
dry_run = true

[anonymization]
mode = "production"

[anonymization.storage_policy]
BANK = "redacted"
EMAIL = "partial"

[anonymization.first_name_heuristic]
enabled = false
threshold = 0.9

[anonymization.audit]
enabled = false

[output]
directory = "/tmp/redakt-out"
anon_suffix = ".anon"
map_suffix = ".map"
text_map = false
overwrite = true

[batch]
max_parallel = 16
shutdown_timeout_secs = 5

[logging]
local_enabled = false
local_path = "/tmp/redakt-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert_eq!(config.anonymization.mode, Mode::Production);
    assert_eq!(
        config.anonymization.storage_policy.get(&EntityType::Bank),
        Some(&StoragePolicy::Redacted)
    );
    assert_eq!(
        config.anonymization.storage_policy.get(&EntityType::Email),
        Some(&StoragePolicy::Partial)
    );
    assert!(!config.anonymization.first_name_heuristic.enabled);
    assert_eq!(config.output.directory, Some(PathBuf::from("/tmp/redakt-out")));
    assert_eq!(config.output.anon_suffix, ".anon");
    assert!(!config.output.text_map);
    assert_eq!(config.batch.max_parallel, 16);
    assert_eq!(config.batch.shutdown_timeout_secs, 5);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[anonymization.audit]
enabled = false
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.anonymization.mode, Mode::Test);
    assert!(config.anonymization.dictionary.is_none());
    assert!(config.anonymization.storage_policy.is_empty());
    assert!(config.output.directory.is_none());
    assert_eq!(config.output.anon_suffix, "_anon");
    assert_eq!(config.output.map_suffix, "_map");
    assert_eq!(config.batch.max_parallel, 4);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_REDAKT_OUTPUT_DIR", "/srv/redacted");

    let file = write_config(
        r#"
[anonymization.audit]
enabled = false

[output]
directory = "${TEST_REDAKT_OUTPUT_DIR}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.output.directory, Some(PathBuf::from("/srv/redacted")));

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[output]
directory = "${TEST_REDAKT_OUTPUT_DIR}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("TEST_REDAKT_OUTPUT_DIR"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("REDAKT_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("REDAKT_ANONYMIZATION_MODE", "production");
    std::env::set_var("REDAKT_BATCH_MAX_PARALLEL", "12");
    std::env::set_var("REDAKT_AUDIT_ENABLED", "false");

    let file = write_config(
        r#"
[application]
log_level = "info"

[anonymization]
mode = "test"

[batch]
max_parallel = 2
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.anonymization.mode, Mode::Production);
    assert_eq!(config.batch.max_parallel, 12);
    assert!(!config.anonymization.audit.enabled);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_value() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("REDAKT_BATCH_MAX_PARALLEL", "many");
    std::env::set_var("REDAKT_AUDIT_ENABLED", "false");

    let result = load_config_or_default(Some(Path::new("/nonexistent/redakt.toml")));
    assert!(result.is_err());

    let file = write_config("");
    let err = load_config(file.path()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        "[anonymization.audit]\nenabled = false\n[batch]\nmax_parallel = 0\n",
        "[anonymization.audit]\nenabled = false\n[application]\nlog_level = \"loud\"\n",
        "[anonymization.audit]\nenabled = false\n[logging]\nlocal_rotation = \"weekly\"\n",
        "[anonymization]\nmode = \"production\"\n[anonymization.audit]\nenabled = false\n[anonymization.storage_policy]\nCARD = \"full\"\n",
        "[anonymization]\npattern_library = \"/nonexistent/rules.toml\"\n[anonymization.audit]\nenabled = false\n",
    ];

    for content in cases {
        let file = write_config(content);
        let err = load_config(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2, "expected configuration error for:\n{content}");
    }
}

#[test]
fn test_unknown_mode_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[anonymization]\nmode = \"strict\"\n");
    assert!(load_config(file.path()).is_err());
}
