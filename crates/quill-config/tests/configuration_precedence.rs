//! Layering of defaults, configuration files, environment and CLI flags.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use quill_config::{Config, LogFormat};
use rstest::{fixture, rstest};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const OVERRIDDEN_KEYS: [&str; 3] = [
    "QUILL_MAX_SUGGESTION_COUNT",
    "QUILL_CLIPBOARD_TIMEOUT_SECS",
    "QUILL_CONFIG_PATH",
];

/// Serialises environment access and restores every touched variable.
struct Harness {
    temp_dir: TempDir,
    previous: Vec<(&'static str, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = OVERRIDDEN_KEYS
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect();
        for key in OVERRIDDEN_KEYS {
            // Environment mutation is `unsafe` on edition 2024; the mutex
            // keeps the tests in this binary from racing.
            unsafe { std::env::remove_var(key) };
        }
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            previous,
            _guard: guard,
        }
    }

    fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join("quill.toml");
        fs::write(&path, contents).expect("write config file");
        path
    }

    fn set_env(&self, key: &str, value: impl AsRef<OsStr>) {
        unsafe { std::env::set_var(key, value) };
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            match value {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn args(extra: &[&OsStr]) -> Vec<OsString> {
    std::iter::once(OsString::from("quill-host"))
        .chain(extra.iter().map(|arg| (*arg).to_owned()))
        .collect()
}

#[rstest]
fn loads_defaults_without_sources(harness: Harness) {
    let config = Config::load_from_iter(args(&[])).expect("load defaults");
    drop(harness);
    assert_eq!(config, Config::default());
}

#[rstest]
fn file_values_override_defaults(harness: Harness) {
    let path = harness.write_config(
        "max_suggestion_count = 5\nlog_filter = \"debug\"\nlog_format = \"compact\"\n",
    );
    let config = Config::load_from_iter(args(&[
        OsStr::new("--config-path"),
        path.as_os_str(),
    ]))
    .expect("load file config");

    assert_eq!(config.max_suggestion_count, 5);
    assert_eq!(config.log_filter(), "debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.clipboard_timeout_secs, 60);
}

#[rstest]
fn environment_overrides_file(harness: Harness) {
    let path = harness.write_config("max_suggestion_count = 5\nclipboard_timeout_secs = 30\n");
    harness.set_env("QUILL_CONFIG_PATH", path.as_os_str());
    harness.set_env("QUILL_MAX_SUGGESTION_COUNT", "6");

    let config = Config::load_from_iter(args(&[])).expect("load env config");

    assert_eq!(config.max_suggestion_count, 6);
    assert_eq!(config.clipboard_timeout_secs, 30);
}

#[rstest]
fn cli_overrides_environment(harness: Harness) {
    harness.set_env("QUILL_MAX_SUGGESTION_COUNT", "6");
    harness.set_env("QUILL_CLIPBOARD_TIMEOUT_SECS", "15");

    let config = Config::load_from_iter(args(&[
        OsStr::new("--max-suggestion-count"),
        OsStr::new("7"),
    ]))
    .expect("load cli config");

    assert_eq!(config.max_suggestion_count, 7);
    assert_eq!(config.clipboard_timeout_secs, 15);
}

#[rstest]
fn malformed_files_fail_to_load(harness: Harness) {
    let path = harness.write_config("max_suggestion_count = \"many\"\n");
    let result = Config::load_from_iter(args(&[
        OsStr::new("--config-path"),
        path.as_os_str(),
    ]));
    assert!(result.is_err());
}
