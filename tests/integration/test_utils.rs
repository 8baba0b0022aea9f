//! Shared test utilities for integration tests
//!
//! Tests that read configuration or the environment run inside
//! [`with_isolated_env`], which points the global config directory at a temp
//! dir and restores every touched variable afterwards.

use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment access across all tests in this binary
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Variables a test may read or set
const TRACKED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "FOLIO_ENV",
    "FOLIO_TOKEN",
    "FOLIO__AUTH__SECRET",
    "FOLIO__AUTH__TOKEN_TTL_SECS",
    "FOLIO__STORAGE__ROOT",
];

struct EnvState {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            saved: TRACKED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME inside `test_dir`, every other
/// tracked variable cleared, then `vars` applied
///
/// The global config file for the test lives at `{test_dir}/xdg/folio/config.toml`.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let home = test_dir.path().join("home");
    let xdg = test_dir.path().join("xdg");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&xdg).unwrap();

    for name in TRACKED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &xdg);
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    env_state.restore();

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
