#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{NaiveDate, TimeZone, Utc};
use finanzas_core::{
    config::ConfigManager,
    storage::JsonFileStore,
    utils::{Clock, FixedClock},
    SessionAuthority,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique base directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn fixed_clock() -> Box<dyn Clock> {
    Box::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
    ))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Opens a session authority over the JSON store configured under `base`.
pub fn authority_at(base: &Path) -> SessionAuthority {
    let config = ConfigManager::with_base_dir(base.to_path_buf())
        .expect("create config manager for temp dir")
        .load()
        .expect("load default config");
    let store = JsonFileStore::from_config(&config).expect("create json store");
    SessionAuthority::with_clock(Box::new(store), fixed_clock())
}

/// Creates an isolated authority backed by a fresh directory.
pub fn setup_test_env() -> (SessionAuthority, PathBuf) {
    let base = temp_base();
    (authority_at(&base), base)
}
