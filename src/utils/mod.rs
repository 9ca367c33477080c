pub mod build_info;

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Once,
};

use dirs::home_dir;

const DEFAULT_DIR_NAME: &str = ".apu_core";
const PROJECTS_DIR: &str = "projects";
const CONFIG_FILE: &str = "config.json";

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber. `RUST_LOG` directives are
/// honoured on top of the `apu_core=info` default.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "apu_core=info".parse() {
            filter = filter.add_directive(directive);
        }
        // A host may already own the global subscriber.
        let _ = fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
    });
}

/// Application data directory, `~/.apu_core` unless `APU_CORE_HOME` is set.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("APU_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn projects_dir_in(base: &Path) -> PathBuf {
    base.join(PROJECTS_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn projects_dir() -> PathBuf {
    projects_dir_in(&app_data_dir())
}

pub fn config_file() -> PathBuf {
    config_file_in(&app_data_dir())
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Sibling path used while a file is being replaced: `a.json` → `a.json.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.tmp"),
        None => "tmp".to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` to a temporary sibling and renames it over `path`, so a
/// reader never sees a half-written file.
pub fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}
