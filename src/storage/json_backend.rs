use chrono::{DateTime, NaiveDateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::{
    errors::ApuError,
    project::Project,
    utils::{ensure_dir, write_atomic},
};

use super::{ProjectStore, Result};

const DOCUMENT_EXTENSION: &str = "json";
const BACKUP_DIR: &str = "backups";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
pub const DEFAULT_RETENTION: usize = 5;

/// Stores each project as `<root>/<key>.json`. The file being replaced is
/// first copied to `<root>/backups/<key>/<key>_<timestamp>.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        let backups_dir = root.join(BACKUP_DIR);
        Ok(Self {
            root,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_key(key), DOCUMENT_EXTENSION))
    }

    fn backup_dir(&self, key: &str) -> PathBuf {
        self.backups_dir.join(canonical_key(key))
    }

    pub fn backup_path(&self, key: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(key).join(backup_name)
    }

    fn backup_existing_file(&self, key: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(key);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup_name = format!(
            "{}_{}.{}",
            canonical_key(key),
            timestamp,
            DOCUMENT_EXTENSION
        );
        fs::copy(path, dir.join(&backup_name))?;
        debug!(key, backup = %backup_name, "previous document backed up");
        self.prune_backups(key)
    }

    fn prune_backups(&self, key: &str) -> Result<()> {
        let backups = self.list_backups(key)?;
        for name in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backup_path(key, name)) {
                warn!(key, backup = %name, error = %err, "could not prune backup");
            }
        }
        Ok(())
    }

    /// Replaces the live document with a backup and returns the restored
    /// project.
    pub fn restore(&self, key: &str, backup_name: &str) -> Result<Project> {
        let source = self.backup_path(key, backup_name);
        if !source.exists() {
            return Err(ApuError::Storage(format!(
                "backup `{backup_name}` not found"
            )));
        }
        fs::copy(&source, self.document_path(key))?;
        self.load(key)
    }
}

impl ProjectStore for JsonStore {
    fn save(&self, key: &str, project: &Project) -> Result<()> {
        let path = self.document_path(key);
        self.backup_existing_file(key, &path)?;
        let json = serde_json::to_string_pretty(project)?;
        write_atomic(&path, &json)?;
        debug!(key, "project saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Project> {
        let path = self.document_path(key);
        if !path.exists() {
            return Err(ApuError::Storage(format!(
                "project `{}` not found",
                canonical_key(key)
            )));
        }
        load_project_from_path(&path)
    }

    fn exists(&self, key: &str) -> bool {
        self.document_path(key).exists()
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn list_backups(&self, key: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(key);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }
}

/// Reads a project document and repairs broken references in it. Each repair
/// is logged as a warning.
pub fn load_project_from_path(path: &Path) -> Result<Project> {
    let data = fs::read_to_string(path)?;
    let mut project: Project = serde_json::from_str(&data)?;
    for fix in project.repair() {
        warn!(path = %path.display(), "{fix}");
    }
    Ok(project)
}

pub fn save_project_to_path(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Lowercase ASCII file stem for a key; anything else becomes `_`.
pub fn canonical_key(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "project".into()
    } else {
        sanitized
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(".json")?;
    let mut parts = stem.rsplitn(3, '_');
    let time_part = parts.next()?;
    let date_part = parts.next()?;
    if !is_digits(date_part, 8) || !is_digits(time_part, 4) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date_part}{time_part}"), "%Y%m%d%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
