//! Key-value persistence of whole project documents.

pub mod debounce;
pub mod json_backend;

use crate::{errors::ApuError, project::Project};

pub type Result<T> = std::result::Result<T, ApuError>;

/// Opaque document store: one project per key.
pub trait ProjectStore {
    fn save(&self, key: &str, project: &Project) -> Result<()>;
    fn load(&self, key: &str) -> Result<Project>;
    fn exists(&self, key: &str) -> bool;
    /// Keys of every stored project, sorted.
    fn list(&self) -> Result<Vec<String>>;
    /// Backup file names for `key`, newest first.
    fn list_backups(&self, key: &str) -> Result<Vec<String>>;
}

pub use debounce::{SaveOutcome, SaveScheduler, DEFAULT_DEBOUNCE};
pub use json_backend::{canonical_key, JsonStore, DEFAULT_RETENTION};
