// linetrack_core/src/store.rs
use std::path::{Path, PathBuf};

use crate::domain::ProgressTable;
use crate::error::Result;
use crate::policy::LoadPolicy;
use crate::schema::{DEFAULT_DATA_FILE, Schema};

#[derive(Clone, Debug)]
pub struct StoreParams {
    pub path: PathBuf,
    pub policy: LoadPolicy,
}

impl Default for StoreParams {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_FILE),
            policy: LoadPolicy::default(),
        }
    }
}

pub trait ProgressStore: Send + Sync {
    fn location(&self) -> &Path;

    fn exists(&self) -> bool;

    /// Replace the persisted table in full.
    fn save(&self, table: &ProgressTable, schema: &Schema) -> Result<()>;

    /// Callers check [`ProgressStore::exists`] first; a missing file is an I/O error here.
    fn load(&self, schema: &Schema) -> Result<ProgressTable>;
}
