use std::path::PathBuf;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "rag_data";

/// File name of the example database inside the data directory.
pub const DB_FILE: &str = "examples.db";

/// On-disk layout of the service's persisted state.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
    pub db: PathBuf,
}

impl DataPaths {
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            db: root.join(DB_FILE),
            root,
        }
    }

    /// Create the data directory if it does not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}
