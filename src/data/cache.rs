use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::load_file;
use super::model::Dataset;
use crate::error::DataFormatError;

/// Identity of a source file as seen by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceStamp {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

impl SourceStamp {
    fn of(path: &Path) -> Result<Self, DataFormatError> {
        let io_err = |source| DataFormatError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_err)?;
        let meta = std::fs::metadata(&canonical).map_err(io_err)?;
        Ok(SourceStamp {
            path: canonical,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Load-once memoisation of the constraint table, keyed on the source file's
/// path, modification time and size.
///
/// The loader itself is pure; this cache belongs to the application.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(SourceStamp, Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset while the file is unchanged, reload otherwise.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>, DataFormatError> {
        let stamp = SourceStamp::of(path)?;
        if let Some((cached, dataset)) = &self.entry {
            if *cached == stamp {
                log::debug!("Reusing cached table for {}", path.display());
                return Ok(Arc::clone(dataset));
            }
        }

        let dataset = Arc::new(load_file(&stamp.path)?);
        self.entry = Some((stamp, Arc::clone(&dataset)));
        Ok(dataset)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
