// library.json persistence
// Loads the indexed tree from disk when it exists, rebuilding it from the
// filesystem otherwise. A loaded document is returned as-is: staleness
// against the live filesystem is accepted until the user asks for a rebuild.

use super::{indexer, LibraryNode};
use crate::error::PersistenceError;
use crate::state;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct LibraryStore {
    doc_path: PathBuf,
    library_root: PathBuf,
}

impl LibraryStore {
    pub fn new(doc_path: PathBuf, library_root: PathBuf) -> Self {
        Self {
            doc_path,
            library_root,
        }
    }

    /// Load the library tree, rebuilding from the filesystem when the
    /// document is missing or `force_rebuild` is set. A corrupt document is
    /// an error for the caller; it is never silently rebuilt over.
    pub fn load(&self, force_rebuild: bool) -> Result<LibraryNode, PersistenceError> {
        if !force_rebuild {
            if let Some(tree) = state::read_document(&self.doc_path)? {
                debug!("loaded library index from {}", self.doc_path.display());
                return Ok(tree);
            }
        }

        self.rebuild()
    }

    /// Re-index the library root and overwrite the persisted document.
    pub fn rebuild(&self) -> Result<LibraryNode, PersistenceError> {
        info!("indexing {}", self.library_root.display());

        let tree = indexer::scan(&self.library_root).map_err(|err| PersistenceError::Io {
            path: self.library_root.clone(),
            source: err,
        })?;

        state::write_document(&self.doc_path, &tree)?;
        info!("library index written to {}", self.doc_path.display());
        Ok(tree)
    }
}
