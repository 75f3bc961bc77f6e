// Persisted listening state
// Three JSON documents live under the data directory: the library tree, the
// currently selected book, and the last known position. Every write is a
// full-document overwrite; the reader of a half-written file gets a Corrupt
// error, never an empty default.

use crate::error::PersistenceError;
use crate::library::ChapterSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Last known playback position. Paired with [`CurrentBook`]; the two only
/// make sense read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub chapter_id: u32,
    pub timestamp_ms: u64,
}

/// The book the checkpoint belongs to, written once when a selection
/// completes. Author and title are captured here so the menu never has to
/// parse them back out of a file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBook {
    pub author: String,
    pub title: String,
    pub chapters: ChapterSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art: Option<PathBuf>,
}

pub(crate) fn read_document<T: DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, PersistenceError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source: err,
            })
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| PersistenceError::Corrupt {
            path: path.to_path_buf(),
            source: err,
        })
}

pub(crate) fn write_document<T: Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| PersistenceError::Io {
            path: parent.to_path_buf(),
            source: err,
        })?;
    }

    let bytes = serde_json::to_vec_pretty(value).map_err(|err| PersistenceError::Corrupt {
        path: path.to_path_buf(),
        source: err,
    })?;

    fs::write(path, bytes).map_err(|err| PersistenceError::Io {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Owns `current_position.json`. The playback session is the only writer
/// while a session is active; the menu and resume controller read it between
/// sessions.
#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), PersistenceError> {
        write_document(&self.path, checkpoint)
    }

    pub fn load(&self) -> Result<Option<Checkpoint>, PersistenceError> {
        read_document(&self.path)
    }
}

/// Owns `current_book.json`.
#[derive(Debug, Clone)]
pub struct BookStore {
    path: PathBuf,
}

impl BookStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, book: &CurrentBook) -> Result<(), PersistenceError> {
        write_document(&self.path, book)
    }

    pub fn load(&self) -> Result<Option<CurrentBook>, PersistenceError> {
        read_document(&self.path)
    }
}
