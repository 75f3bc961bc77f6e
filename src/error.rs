// Error taxonomy for talebox
// Four families: persistence, selection, resume, playback. A user interrupt
// is not an error anywhere - it comes back as SessionOutcome::Interrupted.

use std::path::PathBuf;
use thiserror::Error;

/// A persisted document could not be read or written. Corrupt documents are
/// surfaced, never repaired or treated as empty.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The user picked something that isn't on the listing. Recovered locally by
/// the menu with a fresh listing.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("choice {given} is outside 1..={count}")]
    OutOfRange { given: usize, count: usize },

    #[error("'{0}' is not a book")]
    NotABook(String),
}

/// The saved resume point is missing or no longer matches the saved book.
/// Never falls back to chapter 1.
#[derive(Error, Debug)]
pub enum ResumeError {
    #[error("no saved listening position")]
    NoCheckpoint,

    #[error("no saved book selection")]
    NoCurrentBook,

    #[error("saved position points at chapter {chapter_id}, which the saved book does not have")]
    StaleCheckpoint { chapter_id: u32 },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// The audio backend failed. Any of these aborts the session; the last
/// written checkpoint stays on disk.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),

    #[error("audio sink failed: {0}")]
    Sink(#[from] rodio::PlayError),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    // rodio's SeekError is not Sync; keep the message only
    #[error("seek failed in {path}: {message}")]
    Seek { path: PathBuf, message: String },

    #[error("failed to save listening position: {0}")]
    Checkpoint(#[source] PersistenceError),
}
