// talebox - terminal audiobook player
// Indexes a directory tree of audiobooks into a navigable library and
// resumes playback near where you last stopped.

pub mod config;
pub mod error;
pub mod library;
pub mod playback;
pub mod state;
pub mod ui;

// Export the stuff other modules actually use
pub use config::Config;
pub use error::{PersistenceError, PlaybackError, ResumeError, SelectionError};
pub use library::{ChapterSet, LibraryNode, LibraryStore};
pub use playback::{
    CancelToken, PlaybackSession, ResumeController, RodioBackend, SessionEvent, SessionOutcome,
};
pub use state::{BookStore, Checkpoint, CurrentBook, PositionStore};
