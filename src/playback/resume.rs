// Picking a book back up.
// The checkpoint and the saved book are read as a pair, cross-checked, and
// replayed into the session with a small rewind so the listener gets a few
// seconds of context back.

use super::session::{PlaybackSession, SessionOutcome};
use crate::error::ResumeError;
use crate::state::{BookStore, CurrentBook, PositionStore};
use std::time::Duration;
use tracing::info;

/// Fixed rewind applied to the saved position, clamped at the chapter start.
pub const RESUME_REWIND: Duration = Duration::from_secs(5);

pub struct ResumePoint {
    pub book: CurrentBook,
    pub chapter_id: u32,
    pub offset: Duration,
}

pub struct ResumeController<'a> {
    positions: &'a PositionStore,
    books: &'a BookStore,
}

impl<'a> ResumeController<'a> {
    pub fn new(positions: &'a PositionStore, books: &'a BookStore) -> Self {
        Self { positions, books }
    }

    /// Read the saved pair and compute where playback should restart. A
    /// missing document or a checkpoint pointing at a chapter the saved book
    /// does not have is an error - never a silent restart from chapter 1.
    pub fn resume_point(&self) -> Result<ResumePoint, ResumeError> {
        let checkpoint = self.positions.load()?.ok_or(ResumeError::NoCheckpoint)?;
        let book = self.books.load()?.ok_or(ResumeError::NoCurrentBook)?;

        if !book.chapters.contains_key(&checkpoint.chapter_id) {
            return Err(ResumeError::StaleCheckpoint {
                chapter_id: checkpoint.chapter_id,
            });
        }

        let offset = Duration::from_millis(
            checkpoint
                .timestamp_ms
                .saturating_sub(RESUME_REWIND.as_millis() as u64),
        );

        Ok(ResumePoint {
            book,
            chapter_id: checkpoint.chapter_id,
            offset,
        })
    }

    /// Re-enter the playback session at the computed resume point.
    pub async fn resume(
        &self,
        session: &PlaybackSession,
    ) -> Result<SessionOutcome, ResumeError> {
        let point = self.resume_point()?;
        info!(
            "resuming '{}' at chapter {}, {:?} in",
            point.book.title, point.chapter_id, point.offset
        );

        Ok(session
            .play_book(&point.book.chapters, point.chapter_id, point.offset)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Checkpoint;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn stores(dir: &tempfile::TempDir) -> (PositionStore, BookStore) {
        (
            PositionStore::new(dir.path().join("current_position.json")),
            BookStore::new(dir.path().join("current_book.json")),
        )
    }

    fn saved_book() -> CurrentBook {
        let mut chapters = BTreeMap::new();
        chapters.insert(1, PathBuf::from("/b/1.mp3"));
        chapters.insert(2, PathBuf::from("/b/2.mp3"));
        CurrentBook {
            author: "Author".into(),
            title: "Book".into(),
            chapters,
            cover_art: None,
        }
    }

    #[test]
    fn rewinds_five_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let (positions, books) = stores(&dir);
        books.save(&saved_book()).unwrap();
        positions
            .save(&Checkpoint {
                chapter_id: 2,
                timestamp_ms: 12_000,
            })
            .unwrap();

        let point = ResumeController::new(&positions, &books)
            .resume_point()
            .unwrap();
        assert_eq!(point.chapter_id, 2);
        assert_eq!(point.offset, Duration::from_millis(7_000));
    }

    #[test]
    fn rewind_clamps_at_the_chapter_start() {
        let dir = tempfile::tempdir().unwrap();
        let (positions, books) = stores(&dir);
        books.save(&saved_book()).unwrap();
        positions
            .save(&Checkpoint {
                chapter_id: 1,
                timestamp_ms: 3_000,
            })
            .unwrap();

        let point = ResumeController::new(&positions, &books)
            .resume_point()
            .unwrap();
        assert_eq!(point.offset, Duration::ZERO);
    }

    #[test]
    fn missing_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (positions, books) = stores(&dir);
        books.save(&saved_book()).unwrap();

        assert!(matches!(
            ResumeController::new(&positions, &books).resume_point(),
            Err(ResumeError::NoCheckpoint)
        ));
    }

    #[test]
    fn missing_book_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (positions, books) = stores(&dir);
        positions
            .save(&Checkpoint {
                chapter_id: 1,
                timestamp_ms: 0,
            })
            .unwrap();

        assert!(matches!(
            ResumeController::new(&positions, &books).resume_point(),
            Err(ResumeError::NoCurrentBook)
        ));
    }

    #[test]
    fn stale_pairing_never_restarts_from_chapter_one() {
        let dir = tempfile::tempdir().unwrap();
        let (positions, books) = stores(&dir);
        books.save(&saved_book()).unwrap();
        positions
            .save(&Checkpoint {
                chapter_id: 7,
                timestamp_ms: 1_000,
            })
            .unwrap();

        assert!(matches!(
            ResumeController::new(&positions, &books).resume_point(),
            Err(ResumeError::StaleCheckpoint { chapter_id: 7 })
        ));
    }
}
