// The playback state machine.
// A book plays as a strictly sequential chapter walk; each chapter runs a
// poll loop that samples the engine, reports progress, and overwrites the
// position checkpoint every tick. The checkpoint file is the only resume
// mechanism there is.

use super::{AudioBackend, CancelToken, SessionEvent};
use crate::error::PlaybackError;
use crate::library::ChapterSet;
use crate::state::{Checkpoint, PositionStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a session ended. Interruption is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished,
    Interrupted,
}

enum ChapterEnd {
    Finished,
    Interrupted,
}

pub struct PlaybackSession {
    backend: Arc<dyn AudioBackend>,
    positions: PositionStore,
    cancel: CancelToken,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    poll_interval: Duration,
}

impl PlaybackSession {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        positions: PositionStore,
        cancel: CancelToken,
    ) -> Self {
        Self {
            backend,
            positions,
            cancel,
            events: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SessionEvent>) {
        self.events = Some(sender);
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    /// Play `chapters` in ascending order, starting at `starting_chapter`.
    /// Chapters below the starting one are skipped without touching the
    /// engine or the checkpoint. `start_offset` applies to the entry chapter
    /// only; every later chapter starts from the top.
    pub async fn play_book(
        &self,
        chapters: &ChapterSet,
        starting_chapter: u32,
        start_offset: Duration,
    ) -> Result<SessionOutcome, PlaybackError> {
        if chapters.is_empty() {
            warn!("book has no chapters; nothing to play");
        }

        let mut offset = start_offset;
        for (&chapter_id, path) in chapters.range(starting_chapter..) {
            match self.play_chapter(chapter_id, path, offset).await? {
                ChapterEnd::Interrupted => {
                    info!("playback interrupted at chapter {chapter_id}");
                    return Ok(SessionOutcome::Interrupted);
                }
                ChapterEnd::Finished => {}
            }
            offset = Duration::ZERO;
        }

        debug!("reached the end of the book");
        self.emit(SessionEvent::BookFinished);
        Ok(SessionOutcome::Finished)
    }

    async fn play_chapter(
        &self,
        chapter_id: u32,
        path: &Path,
        start_offset: Duration,
    ) -> Result<ChapterEnd, PlaybackError> {
        info!("chapter {} -> {}", chapter_id, path.display());

        let mut audio = self.backend.open(path)?;
        audio.play()?;
        if start_offset > Duration::ZERO {
            audio.seek(start_offset)?;
        }
        self.emit(SessionEvent::ChapterStarted {
            chapter_id,
            path: path.to_path_buf(),
        });

        loop {
            // Cancel check first: an interrupt must never be outlived by
            // more than one tick, and must not overwrite the checkpoint.
            if self.cancel.is_cancelled() {
                audio.stop();
                self.emit(SessionEvent::Interrupted { chapter_id });
                return Ok(ChapterEnd::Interrupted);
            }

            if !audio.is_playing() {
                break;
            }

            let position = audio.position();
            let duration = audio.duration();

            self.positions
                .save(&Checkpoint {
                    chapter_id,
                    timestamp_ms: position.as_millis() as u64,
                })
                .map_err(PlaybackError::Checkpoint)?;
            self.emit(SessionEvent::Progress {
                chapter_id,
                position,
                duration,
            });

            tokio::time::sleep(self.poll_interval).await;
        }

        audio.stop();
        self.emit(SessionEvent::ChapterFinished { chapter_id });
        Ok(ChapterEnd::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::AudioSession;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    const TICK_MS: u64 = 100;

    #[derive(Debug, Clone, PartialEq)]
    struct OpenRecord {
        path: PathBuf,
        seek: Option<Duration>,
    }

    /// Scripted backend: every chapter "plays" for a fixed number of poll
    /// ticks, advancing 100ms per tick. Opens and seeks are logged.
    struct FakeBackend {
        opens: Arc<Mutex<Vec<OpenRecord>>>,
        ticks_per_chapter: u32,
        fail_on: Option<PathBuf>,
    }

    impl FakeBackend {
        fn new(ticks_per_chapter: u32) -> Self {
            Self {
                opens: Arc::new(Mutex::new(Vec::new())),
                ticks_per_chapter,
                fail_on: None,
            }
        }

        fn failing_on(mut self, path: &str) -> Self {
            self.fail_on = Some(PathBuf::from(path));
            self
        }

        fn opened(&self) -> Vec<OpenRecord> {
            self.opens.lock().unwrap().clone()
        }
    }

    impl AudioBackend for FakeBackend {
        fn open(&self, path: &Path) -> Result<Box<dyn AudioSession>, PlaybackError> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(PlaybackError::Open {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
                });
            }

            let mut opens = self.opens.lock().unwrap();
            opens.push(OpenRecord {
                path: path.to_path_buf(),
                seek: None,
            });
            let index = opens.len() - 1;

            Ok(Box::new(FakeSession {
                opens: self.opens.clone(),
                index,
                total_ticks: self.ticks_per_chapter,
                tick: AtomicU32::new(0),
            }))
        }
    }

    struct FakeSession {
        opens: Arc<Mutex<Vec<OpenRecord>>>,
        index: usize,
        total_ticks: u32,
        tick: AtomicU32,
    }

    impl AudioSession for FakeSession {
        fn play(&mut self) -> Result<(), PlaybackError> {
            Ok(())
        }

        fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
            self.opens.lock().unwrap()[self.index].seek = Some(position);
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.tick.load(Ordering::SeqCst) < self.total_ticks
        }

        fn position(&self) -> Duration {
            let tick = self.tick.fetch_add(1, Ordering::SeqCst);
            Duration::from_millis(tick as u64 * TICK_MS)
        }

        fn duration(&self) -> Option<Duration> {
            Some(Duration::from_millis(self.total_ticks as u64 * TICK_MS))
        }

        fn stop(&mut self) {}
    }

    fn chapter_set(paths: &[&str]) -> ChapterSet {
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32 + 1, PathBuf::from(p)))
            .collect()
    }

    fn session_over(backend: Arc<FakeBackend>, dir: &tempfile::TempDir) -> (PlaybackSession, PositionStore, CancelToken) {
        let positions = PositionStore::new(dir.path().join("current_position.json"));
        let cancel = CancelToken::new();
        let session = PlaybackSession::new(backend, positions.clone(), cancel.clone())
            .with_poll_interval(Duration::from_millis(1));
        (session, positions, cancel)
    }

    #[tokio::test]
    async fn plays_every_chapter_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new(2));
        let (session, positions, _cancel) = session_over(backend.clone(), &dir);

        let chapters = chapter_set(&["/b/a.mp3", "/b/b.mp3", "/b/c.mp3"]);
        let outcome = session
            .play_book(&chapters, 1, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(outcome, SessionOutcome::Finished);
        let opened: Vec<_> = backend.opened().into_iter().map(|r| r.path).collect();
        assert_eq!(
            opened,
            vec![
                PathBuf::from("/b/a.mp3"),
                PathBuf::from("/b/b.mp3"),
                PathBuf::from("/b/c.mp3")
            ]
        );

        // The de facto "finished" marker: the last chapter's final checkpoint
        let checkpoint = positions.load().unwrap().unwrap();
        assert_eq!(checkpoint.chapter_id, 3);
        assert_eq!(checkpoint.timestamp_ms, TICK_MS);
    }

    #[tokio::test]
    async fn starting_chapter_skips_earlier_ones_and_offsets_only_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new(1));
        let (session, _positions, _cancel) = session_over(backend.clone(), &dir);

        let chapters = chapter_set(&["/b/a.mp3", "/b/b.mp3", "/b/c.mp3"]);
        let start_offset = Duration::from_secs(30);
        session
            .play_book(&chapters, 2, start_offset)
            .await
            .unwrap();

        let opened = backend.opened();
        assert_eq!(opened.len(), 2);
        assert_eq!(opened[0].path, PathBuf::from("/b/b.mp3"));
        assert_eq!(opened[0].seek, Some(start_offset));
        assert_eq!(opened[1].path, PathBuf::from("/b/c.mp3"));
        assert_eq!(opened[1].seek, None);
    }

    #[tokio::test]
    async fn checkpoints_carry_the_playing_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new(3));
        let (session, positions, _cancel) = session_over(backend, &dir);

        let chapters = chapter_set(&["/b/only.mp3"]);
        session
            .play_book(&chapters, 1, Duration::ZERO)
            .await
            .unwrap();

        let checkpoint = positions.load().unwrap().unwrap();
        assert_eq!(checkpoint.chapter_id, 1);
        assert_eq!(checkpoint.timestamp_ms, 2 * TICK_MS);
    }

    #[tokio::test]
    async fn interruption_stops_before_the_next_chapter_and_keeps_the_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new(1000));
        let (session, positions, cancel) = session_over(backend.clone(), &dir);

        // A checkpoint from some earlier session
        let previous = Checkpoint {
            chapter_id: 9,
            timestamp_ms: 1234,
        };
        positions.save(&previous).unwrap();

        cancel.cancel();
        let chapters = chapter_set(&["/b/a.mp3", "/b/b.mp3"]);
        let outcome = session
            .play_book(&chapters, 1, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(outcome, SessionOutcome::Interrupted);
        // Cancelled on the first tick: no checkpoint was written, the old one
        // survives, and chapter 2 was never opened
        assert_eq!(positions.load().unwrap(), Some(previous));
        assert_eq!(backend.opened().len(), 1);
    }

    #[tokio::test]
    async fn engine_failure_aborts_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new(1).failing_on("/b/b.mp3"));
        let (session, positions, _cancel) = session_over(backend.clone(), &dir);

        let chapters = chapter_set(&["/b/a.mp3", "/b/b.mp3", "/b/c.mp3"]);
        let result = session.play_book(&chapters, 1, Duration::ZERO).await;

        assert!(matches!(result, Err(PlaybackError::Open { .. })));
        // Chapter 1 played, chapter 3 was never attempted
        let opened: Vec<_> = backend.opened().into_iter().map(|r| r.path).collect();
        assert_eq!(opened, vec![PathBuf::from("/b/a.mp3")]);
        // The failed session leaves chapter 1's last checkpoint in place
        assert_eq!(positions.load().unwrap().unwrap().chapter_id, 1);
    }

    #[tokio::test]
    async fn progress_events_reach_the_observer() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new(2));
        let (mut session, _positions, _cancel) = session_over(backend, &dir);

        let (tx, mut rx) = mpsc::unbounded_channel();
        session.set_event_sender(tx);

        let chapters = chapter_set(&["/b/a.mp3"]);
        session
            .play_book(&chapters, 1, Duration::ZERO)
            .await
            .unwrap();
        drop(session);

        let mut saw_progress = false;
        let mut saw_finish = false;
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Progress { chapter_id, .. } => {
                    assert_eq!(chapter_id, 1);
                    saw_progress = true;
                }
                SessionEvent::BookFinished => saw_finish = true,
                _ => {}
            }
        }
        assert!(saw_progress);
        assert!(saw_finish);
    }
}
