// Playback session and resume model
// One session plays one book at a time, chapter by chapter, checkpointing the
// position on every poll tick. The UI observes the session through an event
// channel; cancellation comes in through a token checked once per tick.

pub mod engine;
pub mod resume;
pub mod session;

pub use engine::{AudioBackend, AudioSession, RodioBackend};
pub use resume::{ResumeController, ResumePoint, RESUME_REWIND};
pub use session::{PlaybackSession, SessionOutcome};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the session reports while it runs. Rendering is the receiver's
/// problem; the session just emits.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ChapterStarted {
        chapter_id: u32,
        path: PathBuf,
    },
    Progress {
        chapter_id: u32,
        position: Duration,
        duration: Option<Duration>,
    },
    ChapterFinished {
        chapter_id: u32,
    },
    Interrupted {
        chapter_id: u32,
    },
    BookFinished,
}

/// Cooperative stop signal. The poll loop checks it once per tick, so an
/// interrupt is observed within one polling interval.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
