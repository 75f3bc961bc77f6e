// Audio backend seam
// The session talks to these traits; rodio provides the real implementation
// and tests script a fake one. A session is a scoped resource: dropping it
// releases the sink whatever path the playback loop took out.

use crate::error::PlaybackError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// No Send/Sync bounds: rodio's output stream is tied to the thread that
// opened it, and the whole session runs on the main task anyway.
pub trait AudioSession {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;
    fn is_playing(&self) -> bool;
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    fn stop(&mut self);
}

pub trait AudioBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioSession>, PlaybackError>;
}

/// The real backend. Holds the output stream open for the lifetime of the
/// process; sessions come and go per chapter.
pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl RodioBackend {
    pub fn new(volume: f32) -> Result<Self, PlaybackError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            volume: volume.clamp(0.0, 1.0),
        })
    }
}

impl AudioBackend for RodioBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioSession>, PlaybackError> {
        let file = File::open(path).map_err(|err| PlaybackError::Open {
            path: path.to_path_buf(),
            source: err,
        })?;

        let source = Decoder::new(BufReader::new(file)).map_err(|err| PlaybackError::Decode {
            path: path.to_path_buf(),
            source: err,
        })?;

        // The decoder is consumed by append; grab the duration first
        let duration = source.total_duration();

        let sink = Sink::try_new(&self.handle)?;
        sink.set_volume(self.volume);
        sink.pause();
        sink.append(source);

        debug!("opened {} ({:?})", path.display(), duration);

        Ok(Box::new(RodioSession {
            sink,
            duration,
            path: path.to_path_buf(),
        }))
    }
}

struct RodioSession {
    sink: Sink,
    duration: Option<Duration>,
    path: PathBuf,
}

impl AudioSession for RodioSession {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.sink.play();
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|err| PlaybackError::Seek {
                path: self.path.clone(),
                message: err.to_string(),
            })
    }

    fn is_playing(&self) -> bool {
        !self.sink.empty()
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}
