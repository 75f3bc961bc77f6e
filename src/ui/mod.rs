// Terminal glue: prompts, screen clearing, and the progress line.
// Everything here is presentation; the playback core only ever sees the
// event channel.

use crate::playback::SessionEvent;
use crate::state::{Checkpoint, CurrentBook};
use crossterm::{cursor, execute, terminal};
use std::io::{self, Write};

pub fn clear_screen() {
    let _ = execute!(
        io::stdout(),
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    );
}

/// Milliseconds as HH:MM:SS.
pub fn format_time(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// The menu header line for a saved session.
pub fn resume_line(checkpoint: &Checkpoint, book: &CurrentBook) -> String {
    format!(
        "Keep listening - {} into chapter {} of {} by {}",
        format_time(checkpoint.timestamp_ms),
        checkpoint.chapter_id,
        book.title,
        book.author
    )
}

/// Render one session event. Progress redraws in place rather than
/// scrolling a line per tick.
pub fn render_event(book: &CurrentBook, event: &SessionEvent) {
    match event {
        SessionEvent::ChapterStarted { chapter_id, .. } => {
            println!(
                "\nNow playing: chapter {} of {} by {}",
                chapter_id, book.title, book.author
            );
        }
        SessionEvent::Progress {
            position, duration, ..
        } => {
            let played = format_time(position.as_millis() as u64);
            let total = duration
                .map(|d| format_time(d.as_millis() as u64))
                .unwrap_or_else(|| "--:--:--".to_string());
            print!("\r  {played} / {total}");
            let _ = io::stdout().flush();
        }
        SessionEvent::ChapterFinished { chapter_id } => {
            println!("\nChapter {chapter_id} finished");
        }
        SessionEvent::Interrupted { .. } => {
            println!("\nPlayback stopped");
        }
        SessionEvent::BookFinished => {
            println!("\nEnd of book");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(999), "00:00:00");
        assert_eq!(format_time(61_000), "00:01:01");
        assert_eq!(format_time(3_661_000), "01:01:01");
        assert_eq!(format_time(36_000_000), "10:00:00");
    }
}
