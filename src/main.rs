// talebox - terminal audiobook player
// Thin menu shell over the library, playback, and resume core.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use talebox::library::select;
use talebox::playback::AudioBackend;
use talebox::ui;
use talebox::{
    BookStore, CancelToken, Config, CurrentBook, LibraryStore, PlaybackSession, PositionStore,
    ResumeController, RodioBackend, SessionOutcome,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "talebox")]
#[command(about = "Terminal audiobook player that remembers where you stopped")]
struct Args {
    /// Rebuild the library index before showing the menu
    #[arg(long)]
    rebuild: bool,

    /// Override the configured audiobook directory
    #[arg(long)]
    library: Option<PathBuf>,

    /// Enable developer logging (keeps stderr visible)
    #[arg(long)]
    dev: bool,
}

struct App {
    config: Config,
    library: LibraryStore,
    positions: PositionStore,
    books: BookStore,
    backend: Arc<dyn AudioBackend>,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "talebox.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,talebox=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("Dev mode: stderr stays visible");
    }

    // Keep the non-blocking writer alive for the life of the process
    std::mem::forget(guard);

    Ok(())
}

// ALSA likes to chat on stderr right over the menu; send it to /dev/null
// outside dev mode.
fn redirect_stderr_to_null() -> Result<()> {
    unsafe {
        let null_fd = libc::open(
            b"/dev/null\0".as_ptr() as *const libc::c_char,
            libc::O_WRONLY,
        );
        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }

        libc::close(null_fd);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(root) = args.library {
        config.library_root = root;
    }

    init_logging(&config.log_dir(), args.dev)?;

    if !args.dev {
        if let Err(err) = redirect_stderr_to_null() {
            warn!("could not silence stderr: {err}");
        }
    }

    info!("talebox starting up");

    let backend: Arc<dyn AudioBackend> = Arc::new(
        RodioBackend::new(config.playback.volume).context("audio output unavailable")?,
    );

    let app = App {
        library: LibraryStore::new(config.library_doc_path(), config.library_root.clone()),
        positions: PositionStore::new(config.current_position_path()),
        books: BookStore::new(config.current_book_path()),
        backend,
        config,
    };

    if args.rebuild {
        app.library
            .load(true)
            .context("failed to rebuild the library index")?;
        println!("Library index rebuilt.");
    }

    main_menu(&app).await
}

async fn main_menu(app: &App) -> Result<()> {
    loop {
        ui::clear_screen();
        println!("===== talebox =====");
        println!("1. {}", keep_listening_line(app));
        println!("2. Select a book");
        println!("3. Rebuild the library");
        println!("4. Exit");

        let choice = ui::prompt("Enter the option number: ")?;
        match choice.as_str() {
            "1" => {
                if let Err(err) = keep_listening(app).await {
                    pause_with(&format!("Could not resume: {err}"))?;
                }
            }
            "2" => {
                if let Err(err) = select_and_play(app).await {
                    pause_with(&format!("{err}"))?;
                }
            }
            "3" => match app.library.load(true) {
                Ok(_) => pause_with("The library has been rebuilt.")?,
                Err(err) => pause_with(&format!("Rebuild failed: {err}"))?,
            },
            "4" => {
                println!("Goodbye!");
                return Ok(());
            }
            _ => pause_with("Invalid choice. Please select a valid option (1-4).")?,
        }
    }
}

/// Menu line for option 1, read straight from the saved pair. Degrades to a
/// placeholder when there is nothing (or something unreadable) on disk.
fn keep_listening_line(app: &App) -> String {
    match (app.positions.load(), app.books.load()) {
        (Ok(Some(checkpoint)), Ok(Some(book))) => ui::resume_line(&checkpoint, &book),
        _ => "Keep listening (no saved session yet)".to_string(),
    }
}

async fn keep_listening(app: &App) -> Result<()> {
    let controller = ResumeController::new(&app.positions, &app.books);
    // Loaded up front for the progress header; resume() re-checks the pair
    let point = controller.resume_point()?;

    let (session, watcher, printer) = wire_session(app, point.book.clone());
    let outcome = controller.resume(&session).await;
    watcher.abort();
    drop(session);
    let _ = printer.await;

    after_session(outcome?)
}

async fn select_and_play(app: &App) -> Result<()> {
    let tree = app.library.load(false)?;
    let entries = select::top_level_entries(&tree);
    if entries.is_empty() {
        pause_with("The library is empty. Check the configured library_root.")?;
        return Ok(());
    }

    ui::clear_screen();
    println!("Available books and series:");
    for (index, entry) in entries.iter().enumerate() {
        println!("{:02}. {} by {}", index + 1, entry.title, entry.author);
    }

    let input = ui::prompt("Enter the number of the book or series to play: ")?;
    let index = match select::parse_ordinal(&input, entries.len()) {
        Ok(index) => index,
        Err(err) => {
            pause_with(&err.to_string())?;
            return Ok(());
        }
    };
    let picked = &entries[index];

    let (title, node) = if picked.node.is_series() {
        let books = select::series_entries(picked.node);
        println!("Selected series: {}", picked.title);
        for (index, (title, _)) in books.iter().enumerate() {
            println!("{:02}. {}", index + 1, title);
        }

        let input = ui::prompt("Enter the number of the book to play: ")?;
        match select::parse_ordinal(&input, books.len()) {
            Ok(index) => books[index],
            Err(err) => {
                pause_with(&err.to_string())?;
                return Ok(());
            }
        }
    } else {
        (picked.title, picked.node)
    };

    let current = match select::into_current_book(picked.author, title, node) {
        Ok(book) => book,
        Err(err) => {
            pause_with(&err.to_string())?;
            return Ok(());
        }
    };
    app.books.save(&current)?;

    let (session, watcher, printer) = wire_session(app, current.clone());
    let outcome = session.play_book(&current.chapters, 1, Duration::ZERO).await;
    watcher.abort();
    drop(session);
    let _ = printer.await;

    after_session(outcome?)
}

/// One playback session wired for the terminal: a ctrl-c watcher feeding the
/// cancel token and a task draining session events into the progress line.
fn wire_session(
    app: &App,
    book: CurrentBook,
) -> (PlaybackSession, JoinHandle<()>, JoinHandle<()>) {
    let cancel = CancelToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut session = PlaybackSession::new(
        app.backend.clone(),
        app.positions.clone(),
        cancel.clone(),
    )
    .with_poll_interval(Duration::from_millis(app.config.playback.poll_interval_ms));
    session.set_event_sender(tx);

    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            ui::render_event(&book, &event);
        }
    });

    (session, watcher, printer)
}

fn after_session(outcome: SessionOutcome) -> Result<()> {
    match outcome {
        SessionOutcome::Finished => pause_with("Playback finished."),
        SessionOutcome::Interrupted => pause_with("Playback stopped."),
    }
}

fn pause_with(message: &str) -> Result<()> {
    println!("{message}");
    ui::prompt("Press Enter to return to the menu... ")?;
    Ok(())
}
