// Builds the library tree from a directory snapshot.
// Each level is enumerated in filename-sorted order, so chapter numbers come
// out the same on every rebuild regardless of how the platform happens to
// order directory entries.

use super::LibraryNode;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "m4b", "flac", "ogg", "wav"];
const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Scan a directory tree into a fresh `LibraryNode`. Purely a read of the
/// filesystem; persisting the result is the store's job.
pub fn scan(root: &Path) -> io::Result<LibraryNode> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("library root {} is not a directory", root.display()),
        ));
    }

    let tree = scan_dir(root);
    debug!("indexed {}", root.display());
    Ok(tree)
}

fn scan_dir(dir: &Path) -> LibraryNode {
    let mut children = BTreeMap::new();
    let mut chapters = BTreeMap::new();
    let mut cover_art = None;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {}", dir.display(), err);
                continue;
            }
        };

        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // Skip hidden files (dotfiles)
        if name.starts_with('.') {
            continue;
        }

        if entry.file_type().is_dir() {
            children.insert(name.to_string(), scan_dir(path));
        } else if has_extension(path, AUDIO_EXTENSIONS) {
            let chapter_id = chapters.len() as u32 + 1;
            chapters.insert(chapter_id, path.to_path_buf());
        } else if has_extension(path, COVER_EXTENSIONS) {
            // Last one wins when a directory holds several covers
            cover_art = Some(path.to_path_buf());
        }
        // anything else is ignored
    }

    if !children.is_empty() {
        if !chapters.is_empty() {
            warn!(
                "{}: has both subdirectories and {} loose audio file(s); keeping it as a container",
                dir.display(),
                chapters.len()
            );
        }
        LibraryNode::Container {
            children,
            cover_art,
        }
    } else if !chapters.is_empty() {
        LibraryNode::Book {
            chapters,
            cover_art,
        }
    } else {
        LibraryNode::Container {
            children,
            cover_art,
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
