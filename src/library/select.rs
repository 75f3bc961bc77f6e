// Turns menu picks into a concrete book.
// Listings are re-enumerated from the tree on every call; an ordinal is only
// ever validated against the listing it was printed with.

use super::LibraryNode;
use crate::error::SelectionError;
use crate::state::CurrentBook;
use tracing::warn;

/// One line of the top-level listing: a book or series under its author.
pub struct TopEntry<'a> {
    pub author: &'a str,
    pub title: &'a str,
    pub node: &'a LibraryNode,
}

/// Flatten the tree two levels deep, author -> book-or-series. A book
/// sitting directly in the library root is listed under its own name.
pub fn top_level_entries(tree: &LibraryNode) -> Vec<TopEntry<'_>> {
    let mut entries = Vec::new();

    let LibraryNode::Container { children, .. } = tree else {
        warn!("library root is a single book; listing nothing");
        return entries;
    };

    for (name, shelf) in children {
        match shelf {
            LibraryNode::Container { children: works, .. } => {
                for (title, node) in works {
                    entries.push(TopEntry {
                        author: name,
                        title,
                        node,
                    });
                }
            }
            LibraryNode::Book { .. } => entries.push(TopEntry {
                author: name,
                title: name,
                node: shelf,
            }),
        }
    }

    entries
}

/// The second selection step: the books inside a series.
pub fn series_entries(series: &LibraryNode) -> Vec<(&str, &LibraryNode)> {
    match series {
        LibraryNode::Container { children, .. } => children
            .iter()
            .map(|(title, node)| (title.as_str(), node))
            .collect(),
        LibraryNode::Book { .. } => Vec::new(),
    }
}

/// Validate a typed ordinal against a listing of `count` entries. Returns a
/// zero-based index into that listing.
pub fn parse_ordinal(input: &str, count: usize) -> Result<usize, SelectionError> {
    let trimmed = input.trim();
    let given: usize = trimmed
        .parse()
        .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;

    if given == 0 || given > count {
        return Err(SelectionError::OutOfRange { given, count });
    }

    Ok(given - 1)
}

/// Finish a resolve: the picked node must be a book. Selecting a series (or
/// anything nested deeper than author/series/book) is a selection error, not
/// something to play.
pub fn into_current_book(
    author: &str,
    title: &str,
    node: &LibraryNode,
) -> Result<CurrentBook, SelectionError> {
    match node {
        LibraryNode::Book {
            chapters,
            cover_art,
        } => Ok(CurrentBook {
            author: author.to_string(),
            title: title.to_string(),
            chapters: chapters.clone(),
            cover_art: cover_art.clone(),
        }),
        LibraryNode::Container { .. } => Err(SelectionError::NotABook(title.to_string())),
    }
}
