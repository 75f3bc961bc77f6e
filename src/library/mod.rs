// Library tree model
// A node is either a container (author or series level) or a book (its
// chapter list). The indexer never mixes the two; cover art rides alongside
// either case instead of squatting on a reserved chapter key.

pub mod indexer;
pub mod select;
pub mod store;

pub use store::LibraryStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Chapter number -> audio file path, 1-based. The BTreeMap keeps chapters in
/// playback order.
pub type ChapterSet = BTreeMap<u32, PathBuf>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryNode {
    Container {
        children: BTreeMap<String, LibraryNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cover_art: Option<PathBuf>,
    },
    Book {
        chapters: ChapterSet,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cover_art: Option<PathBuf>,
    },
}

impl LibraryNode {
    pub fn empty_container() -> Self {
        LibraryNode::Container {
            children: BTreeMap::new(),
            cover_art: None,
        }
    }

    /// A container sitting at book position is a series: it needs a second
    /// selection step before there is anything to play.
    pub fn is_series(&self) -> bool {
        matches!(self, LibraryNode::Container { .. })
    }

    pub fn chapters(&self) -> Option<&ChapterSet> {
        match self {
            LibraryNode::Book { chapters, .. } => Some(chapters),
            LibraryNode::Container { .. } => None,
        }
    }
}
