//! Per-book and batch search orchestration.
//!
//! One book is a pure single pass: open the package, stream every spine
//! document's nodes through the grouper, keep the result only if chapters
//! came out. A batch never aborts on a bad book; per-book errors are
//! collected so the caller can report them after the results.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, warn};

use crate::epub::{EpubDocument, decode_text, scan_nodes};
use crate::error::{Error, Result};
use crate::group::{ChapterGroup, ChapterGrouper};
use crate::pattern::PhraseSet;

/// Everything that matched in one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookResult {
    pub source: PathBuf,
    pub title: String,
    pub chapters: Vec<ChapterGroup>,
}

/// The outcome of a batch: matching books plus the books that failed.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<BookResult>,
    pub errors: Vec<(PathBuf, Error)>,
}

/// Search one EPUB. Returns `Ok(None)` when nothing matched.
///
/// A spine document that fails to parse is logged and skipped; the rest of
/// the book is still searched. Open and read failures fail the whole book.
pub fn search_book(path: &Path, phrases: &PhraseSet) -> Result<Option<BookResult>> {
    let mut doc = EpubDocument::open(path)?;
    debug!(
        path = %doc.source.display(),
        title = %doc.title,
        spine = doc.spine.len(),
        "opened EPUB"
    );

    let mut grouper = ChapterGrouper::new(phrases, &doc.title);
    let spine = doc.spine.clone();
    for entry in &spine {
        let bytes = doc.read_document(entry)?;
        let html = decode_text(&bytes);
        for node in scan_nodes(&html) {
            match node {
                Ok(node) => grouper.push(node),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        entry = %entry,
                        error = %e,
                        "skipping unparseable spine document"
                    );
                    break;
                }
            }
        }
    }

    let chapters = grouper.finish();
    if chapters.is_empty() {
        return Ok(None);
    }
    Ok(Some(BookResult {
        source: doc.source.clone(),
        title: doc.title.clone(),
        chapters,
    }))
}

/// Search every EPUB under `root` (or `root` itself, if it is a file).
pub fn search_path(root: &Path, phrases: &PhraseSet) -> Result<SearchOutcome> {
    let mut outcome = SearchOutcome::default();
    for path in epub_files(root)? {
        match search_book(&path, phrases) {
            Ok(Some(result)) => outcome.results.push(result),
            Ok(None) => {}
            Err(e) => outcome.errors.push((path, e)),
        }
    }
    Ok(outcome)
}

/// Enumerate `.epub` files under `root`, sorted for deterministic output.
///
/// A file root must itself have the `.epub` extension, otherwise (and for a
/// nonexistent root) this is [`Error::NotFound`]. A directory with no EPUBs
/// is an empty, successful enumeration.
pub fn epub_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return if has_epub_extension(root) {
            Ok(vec![root.to_path_buf()])
        } else {
            Err(Error::NotFound(root.to_path_buf()))
        };
    }
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).standard_filters(false).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_some_and(|t| t.is_file()) && has_epub_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn has_epub_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
}
