//! # epubfind
//!
//! Phrase search across EPUB ebooks.
//!
//! A paragraph matches when it contains *all* of the search phrases.
//! Matching paragraphs are grouped under their book title and the nearest
//! preceding chapter heading so they can be located in the book. Phrases
//! are case-insensitive, ignore the width of spacing between words, only
//! match whole words, and may themselves be regular expressions
//! (`beamish|uffish` finds paragraphs containing either word).
//!
//! ## Quick Start
//!
//! ```no_run
//! use epubfind::{PhraseSet, search_path};
//!
//! let phrases = PhraseSet::compile(["suddenly vanish"])?;
//! let outcome = search_path("~/books".as_ref(), &phrases)?;
//! for book in &outcome.results {
//!     println!("{}: {} matching chapters", book.title, book.chapters.len());
//! }
//! for (path, error) in &outcome.errors {
//!     eprintln!("{}: {}", path.display(), error);
//! }
//! # Ok::<(), epubfind::Error>(())
//! ```

pub mod epub;
pub mod error;
pub mod group;
pub mod output;
pub mod pattern;
pub mod search;

pub use epub::{EpubDocument, Node, NodeKind, NodeStream, scan_nodes};
pub use error::{Error, Result};
pub use group::{ChapterGroup, ChapterGrouper};
pub use pattern::PhraseSet;
pub use search::{BookResult, SearchOutcome, epub_files, search_book, search_path};
