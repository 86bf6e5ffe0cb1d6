//! Chapter grouping: folds the node stream of one book into chapters of
//! matching paragraphs.
//!
//! The grouper holds a pending heading (seeded with the book title, since
//! paragraphs can appear before any in-document heading) and an accumulator
//! of matching paragraphs. A heading transition flushes the accumulator; a
//! trailing accumulator is flushed by [`ChapterGrouper::finish`].

use serde::Serialize;

use crate::epub::{Node, NodeKind};
use crate::pattern::PhraseSet;

/// A chapter heading paired with the paragraphs under it that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterGroup {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

/// State machine that groups matching paragraphs under their nearest
/// preceding heading. Feed it every node of a book, in spine order.
pub struct ChapterGrouper<'a> {
    phrases: &'a PhraseSet,
    pending_heading: String,
    paragraphs: Vec<String>,
    chapters: Vec<ChapterGroup>,
    seen_heading: bool,
}

impl<'a> ChapterGrouper<'a> {
    /// `title` seeds the pending heading for any paragraphs that precede
    /// the first in-document heading.
    pub fn new(phrases: &'a PhraseSet, title: &str) -> Self {
        Self {
            phrases,
            pending_heading: title.to_string(),
            paragraphs: Vec::new(),
            chapters: Vec::new(),
            seen_heading: false,
        }
    }

    pub fn push(&mut self, node: Node) {
        match node.kind {
            NodeKind::Heading => {
                // A title that itself matches surfaces even when no
                // paragraph under it matched. First transition only.
                let title_matches =
                    !self.seen_heading && self.phrases.is_match(&self.pending_heading);
                if !self.paragraphs.is_empty() || title_matches {
                    self.flush();
                }
                self.seen_heading = true;
                self.pending_heading = node.text;
            }
            NodeKind::Paragraph => {
                if self.phrases.is_match(&node.text) {
                    self.paragraphs.push(node.text);
                }
            }
        }
    }

    /// Flush any trailing accumulator and return the chapters in order.
    pub fn finish(mut self) -> Vec<ChapterGroup> {
        if !self.paragraphs.is_empty() {
            self.flush();
        }
        self.chapters
    }

    fn flush(&mut self) {
        self.chapters.push(ChapterGroup {
            heading: self.pending_heading.clone(),
            paragraphs: std::mem::take(&mut self.paragraphs),
        });
    }
}
