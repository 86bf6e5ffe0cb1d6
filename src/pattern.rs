//! Search phrase compilation and matching.
//!
//! A phrase is a literal word sequence or a regular expression. Compilation
//! rewrites every run of whitespace to `\s+` (so spacing width never
//! matters), wraps the result in word-boundary anchors, and compiles it
//! case-insensitively with `.` matching newlines (paragraph text can span
//! lines). Regex metacharacters pass through untouched, so `beamish|uffish`
//! works as a phrase.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// A compiled, conjunctive set of search patterns.
///
/// Text matches a `PhraseSet` iff every pattern finds at least one
/// occurrence in it. Immutable after compilation, so it can be shared
/// freely across search tasks.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    patterns: Vec<Regex>,
}

impl PhraseSet {
    /// Compile one pattern per phrase. At least one phrase is required.
    pub fn compile<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for phrase in phrases {
            let pattern = phrase_pattern(phrase.as_ref());
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()?;
            patterns.push(regex);
        }
        if patterns.is_empty() {
            return Err(Error::NoPhrases);
        }
        Ok(Self { patterns })
    }

    /// True iff every pattern matches somewhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().all(|p| p.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Build the regex source for one phrase: trim, collapse whitespace runs
/// to `\s+`, anchor both ends with `\b`.
fn phrase_pattern(phrase: &str) -> String {
    let phrase = phrase.trim();
    let mut pattern = String::with_capacity(phrase.len() + 8);
    pattern.push_str(r"\b");
    let mut in_whitespace = false;
    for c in phrase.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                pattern.push_str(r"\s+");
                in_whitespace = true;
            }
        } else {
            pattern.push(c);
            in_whitespace = false;
        }
    }
    pattern.push_str(r"\b");
    pattern
}
