//! Terminal rendering of search results.
//!
//! Layout: a ruled banner with the book title and path, a lighter banner
//! per chapter heading, then each matching paragraph word-wrapped to the
//! configured width.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::Error;
use crate::search::BookResult;

/// How to render results to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Print only the file paths of matching books.
    pub bare: bool,
    /// Print paragraph text verbatim instead of word-wrapping it.
    pub no_wrap: bool,
    /// Banner rule and word-wrap width.
    pub width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            bare: false,
            no_wrap: false,
            width: 70,
        }
    }
}

/// Render one book's matches.
pub fn print_result(
    out: &mut impl Write,
    result: &BookResult,
    opts: &RenderOptions,
) -> io::Result<()> {
    if opts.bare {
        return writeln!(out, "{}", result.source.display());
    }

    let source = result.source.display().to_string();
    banner(
        out,
        &[result.title.as_str(), source.as_str()],
        &"-".repeat(opts.width),
    )?;
    for chapter in &result.chapters {
        banner(out, &[chapter.heading.as_str()], &"- ".repeat(opts.width / 2))?;
        for paragraph in &chapter.paragraphs {
            writeln!(out)?;
            if opts.no_wrap {
                writeln!(out, "{}", paragraph)?;
            } else {
                writeln!(out, "{}", wrap_text(paragraph, opts.width))?;
            }
        }
    }
    Ok(())
}

/// Report the books that failed, one line each.
pub fn print_errors(out: &mut impl Write, errors: &[(PathBuf, Error)]) -> io::Result<()> {
    for (path, error) in errors {
        writeln!(out, "*** Error in '{}': {}", path.display(), error)?;
    }
    Ok(())
}

fn banner(out: &mut impl Write, lines: &[&str], rule: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{rule}")?;
    Ok(())
}

/// Greedy word wrap: whitespace runs collapse to single spaces, words
/// longer than the width get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::ChapterGroup;

    fn sample_result() -> BookResult {
        BookResult {
            source: PathBuf::from("books/looking-glass.epub"),
            title: "Through the Looking-Glass".into(),
            chapters: vec![ChapterGroup {
                heading: "Jabberwocky".into(),
                paragraphs: vec!["He took his vorpal sword in hand".into()],
            }],
        }
    }

    fn render(opts: &RenderOptions) -> String {
        let mut out = Vec::new();
        print_result(&mut out, &sample_result(), opts).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bare_output() {
        let opts = RenderOptions {
            bare: true,
            ..Default::default()
        };
        assert_eq!(render(&opts), "books/looking-glass.epub\n");
    }

    #[test]
    fn test_full_output_layout() {
        let text = render(&RenderOptions::default());
        assert!(text.contains("Through the Looking-Glass"));
        assert!(text.contains("books/looking-glass.epub"));
        assert!(text.contains("Jabberwocky"));
        assert!(text.contains("He took his vorpal sword in hand"));
        assert!(text.contains(&"-".repeat(70)));
        assert!(text.contains(&"- ".repeat(35)));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("a b c", 80), "a b c");
        assert_eq!(wrap_text("one two three", 7), "one two\nthree");
        assert_eq!(wrap_text("  spaced \n out  ", 80), "spaced out");
        assert_eq!(wrap_text("", 80), "");
    }

    #[test]
    fn test_wrap_text_long_word() {
        assert_eq!(wrap_text("a extraordinarily b", 5), "a\nextraordinarily\nb");
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        // Five two-byte chars fit in width 5.
        assert_eq!(wrap_text("ééééé", 5), "ééééé");
    }

    #[test]
    fn test_print_errors() {
        let errors = vec![(
            PathBuf::from("bad.epub"),
            Error::InvalidEpub("no rootfile".into()),
        )];
        let mut out = Vec::new();
        print_errors(&mut out, &errors).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "*** Error in 'bad.epub': Invalid EPUB: no rootfile\n");
    }
}
