//! Content-document scanning: headings and paragraphs in document order.
//!
//! Spine documents are XHTML, but plenty of EPUBs in the wild are sloppy
//! about it, so the reader runs with end-name checking relaxed. Only
//! `p`/`h1`/`h2`/`h3` elements become nodes; markup nested inside one of
//! them is flattened into its text.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::epub::package::{local_name, resolve_entity};

/// Whether a node was extracted from a heading or a paragraph element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Heading,
    Paragraph,
}

/// One heading or paragraph, with its inner markup flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
}

impl Node {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Heading,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Paragraph,
            text: text.into(),
        }
    }
}

/// Decode a content document's bytes.
///
/// Tries UTF-8 first (the EPUB default), then the encoding declared in the
/// XML prolog, then falls back to Windows-1252 (common in old ebooks).
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return text;
    }

    if let Some(label) = declared_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes())
    {
        let (text, _, _) = encoding.decode(bytes);
        return text;
    }

    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text
}

/// Pull the encoding label out of an XML declaration, if there is one.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head);
    let start = head.find("encoding=")? + "encoding=".len();
    let rest = &head[start..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Scan a decoded content document into a stream of [`Node`]s.
///
/// Single pass, document order. A malformed document yields one `Err` and
/// then the stream ends; nodes already yielded stay valid.
pub fn scan_nodes(html: &str) -> NodeStream<'_> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    NodeStream {
        reader,
        done: false,
    }
}

/// Iterator over the headings and paragraphs of one content document.
pub struct NodeStream<'a> {
    reader: Reader<&'a [u8]>,
    done: bool,
}

fn classify(tag: &[u8]) -> Option<NodeKind> {
    if tag.eq_ignore_ascii_case(b"p") {
        Some(NodeKind::Paragraph)
    } else if tag.eq_ignore_ascii_case(b"h1")
        || tag.eq_ignore_ascii_case(b"h2")
        || tag.eq_ignore_ascii_case(b"h3")
    {
        Some(NodeKind::Heading)
    } else {
        None
    }
}

impl Iterator for NodeStream<'_> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // (kind, element tag, accumulated text) of the open node, if any.
        let mut capture: Option<(NodeKind, Vec<u8>, String)> = None;

        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let local = local_name(e.name().as_ref()).to_ascii_lowercase();
                    if capture.is_none()
                        && let Some(kind) = classify(&local)
                    {
                        capture = Some((kind, local, String::new()));
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some((_, _, text)) = capture.as_mut() {
                        text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some((_, _, text)) = capture.as_mut() {
                        text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    if let Some((_, _, text)) = capture.as_mut()
                        && let Some(resolved) =
                            resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                    {
                        text.push_str(&resolved);
                    }
                }
                Ok(Event::End(e)) => {
                    let local = local_name(e.name().as_ref()).to_ascii_lowercase();
                    if let Some((_, tag, _)) = capture.as_ref()
                        && *tag == local
                    {
                        let (kind, _, text) = capture.take().expect("capture checked above");
                        return Some(Ok(Node { kind, text }));
                    }
                }
                Ok(Event::Eof) => {
                    self.done = true;
                    // Salvage an element the document never closed.
                    return capture
                        .take()
                        .filter(|(_, _, text)| !text.trim().is_empty())
                        .map(|(kind, _, text)| Ok(Node { kind, text }));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::Xml(e)));
                }
                _ => {}
            }
        }
    }
}
