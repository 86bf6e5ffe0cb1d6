//! EPUB container handling: package metadata and content-document scanning.

pub mod content;
pub mod package;

pub use content::{Node, NodeKind, NodeStream, decode_text, scan_nodes};
pub use package::EpubDocument;
