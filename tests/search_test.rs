//! End-to-end tests over real EPUB archives built in temp directories.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use epubfind::{Error, PhraseSet, search_book, search_path};

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Write an EPUB with the given OPF and content documents (entry name,
/// bytes), plus the standard mimetype and container.xml entries.
fn write_epub_with_opf(path: &Path, opf: &str, documents: &[(&str, &str)]) {
    let file = File::create(path).expect("create epub file");
    let mut zip = ZipWriter::new(file);
    let stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default();

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(CONTAINER_XML.as_bytes()).unwrap();

    zip.start_file("OEBPS/content.opf", deflated).unwrap();
    zip.write_all(opf.as_bytes()).unwrap();

    for (name, content) in documents {
        zip.start_file(format!("OEBPS/{name}"), deflated).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
}

/// Write an EPUB with one chapter document per body, in spine order.
fn write_epub(path: &Path, title: Option<&str>, bodies: &[&str]) {
    let mut manifest = String::new();
    let mut spine = String::new();
    for i in 0..bodies.len() {
        manifest.push_str(&format!(
            r#"<item id="ch{i}" href="text/ch{i}.xhtml" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="ch{i}"/>"#));
    }
    let title_xml = title
        .map(|t| format!("<dc:title>{t}</dc:title>"))
        .unwrap_or_default();
    let opf = format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">{title_xml}</metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
    );

    let documents: Vec<(String, String)> = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            (
                format!("text/ch{i}.xhtml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>chapter</title></head>
<body>{body}</body>
</html>"#
                ),
            )
        })
        .collect();
    let documents: Vec<(&str, &str)> = documents
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();

    write_epub_with_opf(path, &opf, &documents);
}

fn phrases(list: &[&str]) -> PhraseSet {
    PhraseSet::compile(list).expect("compile phrases")
}

#[test]
fn test_search_single_book() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(
        &path,
        Some("A Test Book"),
        &[
            "<h1>Intro</h1><p>no match here</p>",
            "<h1>Chapter One</h1><p>the cat sat</p><p>irrelevant</p>\
             <h1>Chapter Two</h1><p>the cat ran</p>",
        ],
    );

    let result = search_book(&path, &phrases(&["cat"]))
        .unwrap()
        .expect("book should match");

    assert_eq!(result.title, "A Test Book");
    assert_eq!(result.source, path);
    assert_eq!(result.chapters.len(), 2);
    assert_eq!(result.chapters[0].heading, "Chapter One");
    assert_eq!(result.chapters[0].paragraphs, vec!["the cat sat"]);
    assert_eq!(result.chapters[1].heading, "Chapter Two");
    assert_eq!(result.chapters[1].paragraphs, vec!["the cat ran"]);
}

#[test]
fn test_no_match_yields_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(&path, Some("A Test Book"), &["<h1>One</h1><p>plain text</p>"]);

    let result = search_book(&path, &phrases(&["zeppelin"])).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_conjunctive_phrases() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(
        &path,
        Some("A Test Book"),
        &["<h1>One</h1><p>the cat wore a hat</p><p>the cat alone</p>"],
    );

    let result = search_book(&path, &phrases(&["cat", "hat"]))
        .unwrap()
        .expect("conjunction should match");
    assert_eq!(result.chapters[0].paragraphs, vec!["the cat wore a hat"]);
}

#[test]
fn test_paragraph_before_heading_groups_under_title() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(
        &path,
        Some("A Test Book"),
        &["<p>early cat</p><h1>One</h1><p>nothing</p>"],
    );

    let result = search_book(&path, &phrases(&["cat"]))
        .unwrap()
        .expect("should match");
    assert_eq!(result.chapters.len(), 1);
    assert_eq!(result.chapters[0].heading, "A Test Book");
    assert_eq!(result.chapters[0].paragraphs, vec!["early cat"]);
}

#[test]
fn test_title_falls_back_to_file_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("untitled.epub");
    write_epub(&path, None, &["<h1>One</h1><p>a cat</p>"]);

    let result = search_book(&path, &phrases(&["cat"]))
        .unwrap()
        .expect("should match");
    assert_eq!(result.title, "untitled.epub");
}

#[test]
fn test_bad_spine_document_does_not_suppress_other_matches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(
        &path,
        Some("A Test Book"),
        &[
            // Unclosed comment: scanning this document fails partway in.
            "<!-- broken <p>the cat hides here</p>",
            "<h1>Good Chapter</h1><p>the cat sat</p>",
        ],
    );

    let result = search_book(&path, &phrases(&["cat"]))
        .unwrap()
        .expect("other documents should still match");
    assert_eq!(result.chapters.len(), 1);
    assert_eq!(result.chapters[0].heading, "Good Chapter");
}

#[test]
fn test_spine_idref_missing_from_manifest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Bad</dc:title></metadata>
  <manifest><item id="ch0" href="ch0.xhtml" media-type="application/xhtml+xml"/></manifest>
  <spine><itemref idref="ghost"/></spine>
</package>"#;
    write_epub_with_opf(&path, opf, &[("ch0.xhtml", "<p>text</p>")]);

    let err = search_book(&path, &phrases(&["text"])).unwrap_err();
    assert!(matches!(err, Error::InvalidEpub(_)));
}

#[test]
fn test_directory_batch_with_malformed_archive() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("a-good.epub");
    write_epub(&good, Some("Good Book"), &["<h1>One</h1><p>the cat sat</p>"]);

    let bad = dir.path().join("b-bad.epub");
    fs::write(&bad, b"this is not a zip archive").unwrap();

    // Non-EPUB files are not searched at all.
    fs::write(dir.path().join("notes.txt"), b"a cat in a txt file").unwrap();

    let outcome = search_path(dir.path(), &phrases(&["cat"])).unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].title, "Good Book");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].0, bad);
}

#[test]
fn test_directory_search_recurses_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("shelf");
    fs::create_dir(&sub).unwrap();

    write_epub(
        &dir.path().join("outer.epub"),
        Some("Outer"),
        &["<p>a cat here</p>"],
    );
    write_epub(
        &sub.join("inner.epub"),
        Some("Inner"),
        &["<p>a cat there</p>"],
    );

    let outcome = search_path(dir.path(), &phrases(&["cat"])).unwrap();
    let titles: Vec<&str> = outcome.results.iter().map(|r| r.title.as_str()).collect();
    // Sorted by path: "outer.epub" comes before "shelf/inner.epub".
    assert_eq!(titles, vec!["Outer", "Inner"]);
    assert!(outcome.errors.is_empty());
}

#[test]
fn test_file_root_without_epub_extension_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.txt");
    fs::write(&path, b"not an ebook").unwrap();

    let err = search_path(&path, &phrases(&["cat"])).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_empty_directory_is_empty_outcome() {
    let dir = TempDir::new().unwrap();
    let outcome = search_path(dir.path(), &phrases(&["cat"])).unwrap();
    assert!(outcome.results.is_empty());
    assert!(outcome.errors.is_empty());
}

#[test]
fn test_regex_phrase_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(
        &path,
        Some("Jabberwocky"),
        &["<h1>One</h1><p>the uffish thought</p><p>the slithy tove</p>"],
    );

    let result = search_book(&path, &phrases(&["beamish|uffish"]))
        .unwrap()
        .expect("alternation should match");
    assert_eq!(result.chapters[0].paragraphs, vec!["the uffish thought"]);
}

#[test]
fn test_whitespace_and_case_insensitive_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    write_epub(
        &path,
        Some("A Test Book"),
        &["<h1>One</h1><p>Things would Suddenly\n   Vanish away.</p>"],
    );

    let result = search_book(&path, &phrases(&["suddenly vanish"]))
        .unwrap()
        .expect("should match across whitespace");
    assert_eq!(result.chapters.len(), 1);
}

#[test]
fn test_spine_href_resolved_relative_to_opf() {
    // Manifest hrefs live next to the OPF under OEBPS/, with percent
    // encoding in the entry name.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Spaced</dc:title></metadata>
  <manifest>
    <item id="ch0" href="my%20chapter.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="ch0"/></spine>
</package>"#;
    write_epub_with_opf(
        &path,
        opf,
        &[("my chapter.xhtml", "<p>the cat sat</p>")],
    );

    let result = search_book(&path, &phrases(&["cat"]))
        .unwrap()
        .expect("resolved href should be readable");
    assert_eq!(result.chapters.len(), 1);
}
