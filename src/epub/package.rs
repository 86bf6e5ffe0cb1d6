//! EPUB package resolution (container.xml and OPF).
//!
//! An EPUB is a ZIP archive whose `META-INF/container.xml` points at an OPF
//! package document. The OPF carries the Dublin Core metadata, a manifest
//! mapping ids to file hrefs, and the spine: the ordered list of content
//! documents that makes up the book's reading order.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// One opened EPUB archive, with its title and spine resolved.
///
/// The archive handle lives inside the document and is released when the
/// document is dropped, whether or not the search succeeded.
pub struct EpubDocument {
    archive: ZipArchive<File>,
    /// Where the archive was opened from.
    pub source: PathBuf,
    /// The first `dc:title`, or the file name if the OPF has none.
    pub title: String,
    /// Archive entry names of the content documents, in reading order.
    pub spine: Vec<String>,
}

impl EpubDocument {
    /// Open an EPUB and resolve its container and OPF metadata.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = path.as_ref().to_path_buf();
        let file = File::open(&source)?;
        let mut archive = ZipArchive::new(file)?;

        let container = read_archive_file(&mut archive, "META-INF/container.xml")?;
        let opf_path = parse_container(&container)?;
        let opf_dir = Path::new(&opf_path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let opf_content = read_archive_file(&mut archive, &opf_path)?;
        let opf = parse_opf(&opf_content)?;

        let title = match opf.title {
            Some(title) => title,
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        };

        let mut spine = Vec::with_capacity(opf.spine_ids.len());
        for id in &opf.spine_ids {
            let href = opf.manifest.get(id).ok_or_else(|| {
                Error::InvalidEpub(format!("spine itemref {:?} missing from manifest", id))
            })?;
            spine.push(resolve_href(&opf_dir, href));
        }

        Ok(Self {
            archive,
            source,
            title,
            spine,
        })
    }

    /// Read one spine document's bytes out of the archive.
    pub fn read_document(&mut self, entry: &str) -> Result<Vec<u8>> {
        read_archive_file_bytes(&mut self.archive, entry)
    }
}

/// Parsed OPF package data.
struct OpfData {
    title: Option<String>,
    /// Maps manifest id -> href
    manifest: HashMap<String, String>,
    spine_ids: Vec<String>,
}

/// Parse META-INF/container.xml and return the OPF path.
fn parse_container(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "no rootfile found in container.xml".into(),
    ))
}

/// Parse the OPF package document: title, manifest, and spine.
fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut title: Option<String> = None;
    let mut manifest: HashMap<String, String> = HashMap::new();
    let mut spine_ids: Vec<String> = Vec::new();

    let mut in_metadata = false;
    let mut in_title = false;
    let mut title_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = true,
                // Only the first dc:title counts.
                b"title" if in_metadata && title.is_none() => {
                    in_title = true;
                    title_text.clear();
                }
                b"item" => add_manifest_item(&e, &mut manifest)?,
                b"itemref" => add_spine_ref(&e, &mut spine_ids)?,
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"item" => add_manifest_item(&e, &mut manifest)?,
                b"itemref" => add_spine_ref(&e, &mut spine_ids)?,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_title {
                    title_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_title
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    title_text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = false,
                b"title" if in_title => {
                    in_title = false;
                    let trimmed = title_text.trim();
                    if !trimmed.is_empty() {
                        title = Some(trimmed.to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    if manifest.is_empty() && spine_ids.is_empty() {
        return Err(Error::InvalidEpub("OPF has no manifest or spine".into()));
    }

    Ok(OpfData {
        title,
        manifest,
        spine_ids,
    })
}

fn add_manifest_item(
    e: &quick_xml::events::BytesStart<'_>,
    manifest: &mut HashMap<String, String>,
) -> Result<()> {
    let mut id = String::new();
    let mut href = String::new();
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"id" => id = String::from_utf8(attr.value.to_vec())?,
            b"href" => href = String::from_utf8(attr.value.to_vec())?,
            _ => {}
        }
    }
    if !id.is_empty() {
        manifest.insert(id, href);
    }
    Ok(())
}

fn add_spine_ref(
    e: &quick_xml::events::BytesStart<'_>,
    spine_ids: &mut Vec<String>,
) -> Result<()> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"idref" {
            spine_ids.push(String::from_utf8(attr.value.to_vec())?);
        }
    }
    Ok(())
}

/// Resolve a manifest href relative to the OPF directory into an archive
/// entry name: strip any fragment, percent-decode, normalize `.`/`..`.
fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let decoded = percent_encoding::percent_decode_str(href).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    if !base_dir.is_empty() {
        segments.extend(base_dir.split('/'));
    }
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn read_archive_file(archive: &mut ZipArchive<File>, path: &str) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, path)?;
    let bytes = strip_bom(&bytes);
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn read_archive_file_bytes(archive: &mut ZipArchive<File>, path: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Strip UTF-8 BOM if present.
fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Extract local name from a namespaced XML name (e.g., "dc:title" -> "title").
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
pub(crate) fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{00A0}".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
