use std::collections::HashSet;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use bibsalvage_core::backend::attachment_name_matches;
use bibsalvage_core::{Attachment, BackendError, PdfBackend, PdfDocument};

/// Name trees deeper than this are treated as malformed.
const MAX_NAME_TREE_DEPTH: usize = 32;

/// lopdf-based implementation of [`PdfBackend`].
///
/// Keeps the PDF container dependency out of the extraction crates: they only
/// see [`PdfDocument`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let bytes = std::fs::read(path)?;
        self.open_bytes(&bytes)
    }

    fn open_bytes(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError> {
        Ok(Box::new(LopdfDocument::load(bytes)?))
    }
}

/// An opened PDF.
///
/// An encrypted file lopdf cannot read is still opened, as a locked handle:
/// it reports itself encrypted, has no attachments and refuses text
/// extraction.
pub struct LopdfDocument {
    inner: Option<Document>,
    encrypted: bool,
}

impl LopdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, BackendError> {
        match Document::load_mem(bytes) {
            Ok(inner) => Ok(Self {
                encrypted: inner.is_encrypted(),
                inner: Some(inner),
            }),
            Err(e) if has_encrypt_marker(bytes) => {
                tracing::debug!(error = %e, "opening encrypted PDF as locked");
                Ok(Self {
                    inner: None,
                    encrypted: true,
                })
            }
            Err(e) => Err(BackendError::OpenError(e.to_string())),
        }
    }

    fn search(&self, doc: &Document, hint: &str) -> Result<Option<Attachment>, BackendError> {
        if let Some(tree) = embedded_files_tree(doc) {
            let mut visited = HashSet::new();
            if let Some(attachment) = find_in_name_tree(doc, tree, hint, &mut visited, 0)? {
                return Ok(Some(attachment));
            }
        }
        find_in_annotations(doc, hint)
    }
}

impl PdfDocument for LopdfDocument {
    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn first_page_text(&self) -> Result<String, BackendError> {
        let doc = match &self.inner {
            Some(doc) if !doc.is_encrypted() => doc,
            _ => return Err(BackendError::Encrypted),
        };
        let Some(&first) = doc.get_pages().keys().next() else {
            return Ok(String::new());
        };
        doc.extract_text(&[first])
            .map_err(|e| BackendError::ExtractionError(e.to_string()))
    }

    fn find_attachment(&self, hint: &str) -> Result<Option<Attachment>, BackendError> {
        if self.encrypted {
            return Ok(None);
        }
        match &self.inner {
            Some(doc) => self.search(doc, hint),
            None => Ok(None),
        }
    }
}

fn has_encrypt_marker(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).and_then(|o| o.as_dict().ok())
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|o| resolve(doc, o))
}

/// `/Root /Names /EmbeddedFiles`, when present.
fn embedded_files_tree(doc: &Document) -> Option<&Dictionary> {
    let catalog = doc.catalog().ok()?;
    let names = dict_entry(doc, catalog, b"Names")?.as_dict().ok()?;
    dict_entry(doc, names, b"EmbeddedFiles")?.as_dict().ok()
}

fn find_in_name_tree(
    doc: &Document,
    node: &Dictionary,
    hint: &str,
    visited: &mut HashSet<ObjectId>,
    depth: usize,
) -> Result<Option<Attachment>, BackendError> {
    if depth > MAX_NAME_TREE_DEPTH {
        tracing::debug!("embedded file name tree too deep");
        return Ok(None);
    }

    if let Some(Ok(names)) = dict_entry(doc, node, b"Names").map(Object::as_array) {
        for pair in names.chunks(2) {
            let [key, spec] = pair else {
                continue;
            };
            let Some(spec) = resolve_dict(doc, spec) else {
                continue;
            };
            let key = resolve(doc, key).and_then(decode_text);
            if let Some(attachment) = read_filespec(doc, spec, key, hint)? {
                return Ok(Some(attachment));
            }
        }
    }

    if let Some(Ok(kids)) = dict_entry(doc, node, b"Kids").map(Object::as_array) {
        for kid in kids {
            if let Object::Reference(id) = kid {
                if !visited.insert(*id) {
                    tracing::debug!(?id, "name tree node visited twice");
                    continue;
                }
            }
            let Some(kid) = resolve_dict(doc, kid) else {
                continue;
            };
            if let Some(attachment) = find_in_name_tree(doc, kid, hint, visited, depth + 1)? {
                return Ok(Some(attachment));
            }
        }
    }

    Ok(None)
}

fn find_in_annotations(doc: &Document, hint: &str) -> Result<Option<Attachment>, BackendError> {
    for page_id in doc.get_pages().into_values() {
        let Some(page) = doc.get_object(page_id).ok().and_then(|o| o.as_dict().ok()) else {
            continue;
        };
        let Some(Ok(annots)) = dict_entry(doc, page, b"Annots").map(Object::as_array) else {
            continue;
        };
        for annot in annots {
            let Some(annot) = resolve_dict(doc, annot) else {
                continue;
            };
            let is_attachment = annot
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|name| name == b"FileAttachment");
            if !is_attachment {
                continue;
            }
            let Some(spec) = dict_entry(doc, annot, b"FS").and_then(|o| o.as_dict().ok()) else {
                continue;
            };
            if let Some(attachment) = read_filespec(doc, spec, None, hint)? {
                return Ok(Some(attachment));
            }
        }
    }
    Ok(None)
}

/// Read a file specification if one of its names matches `hint`.
///
/// Candidate names are `/UF`, `/F` and the name-tree key, in that order.
fn read_filespec(
    doc: &Document,
    spec: &Dictionary,
    tree_key: Option<String>,
    hint: &str,
) -> Result<Option<Attachment>, BackendError> {
    let name = [b"UF".as_slice(), b"F".as_slice()]
        .into_iter()
        .filter_map(|key| dict_entry(doc, spec, key).and_then(decode_text))
        .chain(tree_key)
        .find(|name| attachment_name_matches(name, hint));
    let Some(name) = name else {
        return Ok(None);
    };

    let Some(files) = dict_entry(doc, spec, b"EF").and_then(|o| o.as_dict().ok()) else {
        tracing::debug!(name = %name, "file specification without embedded stream");
        return Ok(None);
    };
    let stream = [b"UF".as_slice(), b"F".as_slice()]
        .into_iter()
        .find_map(|key| dict_entry(doc, files, key).and_then(|o| o.as_stream().ok()));
    let Some(stream) = stream else {
        return Ok(None);
    };

    let data = stream_bytes(stream)?;
    tracing::debug!(name = %name, bytes = data.len(), "found embedded file");
    Ok(Some(Attachment { name, data }))
}

/// Stream content, decompressed when a filter is declared.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::ExtractionError(format!("failed to decode embedded file: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, else UTF-8, else Latin-1).
fn decode_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => {
            let text = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
                let units: Vec<u16> = utf16
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).ok()?
            } else {
                match std::str::from_utf8(bytes) {
                    Ok(s) => s.to_string(),
                    Err(_) => bytes.iter().map(|&b| b as char).collect(),
                }
            };
            Some(text)
        }
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
