//! Multipart form data codec.
//!
//! Splits a `multipart/form-data` body into named text fields and named file
//! attachments. Part values pass through byte-for-byte: percent/plus decoding
//! is a form-urlencoded convention and is deliberately not applied here.

use std::collections::HashMap;
use std::fmt;

use memchr::memmem;

use crate::error::HttpError;
use crate::form::FormMap;

/// RFC 2046 keeps multipart boundaries at or under 70 characters.
const MAX_BOUNDARY_LEN: usize = 70;

/// Errors from boundary extraction or body framing. All render as
/// 400-class failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartError {
    /// No content type was supplied at all.
    ContentTypeRequired,
    /// The content type is not `multipart/form-data`.
    NotMultipart,
    /// The content type lacks a usable `boundary=` token.
    BoundaryRequired,
    /// The body does not open with the boundary preamble.
    PreambleUnmatched,
    /// The body does not close with the boundary postamble.
    PostambleUnmatched,
    /// A part has no blank line separating its headers from its value.
    MissingHeaderPart,
    /// A part's `Content-Disposition` is missing or names nothing.
    InvalidContentDisposition,
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentTypeRequired => write!(f, "content type required."),
            Self::NotMultipart => write!(f, "not a multipart."),
            Self::BoundaryRequired => write!(f, "boundary required."),
            Self::PreambleUnmatched => write!(f, "preamble unmatched."),
            Self::PostambleUnmatched => write!(f, "postamble unmatched."),
            Self::MissingHeaderPart => write!(f, "missing header part."),
            Self::InvalidContentDisposition => write!(f, "invalid content disposition."),
        }
    }
}

impl std::error::Error for MultipartError {}

impl From<MultipartError> for HttpError {
    fn from(err: MultipartError) -> Self {
        HttpError::BadRequest(err.to_string())
    }
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    filename: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl FilePart {
    /// The `filename` attribute from the part's Content-Disposition.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The part's own `Content-Type` header, when it sent one.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The raw file bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The file bytes as UTF-8 text, when they are valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One value slot in a [`FileMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileValue {
    /// A plain named upload.
    Single(FilePart),
    /// Uploads accumulated through the `name[]` convention, in arrival order.
    Many(Vec<FilePart>),
}

impl FileValue {
    /// The first upload, regardless of variant.
    #[must_use]
    pub fn first(&self) -> Option<&FilePart> {
        match self {
            Self::Single(part) => Some(part),
            Self::Many(parts) => parts.first(),
        }
    }

    /// All uploads as a slice; a `Single` is a slice of one.
    #[must_use]
    pub fn as_slice(&self) -> &[FilePart] {
        match self {
            Self::Single(part) => std::slice::from_ref(part),
            Self::Many(parts) => parts,
        }
    }
}

/// Uploaded files keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: HashMap<String, FileValue>,
}

impl FileMap {
    /// The first upload under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilePart> {
        self.entries.get(name).and_then(FileValue::first)
    }

    /// Every upload under `name`; empty when the name is absent.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[FilePart] {
        self.entries.get(name).map_or(&[], FileValue::as_slice)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, slot)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn set(&mut self, name: String, part: FilePart) {
        self.entries.insert(name, FileValue::Single(part));
    }

    fn push(&mut self, name: String, part: FilePart) {
        let slot = self
            .entries
            .entry(name)
            .or_insert_with(|| FileValue::Many(Vec::new()));
        match slot {
            FileValue::Many(parts) => parts.push(part),
            FileValue::Single(_) => *slot = FileValue::Many(vec![part]),
        }
    }
}

/// A fully parsed multipart body: text fields plus file attachments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    fields: FormMap,
    files: FileMap,
}

impl MultipartForm {
    /// The plain text fields.
    #[must_use]
    pub fn fields(&self) -> &FormMap {
        &self.fields
    }

    /// The file attachments.
    #[must_use]
    pub fn files(&self) -> &FileMap {
        &self.files
    }

    /// Shorthand for the first text value under `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Shorthand for the first upload under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name)
    }
}

/// Boundary-aware parser for one request's multipart body.
///
/// Construction validates the content type; [`Multipart::parse`] then frames
/// the body with the three delimiters derived from the boundary.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
}

impl Multipart {
    /// Extract and validate the boundary from a `Content-Type` header value.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, MultipartError> {
        let ctype = match content_type {
            Some(s) if !s.is_empty() => s,
            _ => return Err(MultipartError::ContentTypeRequired),
        };
        if !ctype.starts_with("multipart/form-data;") {
            return Err(MultipartError::NotMultipart);
        }
        let boundary = extract_boundary(ctype).ok_or(MultipartError::BoundaryRequired)?;
        Ok(Self { boundary })
    }

    /// The boundary token, without the leading dashes.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Split `body` into fields and files.
    pub fn parse(&self, body: &[u8]) -> Result<MultipartForm, MultipartError> {
        let preamble = format!("--{}\r\n", self.boundary).into_bytes();
        let separator = format!("\r\n--{}\r\n", self.boundary).into_bytes();
        let postamble = format!("\r\n--{}--\r\n", self.boundary).into_bytes();

        let fragments = split_on(body, &separator);
        let first = fragments.first().copied().unwrap_or_default();
        let last = fragments.last().copied().unwrap_or_default();
        if !first.starts_with(&preamble) {
            return Err(MultipartError::PreambleUnmatched);
        }
        if !last.ends_with(&postamble) {
            return Err(MultipartError::PostambleUnmatched);
        }

        let mut form = MultipartForm::default();
        let last_index = fragments.len() - 1;
        for (index, fragment) in fragments.into_iter().enumerate() {
            let start = if index == 0 { preamble.len() } else { 0 };
            let end_trim = if index == last_index { postamble.len() } else { 0 };
            let end = fragment.len().saturating_sub(end_trim);
            let part = if start < end { &fragment[start..end] } else { &[][..] };
            store_part(&mut form, part)?;
        }
        Ok(form)
    }
}

/// Parse one framed part and record it in the form.
fn store_part(form: &mut MultipartForm, part: &[u8]) -> Result<(), MultipartError> {
    let header_end = memmem::find(part, b"\r\n\r\n").ok_or(MultipartError::MissingHeaderPart)?;
    let header_block = String::from_utf8_lossy(&part[..header_end]);
    let value = &part[header_end + 4..];

    let disposition = header_block
        .split("\r\n")
        .find_map(|line| strip_header_prefix(line, "content-disposition:"))
        .ok_or(MultipartError::InvalidContentDisposition)?;
    let (name, filename) = parse_content_disposition(disposition)?;

    let Some(name) = name else {
        // A filename with no field name has no map key; drop the part.
        return Ok(());
    };

    if let Some(filename) = filename {
        let content_type = header_block
            .split("\r\n")
            .find_map(|line| strip_header_prefix(line, "content-type:"))
            .map(|rest| rest.trim().to_string());
        let part = FilePart {
            filename,
            content_type,
            data: value.to_vec(),
        };
        match name.strip_suffix("[]") {
            Some(base) => form.files.push(base.to_string(), part),
            None => form.files.set(name, part),
        }
    } else {
        let text = String::from_utf8_lossy(value).into_owned();
        match name.strip_suffix("[]") {
            Some(base) => form.fields.push(base, text),
            None => form.fields.set(name, text),
        }
    }
    Ok(())
}

/// Pull `name` and `filename` out of a Content-Disposition header body.
///
/// The disposition type must be `form-data`; attribute names are matched
/// case-insensitively and values may be quoted or bare. A disposition naming
/// neither attribute is an error.
fn parse_content_disposition(
    disposition: &str,
) -> Result<(Option<String>, Option<String>), MultipartError> {
    let mut pieces = disposition.split(';');
    let kind = pieces.next().unwrap_or("").trim();
    if !kind.eq_ignore_ascii_case("form-data") {
        return Err(MultipartError::InvalidContentDisposition);
    }

    let mut name = None;
    let mut filename = None;
    for piece in pieces {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').to_string();
        if key.eq_ignore_ascii_case("name") && name.is_none() {
            name = Some(value);
        } else if key.eq_ignore_ascii_case("filename") && filename.is_none() {
            filename = Some(value);
        }
    }

    if name.is_none() && filename.is_none() {
        return Err(MultipartError::InvalidContentDisposition);
    }
    Ok((name, filename))
}

/// Case-insensitive header-name match; returns the text after the prefix.
fn strip_header_prefix<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim_start())
    } else {
        None
    }
}

/// Find the `boundary=` token in a content-type value.
///
/// Accepts a quoted or bare token of `[-A-Za-z0-9_]` characters, capped at
/// the RFC 2046 length limit. The closing quote is optional, matching how
/// permissive clients write it.
fn extract_boundary(ctype: &str) -> Option<String> {
    let at = ctype.find("boundary=")?;
    let rest = &ctype[at + "boundary=".len()..];
    let rest = rest.strip_prefix(['"', '\'']).unwrap_or(rest);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let token = &rest[..end];
    if token.is_empty() || token.len() > MAX_BOUNDARY_LEN {
        return None;
    }
    Some(token.to_string())
}

/// Split `haystack` on every occurrence of `needle`, like `str::split`.
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut fragments = Vec::new();
    let mut start = 0;
    for hit in memmem::find_iter(haystack, needle) {
        fragments.push(&haystack[start..hit]);
        start = hit + needle.len();
    }
    fragments.push(&haystack[start..]);
    fragments
}
