//! Text extraction from Office Open XML documents
//!
//! Both supported formats are zip packages of XML parts. This module opens
//! the package, reads parts, and dispatches to the format-specific parser.

pub mod docx;
pub mod xlsx;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::debug;
use quick_xml::events::BytesStart;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::utils::file_utils::DocumentKind;

/// Error raised while extracting text from a document
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a valid document package: {0}")]
    Archive(#[from] ZipError),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("document package has no {0} part")]
    MissingPart(String),

    #[error("unsupported document type: {0}")]
    Unsupported(String),

    #[error("document contains no text")]
    Empty,
}

/// Extract the plain text of a supported document
///
/// # Arguments
///
/// * `file_path` - Path to a `.docx` or `.xlsx` file
///
/// # Returns
///
/// The extracted text, or an error if the file could not be read, is not a
/// supported format, or yielded no text at all
pub fn extract_text(file_path: &Path) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_path(file_path).ok_or_else(|| {
        ExtractError::Unsupported(
            file_path
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default(),
        )
    })?;

    let reader = BufReader::new(File::open(file_path)?);
    let text = match kind {
        DocumentKind::Docx => docx::read_docx(reader)?,
        DocumentKind::Xlsx => xlsx::read_xlsx(reader)?,
    };

    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    debug!("Extracted {} characters from {}", text.chars().count(), file_path.display());
    Ok(text)
}

/// An opened OOXML zip package
pub(crate) struct Package<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    pub(crate) fn new(reader: R) -> Result<Self, ExtractError> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Read a part that every valid package of this kind must contain
    pub(crate) fn read_part(&mut self, name: &str) -> Result<String, ExtractError> {
        self.read_optional_part(name)?
            .ok_or_else(|| ExtractError::MissingPart(name.to_string()))
    }

    pub(crate) fn read_optional_part(&mut self, name: &str) -> Result<Option<String>, ExtractError> {
        let mut part = match self.archive.by_name(name) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut xml = String::new();
        part.read_to_string(&mut xml)?;

        debug!("Read package part {} ({} bytes)", name, xml.len());
        Ok(Some(xml.trim_start_matches('\u{feff}').to_string()))
    }
}

/// Look up an attribute by local name, ignoring its namespace prefix
pub(crate) fn attribute(element: &BytesStart, local_name: &[u8]) -> Result<Option<String>, ExtractError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn package_with(parts: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer.start_file(*name, zip::write::FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        Cursor::new(cursor.into_inner())
    }

    #[test]
    fn test_read_parts() {
        let mut package = Package::new(package_with(&[("a.xml", "\u{feff}<a/>")])).unwrap();
        assert_eq!(package.read_part("a.xml").unwrap(), "<a/>");
        assert!(package.read_optional_part("b.xml").unwrap().is_none());
        assert!(matches!(package.read_part("b.xml"), Err(ExtractError::MissingPart(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let result = Package::new(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(ExtractError::Archive(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = extract_text(Path::new("notes.pdf"));
        assert!(matches!(result, Err(ExtractError::Unsupported(ext)) if ext == "pdf"));
    }
}
