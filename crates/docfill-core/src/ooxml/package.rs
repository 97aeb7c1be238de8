//! OPC package (ZIP container) access
//!
//! Every entry is read into memory on open and written back in its original
//! order and compression on save, so parts the filler never touches come out
//! unchanged.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocfillError;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocfillError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocfillError::ReadError(format!("Not a valid DOCX package: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(|e| {
                DocfillError::ReadError(format!("Failed to read package entry {}: {}", i, e))
            })?;

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(|e| {
                DocfillError::ReadError(format!("Failed to inflate {}: {}", file.name(), e))
            })?;

            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    /// Part names are stored without a leading slash, e.g. `word/document.xml`
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.trim_start_matches('/');
        self.entries
            .iter()
            .find(|e| !e.is_dir && e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replace a part's content, adding the part if it does not exist
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        let name = name.trim_start_matches('/');
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocfillError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                writer
                    .add_directory(entry.name.as_str(), options)
                    .map_err(|e| write_error(&entry.name, e))?;
                continue;
            }

            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| write_error(&entry.name, e))?;
            writer
                .write_all(&entry.data)
                .map_err(|e| write_error(&entry.name, e))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocfillError::WriteError(format!("Failed to finish package: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

fn write_error(name: &str, err: impl std::fmt::Display) -> DocfillError {
    DocfillError::WriteError(format!("Failed to write {}: {}", name, err))
}

/// Resolve a relationship target against the directory of its source part.
///
/// `("word/document.xml", "header1.xml")` → `word/header1.xml`,
/// `("word/document.xml", "/word/footer1.xml")` → `word/footer1.xml`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part
        .trim_start_matches('/')
        .split('/')
        .collect();
    segments.pop();

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Relationships part of a source part: `word/document.xml` → `word/_rels/document.xml.rels`
pub fn rels_part_name(source_part: &str) -> String {
    let source = source_part.trim_start_matches('/');
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{source}.rels"),
    }
}
