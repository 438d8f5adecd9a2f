// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation document serialization and the file-backed gateway.
//!
//! This module handles reading and writing a target's annotations as a
//! YAML or JSON document, and stores saves into one document per target
//! inside a directory.

use super::gateway::{generate_id, PersistenceError, PersistenceGateway};
use super::wire::{AnnotationRecord, AuthorRecord};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// All stored annotations of one target image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub target: String,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

impl AnnotationDocument {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            Some("json") => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }
}

/// Export a document to YAML format.
pub fn export_yaml(data: &AnnotationDocument, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Export a document to JSON format.
pub fn export_json(data: &AnnotationDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Import a document from YAML format.
pub fn import_yaml(path: &Path) -> Result<AnnotationDocument> {
    let yaml = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import a document from JSON format.
pub fn import_json(path: &Path) -> Result<AnnotationDocument> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

/// Write a document in the format named by the path's extension.
pub fn export_document(data: &AnnotationDocument, path: &Path) -> Result<()> {
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Yaml) => export_yaml(data, path),
        Some(DocumentFormat::Json) => export_json(data, path),
        None => bail!("Unsupported file extension: {}", path.display()),
    }
}

/// Read a document in the format named by the path's extension.
pub fn import_document(path: &Path) -> Result<AnnotationDocument> {
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Yaml) => import_yaml(path),
        Some(DocumentFormat::Json) => import_json(path),
        None => bail!("Unsupported file extension: {}", path.display()),
    }
}

/// Stores each target as `<dir>/<target>.<ext>`.
pub struct FileGateway {
    dir: PathBuf,
    format: DocumentFormat,
    author: Option<String>,
    /// Serializes read-modify-write of documents across save threads.
    lock: Mutex<u64>,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>, format: DocumentFormat, author: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            format,
            author,
            lock: Mutex::new(0),
        }
    }

    pub fn document_path(&self, target: &str) -> PathBuf {
        // Keep targets from escaping the store directory
        let name: String = target
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.{}", name, self.format.extension()))
    }

    fn read(&self, target: &str) -> Result<AnnotationDocument> {
        let path = self.document_path(target);
        if !path.exists() {
            return Ok(AnnotationDocument::new(target));
        }
        import_document(&path)
    }
}

impl PersistenceGateway for FileGateway {
    fn load_annotations(&self, target: &str) -> Result<Vec<AnnotationRecord>, PersistenceError> {
        self.read(target)
            .map(|doc| doc.annotations)
            .map_err(|e| PersistenceError::Malformed(format!("{:#}", e)))
    }

    fn save_annotation(
        &self,
        target: &str,
        annotation: &AnnotationRecord,
    ) -> Result<AnnotationRecord, PersistenceError> {
        let mut counter = self
            .lock
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        *counter += 1;

        let mut document = self
            .read(target)
            .map_err(|e| PersistenceError::Storage(format!("{:#}", e)))?;

        let mut record = annotation.clone();
        record.id = Some(generate_id(*counter));
        record.created_at = Some(Utc::now());
        if let Some(author) = &self.author {
            record.author = Some(AuthorRecord::Id(author.clone()));
        }
        document.annotations.push(record.clone());

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        export_document(&document, &self.document_path(target))
            .map_err(|e| PersistenceError::Storage(format!("{:#}", e)))?;

        log::debug!(
            "Stored annotation in {} ({} total)",
            self.document_path(target).display(),
            document.annotations.len()
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Annotation, Geometry, LocalKey, Point};
    use crate::models::style::Style;

    fn freehand_record() -> AnnotationRecord {
        AnnotationRecord::from_annotation(&Annotation::new(
            LocalKey(1),
            Geometry::Freehand {
                points: vec![Point::new(1.0, 1.0), Point::new(2.0, 3.0)],
            },
            Style::default(),
        ))
    }

    #[test]
    fn test_yaml_and_json_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = AnnotationDocument::new("shot-42");
        doc.annotations.push(freehand_record());

        for name in ["doc.yaml", "doc.json"] {
            let path = dir.path().join(name);
            export_document(&doc, &path).unwrap();
            let back = import_document(&path).unwrap();
            assert_eq!(back.target, "shot-42");
            assert_eq!(back.annotations, doc.annotations);
        }

        assert!(export_document(&doc, &dir.path().join("doc.txt")).is_err());
    }

    #[test]
    fn test_file_gateway_appends_per_target() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::new(dir.path().join("store"), DocumentFormat::Json, Some("qa".into()));

        assert!(gateway.load_annotations("shot-1").unwrap().is_empty());

        let saved = gateway.save_annotation("shot-1", &freehand_record()).unwrap();
        gateway.save_annotation("shot-1", &freehand_record()).unwrap();
        gateway.save_annotation("shot-2", &freehand_record()).unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.author, Some(AuthorRecord::Id("qa".to_string())));

        let loaded = gateway.load_annotations("shot-1").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, saved.id);
        assert_eq!(gateway.load_annotations("shot-2").unwrap().len(), 1);
    }

    #[test]
    fn test_target_names_are_sanitized() {
        let gateway = FileGateway::new("/tmp/store", DocumentFormat::Yaml, None);
        assert_eq!(
            gateway.document_path("../etc/passwd"),
            PathBuf::from("/tmp/store/___etc_passwd.yaml")
        );
    }

    #[test]
    fn test_corrupt_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::new(dir.path(), DocumentFormat::Json, None);
        std::fs::write(gateway.document_path("bad"), "{ not json").unwrap();
        assert!(matches!(
            gateway.load_annotations("bad"),
            Err(PersistenceError::Malformed(_))
        ));
    }
}
