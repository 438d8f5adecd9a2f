// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Persistence gateway.
//!
//! The narrow interface to wherever annotations are stored: list the
//! annotations of a target image, and store one newly finalized
//! annotation. There is deliberately no delete operation; local deletion
//! does not reach storage.

use super::wire::{AnnotationRecord, AuthorRecord};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub trait PersistenceGateway: Send + Sync {
    /// Stored records for `target`, in paint order.
    fn load_annotations(&self, target: &str) -> Result<Vec<AnnotationRecord>, PersistenceError>;

    /// Store `annotation` and return the canonical record with the
    /// assigned id, author and creation time.
    fn save_annotation(
        &self,
        target: &str,
        annotation: &AnnotationRecord,
    ) -> Result<AnnotationRecord, PersistenceError>;
}

/// Load a target's records, treating any failure as an empty scene.
pub fn load_or_empty(gateway: &dyn PersistenceGateway, target: &str) -> Vec<AnnotationRecord> {
    match gateway.load_annotations(target) {
        Ok(records) => {
            log::info!("Fetched {} annotation records for {}", records.len(), target);
            records
        }
        Err(e) => {
            log::warn!("Could not load annotations for {}, starting empty: {}", target, e);
            Vec::new()
        }
    }
}

/// Ids of the form `<millis hex>-<counter>`, unique within one process.
pub fn generate_id(counter: u64) -> String {
    format!("{:x}-{:04x}", Utc::now().timestamp_millis(), counter)
}

/// Keeps annotations in process memory. Used when no server or store is
/// configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    targets: Mutex<HashMap<String, Vec<AnnotationRecord>>>,
    author: Option<String>,
    saved: Mutex<u64>,
}

impl MemoryGateway {
    pub fn new(author: Option<String>) -> Self {
        Self {
            author,
            ..Self::default()
        }
    }

    /// Pre-populate a target.
    pub fn with_records(self, target: &str, records: Vec<AnnotationRecord>) -> Self {
        if let Ok(mut targets) = self.targets.lock() {
            targets.insert(target.to_string(), records);
        }
        self
    }

    pub fn stored(&self, target: &str) -> Vec<AnnotationRecord> {
        self.targets
            .lock()
            .map(|targets| targets.get(target).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load_annotations(&self, target: &str) -> Result<Vec<AnnotationRecord>, PersistenceError> {
        Ok(self.stored(target))
    }

    fn save_annotation(
        &self,
        target: &str,
        annotation: &AnnotationRecord,
    ) -> Result<AnnotationRecord, PersistenceError> {
        let counter = {
            let mut saved = self
                .saved
                .lock()
                .map_err(|e| PersistenceError::Storage(e.to_string()))?;
            *saved += 1;
            *saved
        };

        let mut record = annotation.clone();
        record.id = Some(generate_id(counter));
        record.created_at = Some(Utc::now());
        if let Some(author) = &self.author {
            record.author = Some(AuthorRecord::Id(author.clone()));
        }

        let mut targets = self
            .targets
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        targets.entry(target.to_string()).or_default().push(record.clone());
        Ok(record)
    }
}
