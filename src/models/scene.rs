// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene state management.
//!
//! The scene owns the finalized annotations for one target image in paint
//! order (later entries are on top) and a weak reference to the selected
//! one. Nothing here performs I/O.

use super::annotation::{Annotation, LocalKey, RemoteIdentity};
use crate::editor::hit_test::hit_test;
use crate::models::annotation::Point;

#[derive(Debug, Default)]
pub struct Scene {
    annotations: Vec<Annotation>,
    /// Selected annotation; refers by key so a removed annotation is
    /// simply no longer found.
    selected: Option<LocalKey>,
    next_key: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a key that has never been used in this scene.
    pub fn allocate_key(&mut self) -> LocalKey {
        self.next_key += 1;
        LocalKey(self.next_key)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, key: LocalKey) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.key == key)
    }

    pub fn append(&mut self, annotation: Annotation) {
        // Keep allocation ahead of any key that came from elsewhere
        self.next_key = self.next_key.max(annotation.key.0);
        self.annotations.push(annotation);
    }

    pub fn remove(&mut self, key: LocalKey) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.key == key)?;
        if self.selected == Some(key) {
            self.selected = None;
        }
        Some(self.annotations.remove(index))
    }

    /// Topmost annotation under `point` (natural space).
    pub fn hit_candidate(&self, point: Point, margin: f64) -> Option<&Annotation> {
        self.annotations
            .iter()
            .rev()
            .find(|a| hit_test(a, point, margin))
    }

    /// Select the topmost annotation under `point`, or clear the selection
    /// when nothing is there.
    pub fn select_at(&mut self, point: Point, margin: f64) -> Option<LocalKey> {
        self.selected = self.hit_candidate(point, margin).map(|a| a.key);
        self.selected
    }

    pub fn select(&mut self, key: LocalKey) -> bool {
        if self.get(key).is_some() {
            self.selected = Some(key);
            true
        } else {
            false
        }
    }

    pub fn selected_key(&self) -> Option<LocalKey> {
        self.selected.filter(|key| self.get(*key).is_some())
    }

    pub fn selected(&self) -> Option<&Annotation> {
        self.selected.and_then(|key| self.get(key))
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.selected = None;
    }

    /// Replace the contents with copies of `annotations`. Key allocation
    /// keeps counting so keys stay unique across restores.
    pub fn restore(&mut self, annotations: &[Annotation]) {
        self.annotations = annotations.to_vec();
        self.selected = None;
        if let Some(max) = self.annotations.iter().map(|a| a.key.0).max() {
            self.next_key = self.next_key.max(max);
        }
    }

    /// Attach a stored record's identity to the matching annotation.
    pub fn adopt(&mut self, key: LocalKey, remote: &RemoteIdentity) -> bool {
        match self.annotations.iter_mut().find(|a| a.key == key) {
            Some(annotation) => {
                annotation.adopt(remote);
                true
            }
            None => false,
        }
    }
}
