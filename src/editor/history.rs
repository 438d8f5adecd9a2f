// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo/redo history.
//!
//! A linear list of full-scene snapshots with a cursor pointing at the
//! snapshot that matches the live scene. Recording after an undo drops the
//! redo branch.

use crate::models::annotation::Annotation;
use crate::models::scene::Scene;

/// Immutable copy of a scene's annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    annotations: Vec<Annotation>,
}

impl Snapshot {
    pub fn capture(scene: &Scene) -> Self {
        Self {
            annotations: scene.annotations().to_vec(),
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

#[derive(Debug)]
pub struct History {
    entries: Vec<Snapshot>,
    cursor: usize,
    /// Oldest snapshots are dropped past this many; `None` keeps everything.
    max_size: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(None)
    }
}

impl History {
    /// Empty-scene history, optionally capped at `max_size` snapshots
    /// (minimum 2).
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            entries: vec![Snapshot::default()],
            cursor: 0,
            max_size: max_size.map(|max| max.max(2)),
        }
    }

    /// Start over from `scene` as the only, unreachable-by-undo, entry.
    pub fn reset(&mut self, scene: &Scene) {
        self.entries.clear();
        self.entries.push(Snapshot::capture(scene));
        self.cursor = 0;
    }

    /// Capture the scene after a mutation.
    pub fn record(&mut self, scene: &Scene) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Snapshot::capture(scene));

        // Limit history size
        if let Some(max_size) = self.max_size {
            if self.entries.len() > max_size {
                let excess = self.entries.len() - max_size;
                self.entries.drain(..excess);
            }
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back; returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward; returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Geometry, Point};
    use crate::models::style::Style;

    fn add_arrow(scene: &mut Scene, n: f64) {
        let key = scene.allocate_key();
        scene.append(Annotation::new(
            key,
            Geometry::Arrow { start: Point::new(n, n), end: Point::new(n + 10.0, n) },
            Style::default(),
        ));
    }

    #[test]
    fn test_undo_redo_identity() {
        let mut scene = Scene::new();
        let mut history = History::default();
        history.reset(&scene);

        let n = 7;
        for i in 0..n {
            if i % 3 == 2 {
                let key = scene.annotations()[0].key;
                scene.remove(key);
            } else {
                add_arrow(&mut scene, i as f64);
            }
            history.record(&scene);
        }
        let final_state = scene.annotations().to_vec();

        for _ in 0..n {
            let snapshot = history.undo().unwrap().clone();
            scene.restore(snapshot.annotations());
        }
        assert!(scene.is_empty());
        assert!(history.undo().is_none());

        for _ in 0..n {
            let snapshot = history.redo().unwrap().clone();
            scene.restore(snapshot.annotations());
        }
        assert_eq!(scene.annotations(), final_state.as_slice());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_truncates_redo() {
        let mut scene = Scene::new();
        let mut history = History::default();

        add_arrow(&mut scene, 1.0);
        history.record(&scene);
        add_arrow(&mut scene, 2.0);
        history.record(&scene);

        let snapshot = history.undo().unwrap().clone();
        scene.restore(snapshot.annotations());
        assert!(history.can_redo());

        add_arrow(&mut scene, 3.0);
        history.record(&scene);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_snapshots_do_not_alias_live_scene() {
        let mut scene = Scene::new();
        let mut history = History::default();
        add_arrow(&mut scene, 1.0);
        history.record(&scene);

        scene.clear();
        add_arrow(&mut scene, 50.0);

        let restored = history.undo().unwrap().annotations().to_vec();
        assert!(restored.is_empty());
        let redone = history.redo().unwrap().annotations().to_vec();
        assert_eq!(
            redone[0].geometry,
            Geometry::Arrow { start: Point::new(1.0, 1.0), end: Point::new(11.0, 1.0) }
        );
    }

    #[test]
    fn test_uncapped_by_default() {
        let mut scene = Scene::new();
        let mut history = History::default();
        history.reset(&scene);
        for i in 0..150 {
            add_arrow(&mut scene, i as f64);
            history.record(&scene);
        }
        assert_eq!(history.len(), 151);

        let mut undone = 0;
        while let Some(snapshot) = history.undo() {
            let annotations = snapshot.annotations().to_vec();
            scene.restore(&annotations);
            undone += 1;
        }
        assert_eq!(undone, 150);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut scene = Scene::new();
        let mut history = History::new(Some(3));
        for i in 0..5 {
            add_arrow(&mut scene, i as f64);
            history.record(&scene);
        }
        assert_eq!(history.len(), 3);
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().annotations().len(), 4);
    }
}
