// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing controller.
//!
//! Turns pointer and keyboard input into scene changes. The controller is
//! either idle or drafting exactly one annotation; a draft joins the scene
//! (and history) only when the gesture ends with usable geometry. Finalized
//! annotations are shown immediately and saved in the background.

use super::history::History;
use super::render::{Renderer, Surface};
use super::tool::Tool;
use crate::io::gateway::{load_or_empty, PersistenceError, PersistenceGateway};
use crate::io::wire::{records_into_annotations, AnnotationRecord};
use crate::models::annotation::{Annotation, Geometry, LocalKey, Point, RemoteIdentity};
use crate::models::scene::Scene;
use crate::models::style::Style;
use crate::util::geometry::CoordinateMapper;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Source of text for the text tool.
pub trait TextPrompt {
    /// Text to place at `anchor` (natural space), or `None` to cancel.
    fn request_text(&mut self, anchor: Point) -> Option<String>;
}

/// Keyboard commands the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Escape,
    Delete,
    Backspace,
    Digit(u8),
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
    /// The editor closed itself.
    Close,
}

/// Result of a background save, for the host to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved { key: LocalKey, id: String },
    Failed { key: LocalKey, message: String },
}

impl SaveStatus {
    pub fn message(&self) -> String {
        match self {
            SaveStatus::Saved { .. } => "Annotation saved".to_string(),
            SaveStatus::Failed { message, .. } => format!("Error saving annotation: {}", message),
        }
    }
}

/// Per-session editor settings.
#[derive(Debug, Clone)]
pub struct EditorSettings {
    /// Hit-test tolerance in natural pixels.
    pub hit_margin: f64,
    /// Style applied to new drafts.
    pub style: Style,
    /// Session user attached to new annotations.
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum DrawState {
    Idle,
    Drafting(Annotation),
}

struct SaveReport {
    key: LocalKey,
    result: Result<AnnotationRecord, PersistenceError>,
}

pub struct DrawingController {
    target: String,
    mapper: CoordinateMapper,
    renderer: Renderer,
    gateway: Arc<dyn PersistenceGateway>,
    history: History,
    scene: Scene,
    state: DrawState,
    tool: Tool,
    /// Tool requested mid-gesture, applied once the gesture ends.
    pending_tool: Option<Tool>,
    /// Container size requested mid-gesture.
    pending_container: Option<(f64, f64)>,
    settings: EditorSettings,
    /// Identities returned by storage, re-applied after undo/redo.
    saved: HashMap<LocalKey, RemoteIdentity>,
    save_tx: Sender<SaveReport>,
    save_rx: Receiver<SaveReport>,
    in_flight: usize,
    closed: bool,
}

impl DrawingController {
    pub fn new(
        target: impl Into<String>,
        mapper: CoordinateMapper,
        renderer: Renderer,
        gateway: Arc<dyn PersistenceGateway>,
        history: History,
        settings: EditorSettings,
    ) -> Self {
        let (save_tx, save_rx) = channel();
        Self {
            target: target.into(),
            mapper,
            renderer,
            gateway,
            history,
            scene: Scene::new(),
            state: DrawState::Idle,
            tool: Tool::default(),
            pending_tool: None,
            pending_container: None,
            settings,
            saved: HashMap::new(),
            save_tx,
            save_rx,
            in_flight: 0,
            closed: false,
        }
    }

    /// Fetch the target's annotations from storage and seed the scene.
    /// Failures leave an empty scene.
    pub fn load(&mut self) {
        let records = load_or_empty(self.gateway.as_ref(), &self.target);
        self.seed(records);
    }

    /// Replace the scene with `records` and start history from there.
    pub fn seed(&mut self, records: Vec<AnnotationRecord>) {
        self.state = DrawState::Idle;
        self.scene.clear();
        self.saved.clear();

        let scene = &mut self.scene;
        let annotations = records_into_annotations(records, || scene.allocate_key());
        for annotation in annotations {
            if let Some(id) = &annotation.id {
                self.saved.insert(
                    annotation.key,
                    RemoteIdentity {
                        id: id.clone(),
                        author: annotation.author.clone(),
                        created_at: annotation.created_at,
                    },
                );
            }
            self.scene.append(annotation);
        }
        self.history.reset(&self.scene);
        log::info!("Editor opened on {} with {} annotations", self.target, self.scene.len());
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn style(&self) -> &Style {
        &self.settings.style
    }

    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.settings.style
    }

    pub fn draft(&self) -> Option<&Annotation> {
        match &self.state {
            DrawState::Drafting(draft) => Some(draft),
            DrawState::Idle => None,
        }
    }

    pub fn is_drafting(&self) -> bool {
        matches!(self.state, DrawState::Drafting(_))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn can_undo(&self) -> bool {
        !self.is_drafting() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.is_drafting() && self.history.can_redo()
    }

    pub fn pending_saves(&self) -> usize {
        self.in_flight
    }

    /// Switch tools. Deferred until the current gesture ends.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.is_drafting() {
            log::debug!("Deferring switch to {:?} until the gesture ends", tool);
            self.pending_tool = Some(tool);
        } else {
            self.tool = tool;
        }
    }

    /// Switch tools by identifier; unknown identifiers are ignored.
    pub fn set_tool_by_id(&mut self, id: &str) -> bool {
        match Tool::from_id(id) {
            Some(tool) => {
                self.set_tool(tool);
                true
            }
            None => {
                log::warn!("Ignoring unknown tool {:?}", id);
                false
            }
        }
    }

    /// Resize the container. Deferred until the current gesture ends.
    pub fn set_container(&mut self, width: f64, height: f64) {
        if self.is_drafting() {
            self.pending_container = Some((width, height));
            return;
        }
        let (nw, nh) = self.mapper.natural_size();
        let mapper = CoordinateMapper::new(nw, nh, width, height);
        if mapper != self.mapper {
            log::debug!("Display scale now {:.3}", mapper.scale());
            self.mapper = mapper;
        }
    }

    pub fn pointer_down(&mut self, display: Point) {
        if self.closed || self.is_drafting() {
            return;
        }
        let at = self.mapper.to_natural(display);

        if self.tool == Tool::Select {
            match self.scene.select_at(at, self.settings.hit_margin) {
                Some(key) => log::info!("Selected annotation {}", key),
                None => log::debug!("Nothing at ({:.1}, {:.1})", at.x, at.y),
            }
            return;
        }

        let Some(geometry) = self.tool.drafts().and_then(|kind| Geometry::seed(kind, at)) else {
            return;
        };
        let key = self.scene.allocate_key();
        self.state = DrawState::Drafting(Annotation::new(key, geometry, self.settings.style.clone()));
    }

    pub fn pointer_move(&mut self, display: Point) {
        if self.closed {
            return;
        }
        let to = self.mapper.to_natural(display);
        if let DrawState::Drafting(draft) = &mut self.state {
            draft.geometry.drag_to(to);
        }
    }

    pub fn pointer_up(&mut self, display: Point) {
        if self.closed {
            return;
        }
        let to = self.mapper.to_natural(display);
        if let DrawState::Drafting(mut draft) = std::mem::replace(&mut self.state, DrawState::Idle) {
            let already_there = match &draft.geometry {
                Geometry::Freehand { points } => points.last() == Some(&to),
                _ => false,
            };
            if !already_there {
                draft.geometry.drag_to(to);
            }
            self.finalize(draft);
        }
        self.end_gesture();
    }

    /// Click with the text tool: ask `prompt` for content and place it.
    pub fn click(&mut self, display: Point, prompt: &mut dyn TextPrompt) -> Option<LocalKey> {
        if self.closed || self.tool != Tool::Text || self.is_drafting() {
            return None;
        }
        let anchor = self.mapper.to_natural(display);
        let content = prompt.request_text(anchor)?;
        self.place_text(display, content)
    }

    /// Place a text label in a single step.
    pub fn place_text(&mut self, display: Point, content: String) -> Option<LocalKey> {
        if self.closed || self.is_drafting() {
            return None;
        }
        let anchor = self.mapper.to_natural(display);
        let mut style = self.settings.style.clone();
        style.font_size.get_or_insert(crate::models::style::DEFAULT_FONT_SIZE);
        let key = self.scene.allocate_key();
        self.finalize(Annotation::new(key, Geometry::Text { anchor, content }, style))
    }

    fn finalize(&mut self, mut annotation: Annotation) -> Option<LocalKey> {
        if annotation.geometry.is_degenerate() {
            log::debug!("Discarding degenerate {} draft", annotation.kind());
            return None;
        }
        // Storage assigns id, author and creation time; the request omits them
        let record = AnnotationRecord::from_annotation(&annotation);
        annotation.created_at = Some(Utc::now());
        annotation.author = self.settings.author.clone();

        let key = annotation.key;
        log::info!("Added {} annotation {}", annotation.kind(), key);
        self.scene.append(annotation);
        self.history.record(&self.scene);
        self.dispatch_save(key, record);
        Some(key)
    }

    fn end_gesture(&mut self) {
        if let Some(tool) = self.pending_tool.take() {
            self.tool = tool;
        }
        if let Some((width, height)) = self.pending_container.take() {
            self.set_container(width, height);
        }
    }

    /// Save on a background thread; the result arrives through
    /// [`poll_saves`](Self::poll_saves).
    fn dispatch_save(&mut self, key: LocalKey, record: AnnotationRecord) {
        let gateway = Arc::clone(&self.gateway);
        let target = self.target.clone();
        let sender = self.save_tx.clone();
        self.in_flight += 1;

        std::thread::spawn(move || {
            let result = gateway.save_annotation(&target, &record);
            // Receiver gone means the editor closed; nobody is listening
            let _ = sender.send(SaveReport { key, result });
        });
    }

    /// Collect finished saves, adopting stored identities into the scene.
    pub fn poll_saves(&mut self) -> Vec<SaveStatus> {
        let mut statuses = Vec::new();
        while let Ok(report) = self.save_rx.try_recv() {
            statuses.push(self.apply_save(report));
        }
        statuses
    }

    fn apply_save(&mut self, report: SaveReport) -> SaveStatus {
        self.in_flight = self.in_flight.saturating_sub(1);
        let SaveReport { key, result } = report;

        let identity = match result {
            Ok(record) => record.remote_identity(),
            Err(e) => {
                log::error!("Error saving annotation {}: {}", key, e);
                return SaveStatus::Failed { key, message: e.to_string() };
            }
        };
        let Some(identity) = identity else {
            log::error!("Save of {} returned no id", key);
            return SaveStatus::Failed { key, message: "response carried no id".to_string() };
        };

        let present = self.scene.adopt(key, &identity);
        log::info!(
            "Annotation {} saved as {}{}",
            key,
            identity.id,
            if present { "" } else { " (no longer in scene)" }
        );
        let id = identity.id.clone();
        self.saved.insert(key, identity);
        SaveStatus::Saved { key, id }
    }

    /// Remove the selected annotation locally. Storage is not told.
    pub fn delete_selection(&mut self) -> bool {
        if self.is_drafting() {
            return false;
        }
        let Some(key) = self.scene.selected_key() else {
            return false;
        };
        if let Some(removed) = self.scene.remove(key) {
            self.history.record(&self.scene);
            match &removed.id {
                Some(id) => log::info!("Deleted annotation {} locally; stored record {} remains", key, id),
                None => log::info!("Deleted annotation {}", key),
            }
            return true;
        }
        false
    }

    /// Remove every annotation in one undoable step. Local only.
    pub fn clear_all(&mut self) -> bool {
        if self.is_drafting() || self.scene.is_empty() {
            return false;
        }
        let count = self.scene.len();
        self.scene.clear();
        self.history.record(&self.scene);
        log::info!("Cleared {} annotations", count);
        true
    }

    pub fn undo(&mut self) -> bool {
        if self.is_drafting() {
            return false;
        }
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        let annotations = snapshot.annotations().to_vec();
        self.restore(&annotations);
        log::info!("Undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.is_drafting() {
            return false;
        }
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        let annotations = snapshot.annotations().to_vec();
        self.restore(&annotations);
        log::info!("Redo");
        true
    }

    fn restore(&mut self, annotations: &[Annotation]) {
        self.scene.restore(annotations);
        for (key, identity) in &self.saved {
            self.scene.adopt(*key, identity);
        }
    }

    pub fn select(&mut self, key: LocalKey) -> bool {
        self.scene.select(key)
    }

    pub fn handle_key(&mut self, key: KeyCommand) -> KeyOutcome {
        if self.closed {
            return KeyOutcome::Ignored;
        }
        let handled = match key {
            KeyCommand::Escape => {
                self.close();
                return KeyOutcome::Close;
            }
            KeyCommand::Delete | KeyCommand::Backspace => self.delete_selection(),
            KeyCommand::Digit(digit) => match Tool::from_digit(digit) {
                Some(tool) => {
                    self.set_tool(tool);
                    true
                }
                None => false,
            },
            KeyCommand::Undo => self.undo(),
            KeyCommand::Redo => self.redo(),
        };
        if handled {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }

    /// Stop editing: drop any draft and ignore further input. Saves still
    /// in flight finish on their own.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if let DrawState::Drafting(draft) = std::mem::replace(&mut self.state, DrawState::Idle) {
            log::debug!("Discarding {} draft on close", draft.kind());
        }
        self.closed = true;
        log::info!("Editor closed ({} saves still in flight)", self.in_flight);
    }

    /// Paint the current scene and draft.
    pub fn render(&self, surface: &mut dyn Surface) {
        self.renderer.render(
            surface,
            &self.mapper,
            self.scene.annotations(),
            self.scene.selected_key(),
            self.draft(),
        );
    }
}
