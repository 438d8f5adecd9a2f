// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor tools.

use crate::models::annotation::AnnotationKind;

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Rectangle,
    Circle,
    Arrow,
    Freehand,
    Text,
    Highlight,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Select,
        Tool::Rectangle,
        Tool::Circle,
        Tool::Arrow,
        Tool::Freehand,
        Tool::Text,
        Tool::Highlight,
    ];

    /// Digit shortcuts `1..6`. Highlight has no shortcut.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Tool::Select),
            2 => Some(Tool::Rectangle),
            3 => Some(Tool::Circle),
            4 => Some(Tool::Arrow),
            5 => Some(Tool::Freehand),
            6 => Some(Tool::Text),
            _ => None,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.id() == id)
    }

    pub fn id(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Rectangle => "rectangle",
            Tool::Circle => "circle",
            Tool::Arrow => "arrow",
            Tool::Freehand => "freehand",
            Tool::Text => "text",
            Tool::Highlight => "highlight",
        }
    }

    /// Kind drafted by a drag with this tool.
    pub fn drafts(&self) -> Option<AnnotationKind> {
        match self {
            Tool::Rectangle => Some(AnnotationKind::Rectangle),
            Tool::Circle => Some(AnnotationKind::Circle),
            Tool::Arrow => Some(AnnotationKind::Arrow),
            Tool::Freehand => Some(AnnotationKind::Freehand),
            Tool::Highlight => Some(AnnotationKind::Highlight),
            Tool::Select | Tool::Text => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Select => "⬆ Select",
            Tool::Rectangle => "▭ Rectangle",
            Tool::Circle => "◯ Circle",
            Tool::Arrow => "➡ Arrow",
            Tool::Freehand => "✏ Freehand",
            Tool::Text => "T Text",
            Tool::Highlight => "▒ Highlight",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Tool::Select => "Click an annotation to select it, Delete removes it",
            Tool::Rectangle => "Drag to draw a rectangle",
            Tool::Circle => "Drag to draw a circle",
            Tool::Arrow => "Drag from the tail to the tip",
            Tool::Freehand => "Drag to draw freely",
            Tool::Text => "Click to place a text label",
            Tool::Highlight => "Drag to highlight an area",
        }
    }
}
