// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the markup objects a reviewer places on top of an
//! image: text labels, arrows, rectangles, circles, freehand strokes and
//! highlights. Geometry is stored in natural image pixels.

use super::style::Style;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point. Natural or display space depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Kind of annotation. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Text,
    Arrow,
    Rectangle,
    Circle,
    Freehand,
    Highlight,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 6] = [
        AnnotationKind::Text,
        AnnotationKind::Arrow,
        AnnotationKind::Rectangle,
        AnnotationKind::Circle,
        AnnotationKind::Freehand,
        AnnotationKind::Highlight,
    ];

    /// Identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Text => "text",
            AnnotationKind::Arrow => "arrow",
            AnnotationKind::Rectangle => "rectangle",
            AnnotationKind::Circle => "circle",
            AnnotationKind::Freehand => "freehand",
            AnnotationKind::Highlight => "highlight",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin plus signed extent. Width and height go negative when a drag
/// runs up or left of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxGeometry {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl BoxGeometry {
    pub fn new(origin: Point, width: f64, height: f64) -> Self {
        Self { origin, width, height }
    }

    /// Top-left corner and non-negative size.
    pub fn normalized(&self) -> (Point, f64, f64) {
        let min = Point::new(
            self.origin.x.min(self.origin.x + self.width),
            self.origin.y.min(self.origin.y + self.height),
        );
        (min, self.width.abs(), self.height.abs())
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.width / 2.0,
            self.origin.y + self.height / 2.0,
        )
    }

    /// Circle radius; half the bounding width.
    pub fn radius(&self) -> f64 {
        self.width.abs() / 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Kind-specific geometry, in natural image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Text { anchor: Point, content: String },
    Arrow { start: Point, end: Point },
    Rectangle(BoxGeometry),
    Circle(BoxGeometry),
    Freehand { points: Vec<Point> },
    Highlight(BoxGeometry),
}

impl Geometry {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Geometry::Text { .. } => AnnotationKind::Text,
            Geometry::Arrow { .. } => AnnotationKind::Arrow,
            Geometry::Rectangle(_) => AnnotationKind::Rectangle,
            Geometry::Circle(_) => AnnotationKind::Circle,
            Geometry::Freehand { .. } => AnnotationKind::Freehand,
            Geometry::Highlight(_) => AnnotationKind::Highlight,
        }
    }

    /// Seed geometry for a drag-drawn kind at the pointer-down position.
    /// Text is placed by click, not drafted, so it has no seed.
    pub fn seed(kind: AnnotationKind, at: Point) -> Option<Self> {
        let geometry = match kind {
            AnnotationKind::Rectangle => Geometry::Rectangle(BoxGeometry::new(at, 0.0, 0.0)),
            AnnotationKind::Circle => Geometry::Circle(BoxGeometry::new(at, 0.0, 0.0)),
            AnnotationKind::Highlight => Geometry::Highlight(BoxGeometry::new(at, 0.0, 0.0)),
            AnnotationKind::Arrow => Geometry::Arrow { start: at, end: at },
            AnnotationKind::Freehand => Geometry::Freehand { points: vec![at] },
            AnnotationKind::Text => return None,
        };
        Some(geometry)
    }

    /// Extend a draft towards the pointer's current position.
    pub fn drag_to(&mut self, to: Point) {
        match self {
            Geometry::Rectangle(b) | Geometry::Circle(b) | Geometry::Highlight(b) => {
                b.width = to.x - b.origin.x;
                b.height = to.y - b.origin.y;
            }
            Geometry::Arrow { end, .. } => *end = to,
            Geometry::Freehand { points } => points.push(to),
            Geometry::Text { .. } => {}
        }
    }

    /// True when the geometry would paint nothing worth keeping.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Geometry::Rectangle(b) | Geometry::Highlight(b) => b.width == 0.0 || b.height == 0.0,
            // Radius comes from the width alone
            Geometry::Circle(b) => b.radius() == 0.0,
            Geometry::Arrow { start, end } => start == end,
            Geometry::Freehand { points } => match points.first() {
                Some(first) => points.iter().all(|p| p == first),
                None => true,
            },
            Geometry::Text { content, .. } => content.trim().is_empty(),
        }
    }
}

/// Local identity of an annotation within one editing session.
///
/// Assigned by the scene and never persisted; selection and save results
/// refer to annotations through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalKey(pub u64);

impl fmt::Display for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single markup object.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub key: LocalKey,
    /// Server-assigned id; `None` until the first successful save.
    pub id: Option<String>,
    pub geometry: Geometry,
    pub style: Style,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Annotation {
    /// Create a local annotation that has not been saved yet.
    pub fn new(key: LocalKey, geometry: Geometry, style: Style) -> Self {
        Self {
            key,
            id: None,
            geometry,
            style,
            author: None,
            created_at: None,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        self.geometry.kind()
    }

    /// Take over the identity fields of the canonical stored record.
    pub fn adopt(&mut self, remote: &RemoteIdentity) {
        self.id = Some(remote.id.clone());
        if remote.author.is_some() {
            self.author = remote.author.clone();
        }
        if remote.created_at.is_some() {
            self.created_at = remote.created_at;
        }
    }
}

/// Identity fields the storage service assigns on save.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteIdentity {
    pub id: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_normalization() {
        let b = BoxGeometry::new(Point::new(100.0, 50.0), -40.0, -20.0);
        let (min, w, h) = b.normalized();
        assert_eq!(min, Point::new(60.0, 30.0));
        assert_eq!(w, 40.0);
        assert_eq!(h, 20.0);
        assert_eq!(b.center(), Point::new(80.0, 40.0));
    }

    #[test]
    fn test_seed_and_drag() {
        let mut g = Geometry::seed(AnnotationKind::Rectangle, Point::new(10.0, 10.0)).unwrap();
        assert!(g.is_degenerate());
        g.drag_to(Point::new(30.0, 50.0));
        assert_eq!(g, Geometry::Rectangle(BoxGeometry::new(Point::new(10.0, 10.0), 20.0, 40.0)));
        assert!(!g.is_degenerate());

        let mut arrow = Geometry::seed(AnnotationKind::Arrow, Point::new(1.0, 1.0)).unwrap();
        arrow.drag_to(Point::new(5.0, 1.0));
        assert_eq!(
            arrow,
            Geometry::Arrow { start: Point::new(1.0, 1.0), end: Point::new(5.0, 1.0) }
        );

        assert!(Geometry::seed(AnnotationKind::Text, Point::default()).is_none());
    }

    #[test]
    fn test_flat_circle_keeps_radius() {
        let mut circle = Geometry::seed(AnnotationKind::Circle, Point::new(10.0, 50.0)).unwrap();
        circle.drag_to(Point::new(60.0, 50.0));
        assert!(!circle.is_degenerate());

        circle.drag_to(Point::new(10.0, 90.0));
        assert!(circle.is_degenerate());

        let mut highlight = Geometry::seed(AnnotationKind::Highlight, Point::new(10.0, 50.0)).unwrap();
        highlight.drag_to(Point::new(60.0, 50.0));
        assert!(highlight.is_degenerate());
    }

    #[test]
    fn test_freehand_degeneracy() {
        let mut g = Geometry::seed(AnnotationKind::Freehand, Point::new(3.0, 3.0)).unwrap();
        assert!(g.is_degenerate());
        g.drag_to(Point::new(3.0, 3.0));
        assert!(g.is_degenerate());
        g.drag_to(Point::new(4.0, 3.0));
        assert!(!g.is_degenerate());
    }

    #[test]
    fn test_text_degeneracy() {
        let blank = Geometry::Text { anchor: Point::default(), content: "   ".to_string() };
        assert!(blank.is_degenerate());
        let label = Geometry::Text { anchor: Point::default(), content: "fix".to_string() };
        assert!(!label.is_degenerate());
    }

    #[test]
    fn test_kind_parse() {
        for kind in AnnotationKind::ALL {
            assert_eq!(AnnotationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AnnotationKind::parse("polygon"), None);
    }
}
