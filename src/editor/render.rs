// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene painting.
//!
//! The [`Renderer`] turns annotations into primitive draw calls on a
//! [`Surface`]. Geometry is mapped from natural to display space here, so
//! backends only ever see display coordinates. The same code drives the
//! on-screen canvas and image export.

use crate::editor::hit_test::text_bounds;
use crate::models::annotation::{Annotation, Geometry, LocalKey, Point};
use crate::models::style::Color;
use crate::util::geometry::CoordinateMapper;
use std::f64::consts::PI;

/// Default arrowhead length in natural pixels.
pub const DEFAULT_ARROW_HEAD: f64 = 10.0;

/// Extra width of the selection halo, in display pixels.
const SELECTION_HALO: f32 = 6.0;

/// Alpha multiplier for highlight fills.
const HIGHLIGHT_ALPHA: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: Color,
}

impl StrokeStyle {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// A 2D raster target in display coordinates.
pub trait Surface {
    fn clear(&mut self);
    /// Paint the base image stretched over `width` x `height`.
    fn draw_base_image(&mut self, width: f64, height: f64);
    fn stroke_rect(&mut self, min: Point, width: f64, height: f64, stroke: StrokeStyle);
    fn fill_rect(&mut self, min: Point, width: f64, height: f64, color: Color);
    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: StrokeStyle);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
    fn polyline(&mut self, points: &[Point], stroke: StrokeStyle);
    fn fill_polygon(&mut self, points: &[Point], color: Color);
    /// `anchor` is the left end of the text baseline.
    fn text(&mut self, anchor: Point, content: &str, font_size: f64, color: Color);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    pub selection_color: Color,
    pub arrow_head: f64,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            selection_color: Color::GREEN,
            arrow_head: DEFAULT_ARROW_HEAD,
        }
    }
}

impl Renderer {
    pub fn new(selection_color: Color, arrow_head: f64) -> Self {
        Self { selection_color, arrow_head }
    }

    /// Repaint everything: base image, annotations in order, then the draft.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        mapper: &CoordinateMapper,
        annotations: &[Annotation],
        selected: Option<LocalKey>,
        draft: Option<&Annotation>,
    ) {
        surface.clear();
        let (width, height) = mapper.surface_size();
        surface.draw_base_image(width, height);

        for annotation in annotations {
            let is_selected = selected == Some(annotation.key);
            self.paint(surface, mapper, annotation, is_selected);
        }

        if let Some(draft) = draft {
            self.paint(surface, mapper, draft, false);
        }
    }

    fn paint(
        &self,
        surface: &mut dyn Surface,
        mapper: &CoordinateMapper,
        annotation: &Annotation,
        selected: bool,
    ) {
        let style = &annotation.style;
        let color = style.stroke_color();
        let width = mapper.to_display_len(style.stroke_width as f64) as f32;
        let stroke = StrokeStyle::new(width, color);
        let halo = StrokeStyle::new(width + SELECTION_HALO, self.selection_color.with_opacity(0.6));

        match &annotation.geometry {
            Geometry::Rectangle(b) | Geometry::Highlight(b) => {
                let (min, w, h) = b.normalized();
                let min = mapper.to_display(min);
                let (w, h) = (mapper.to_display_len(w), mapper.to_display_len(h));
                let is_highlight = matches!(annotation.geometry, Geometry::Highlight(_));

                if selected {
                    surface.stroke_rect(min, w, h, halo);
                }
                if is_highlight {
                    let fill = style
                        .fill()
                        .unwrap_or_else(|| color.with_opacity(HIGHLIGHT_ALPHA));
                    surface.fill_rect(min, w, h, fill);
                } else {
                    if let Some(fill) = style.fill() {
                        surface.fill_rect(min, w, h, fill);
                    }
                    surface.stroke_rect(min, w, h, stroke);
                }
            }
            Geometry::Circle(b) => {
                let center = mapper.to_display(b.center());
                let radius = mapper.to_display_len(b.radius());
                if selected {
                    surface.stroke_circle(center, radius, halo);
                }
                if let Some(fill) = style.fill() {
                    surface.fill_circle(center, radius, fill);
                }
                surface.stroke_circle(center, radius, stroke);
            }
            Geometry::Arrow { start, end } => {
                let from = mapper.to_display(*start);
                let to = mapper.to_display(*end);
                if selected {
                    surface.polyline(&[from, to], halo);
                }
                surface.polyline(&[from, to], stroke);
                if let Some(head) = arrow_head(from, to, mapper.to_display_len(self.arrow_head)) {
                    surface.fill_polygon(&head, color);
                }
            }
            Geometry::Freehand { points } => {
                let display: Vec<Point> = points.iter().map(|p| mapper.to_display(*p)).collect();
                match display.as_slice() {
                    [] => {}
                    [dot] => {
                        let radius = (width as f64 / 2.0).max(1.0);
                        if selected {
                            surface.stroke_circle(*dot, radius, halo);
                        }
                        surface.fill_circle(*dot, radius, color);
                    }
                    _ => {
                        if selected {
                            surface.polyline(&display, halo);
                        }
                        surface.polyline(&display, stroke);
                    }
                }
            }
            Geometry::Text { anchor, content } => {
                let font_size = mapper.to_display_len(style.font_size() as f64);
                let anchor_display = mapper.to_display(*anchor);
                if selected {
                    let (min, w, h) = text_bounds(anchor_display, content, font_size);
                    surface.stroke_rect(min, w, h, StrokeStyle::new(2.0, self.selection_color));
                }
                surface.text(anchor_display, content, font_size, color);
            }
        }
    }
}

/// Filled triangle at the tip of an arrow, `None` for a zero-length shaft.
pub fn arrow_head(from: Point, to: Point, length: f64) -> Option<[Point; 3]> {
    if from == to {
        return None;
    }
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let wing = |offset: f64| {
        Point::new(
            to.x - length * (angle + offset).cos(),
            to.y - length * (angle + offset).sin(),
        )
    };
    Some([to, wing(-PI / 6.0), wing(PI / 6.0)])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::annotation::BoxGeometry;
    use crate::models::style::Style;

    /// Surface that records draw calls for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub calls: Vec<DrawCall>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawCall {
        Clear,
        BaseImage(f64, f64),
        StrokeRect(Point, f64, f64, StrokeStyle),
        FillRect(Point, f64, f64, Color),
        StrokeCircle(Point, f64, StrokeStyle),
        FillCircle(Point, f64, Color),
        Polyline(Vec<Point>, StrokeStyle),
        FillPolygon(Vec<Point>, Color),
        Text(Point, String, f64, Color),
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.calls.clear();
            self.calls.push(DrawCall::Clear);
        }
        fn draw_base_image(&mut self, width: f64, height: f64) {
            self.calls.push(DrawCall::BaseImage(width, height));
        }
        fn stroke_rect(&mut self, min: Point, width: f64, height: f64, stroke: StrokeStyle) {
            self.calls.push(DrawCall::StrokeRect(min, width, height, stroke));
        }
        fn fill_rect(&mut self, min: Point, width: f64, height: f64, color: Color) {
            self.calls.push(DrawCall::FillRect(min, width, height, color));
        }
        fn stroke_circle(&mut self, center: Point, radius: f64, stroke: StrokeStyle) {
            self.calls.push(DrawCall::StrokeCircle(center, radius, stroke));
        }
        fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
            self.calls.push(DrawCall::FillCircle(center, radius, color));
        }
        fn polyline(&mut self, points: &[Point], stroke: StrokeStyle) {
            self.calls.push(DrawCall::Polyline(points.to_vec(), stroke));
        }
        fn fill_polygon(&mut self, points: &[Point], color: Color) {
            self.calls.push(DrawCall::FillPolygon(points.to_vec(), color));
        }
        fn text(&mut self, anchor: Point, content: &str, font_size: f64, color: Color) {
            self.calls.push(DrawCall::Text(anchor, content.to_string(), font_size, color));
        }
    }

    fn rect(key: u64) -> Annotation {
        Annotation::new(
            LocalKey(key),
            Geometry::Rectangle(BoxGeometry::new(Point::new(80.0, 80.0), 200.0, 100.0)),
            Style::default(),
        )
    }

    #[test]
    fn test_render_order_and_scaling() {
        let mapper = CoordinateMapper::new(800.0, 600.0, 400.0, 300.0);
        let mut surface = RecordingSurface::default();
        let draft = Annotation::new(
            LocalKey(9),
            Geometry::Arrow { start: Point::new(0.0, 0.0), end: Point::new(100.0, 0.0) },
            Style::default(),
        );

        Renderer::default().render(&mut surface, &mapper, &[rect(1)], None, Some(&draft));

        assert_eq!(surface.calls[0], DrawCall::Clear);
        assert_eq!(surface.calls[1], DrawCall::BaseImage(400.0, 300.0));
        assert_eq!(
            surface.calls[2],
            DrawCall::StrokeRect(
                Point::new(40.0, 40.0),
                100.0,
                50.0,
                StrokeStyle::new(1.0, Color::RED)
            )
        );
        // Draft painted last: shaft then head
        assert!(matches!(surface.calls[3], DrawCall::Polyline(ref pts, _) if pts[1] == Point::new(50.0, 0.0)));
        assert!(matches!(surface.calls[4], DrawCall::FillPolygon(_, _)));
        assert_eq!(surface.calls.len(), 5);
    }

    #[test]
    fn test_selection_adds_halo() {
        let mapper = CoordinateMapper::identity(800.0, 600.0);
        let renderer = Renderer::default();

        let mut plain = RecordingSurface::default();
        renderer.render(&mut plain, &mapper, &[rect(1)], None, None);
        let mut selected = RecordingSurface::default();
        renderer.render(&mut selected, &mapper, &[rect(1)], Some(LocalKey(1)), None);

        assert_eq!(selected.calls.len(), plain.calls.len() + 1);
        match &selected.calls[2] {
            DrawCall::StrokeRect(_, _, _, stroke) => {
                assert_eq!(stroke.width, 2.0 + SELECTION_HALO);
                assert_eq!((stroke.color.r, stroke.color.g), (0, 255));
            }
            other => panic!("expected halo, got {:?}", other),
        }
    }

    #[test]
    fn test_highlight_is_translucent_fill() {
        let mapper = CoordinateMapper::identity(100.0, 100.0);
        let highlight = Annotation::new(
            LocalKey(1),
            Geometry::Highlight(BoxGeometry::new(Point::new(10.0, 10.0), -5.0, 5.0)),
            Style::default(),
        );
        let mut surface = RecordingSurface::default();
        Renderer::default().render(&mut surface, &mapper, &[highlight], None, None);

        match &surface.calls[2] {
            DrawCall::FillRect(min, w, h, color) => {
                assert_eq!(*min, Point::new(5.0, 10.0));
                assert_eq!((*w, *h), (5.0, 5.0));
                assert!(color.a < 255);
            }
            other => panic!("expected fill, got {:?}", other),
        }
    }

    #[test]
    fn test_single_point_freehand_is_dot() {
        let mapper = CoordinateMapper::identity(100.0, 100.0);
        let dot = Annotation::new(
            LocalKey(1),
            Geometry::Freehand { points: vec![Point::new(20.0, 20.0)] },
            Style::default(),
        );
        let mut surface = RecordingSurface::default();
        Renderer::default().render(&mut surface, &mapper, &[dot], None, None);
        assert_eq!(surface.calls[2], DrawCall::FillCircle(Point::new(20.0, 20.0), 1.0, Color::RED));
    }

    #[test]
    fn test_text_scaled_font() {
        let mapper = CoordinateMapper::new(800.0, 600.0, 400.0, 300.0);
        let label = Annotation::new(
            LocalKey(1),
            Geometry::Text { anchor: Point::new(100.0, 100.0), content: "lod pop".to_string() },
            Style::default(),
        );
        let mut surface = RecordingSurface::default();
        Renderer::default().render(&mut surface, &mapper, &[label], None, None);
        assert_eq!(
            surface.calls[2],
            DrawCall::Text(Point::new(50.0, 50.0), "lod pop".to_string(), 8.0, Color::RED)
        );
    }

    #[test]
    fn test_arrow_head_points_back_along_shaft() {
        let head = arrow_head(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 10.0).unwrap();
        assert_eq!(head[0], Point::new(100.0, 0.0));
        assert!(head[1].x < 100.0 && head[2].x < 100.0);
        assert!((head[1].y + head[2].y).abs() < 1e-9);
        assert!(arrow_head(Point::new(1.0, 1.0), Point::new(1.0, 1.0), 10.0).is_none());
    }
}
