// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotated image export.
//!
//! Renders the base image and every annotation at natural resolution into
//! a PNG using tiny-skia as the raster backend. tiny-skia has no text
//! engine, so text labels are left out of exports.

use super::media::LoadedImage;
use crate::editor::render::{Renderer, StrokeStyle, Surface};
use crate::models::annotation::{Annotation, Point};
use crate::models::style::Color;
use crate::util::geometry::CoordinateMapper;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Transform};

/// Raster surface backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    base: Option<Pixmap>,
    base_size: (u32, u32),
    skipped_text: usize,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32, base: Option<&LoadedImage>) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("Failed to create pixmap {}x{}", width, height))?;
        let base_pixmap = base.and_then(premultiplied_pixmap);
        Ok(Self {
            pixmap,
            base: base_pixmap,
            base_size: base.map(|b| (b.width, b.height)).unwrap_or((0, 0)),
            skipped_text: 0,
        })
    }

    pub fn skipped_text(&self) -> usize {
        self.skipped_text
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    fn stroke(style: StrokeStyle) -> tiny_skia::Stroke {
        tiny_skia::Stroke {
            width: style.width.max(0.5),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        }
    }

    fn rect_path(min: Point, width: f64, height: f64) -> Option<tiny_skia::Path> {
        let rect = tiny_skia::Rect::from_xywh(min.x as f32, min.y as f32, width as f32, height as f32)?;
        Some(PathBuilder::from_rect(rect))
    }

    fn polyline_path(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
        let (first, rest) = points.split_first()?;
        let mut pb = PathBuilder::new();
        pb.move_to(first.x as f32, first.y as f32);
        for p in rest {
            pb.line_to(p.x as f32, p.y as f32);
        }
        if close {
            pb.close();
        }
        pb.finish()
    }
}

/// Convert straight RGBA to tiny-skia's premultiplied pixmap.
fn premultiplied_pixmap(image: &LoadedImage) -> Option<Pixmap> {
    let mut data = image.pixels.clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for channel in &mut px[..3] {
            *channel = ((*channel as u16 * a + 127) / 255) as u8;
        }
    }
    let size = tiny_skia::IntSize::from_wh(image.width, image.height)?;
    Pixmap::from_vec(data, size)
}

impl Surface for PixmapSurface {
    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn draw_base_image(&mut self, width: f64, height: f64) {
        let Some(base) = &self.base else {
            return;
        };
        let (bw, bh) = self.base_size;
        let transform = Transform::from_scale(width as f32 / bw as f32, height as f32 / bh as f32);
        self.pixmap
            .draw_pixmap(0, 0, base.as_ref(), &PixmapPaint::default(), transform, None);
    }

    fn stroke_rect(&mut self, min: Point, width: f64, height: f64, stroke: StrokeStyle) {
        if let Some(path) = Self::rect_path(min, width, height) {
            self.pixmap.stroke_path(
                &path,
                &Self::paint(stroke.color),
                &Self::stroke(stroke),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_rect(&mut self, min: Point, width: f64, height: f64, color: Color) {
        if let Some(path) = Self::rect_path(min, width, height) {
            self.pixmap
                .fill_path(&path, &Self::paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: StrokeStyle) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32) {
            self.pixmap.stroke_path(
                &path,
                &Self::paint(stroke.color),
                &Self::stroke(stroke),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32) {
            self.pixmap
                .fill_path(&path, &Self::paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn polyline(&mut self, points: &[Point], stroke: StrokeStyle) {
        if let Some(path) = Self::polyline_path(points, false) {
            self.pixmap.stroke_path(
                &path,
                &Self::paint(stroke.color),
                &Self::stroke(stroke),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if let Some(path) = Self::polyline_path(points, true) {
            self.pixmap
                .fill_path(&path, &Self::paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn text(&mut self, _anchor: Point, content: &str, _font_size: f64, _color: Color) {
        log::debug!("Export skips text label {:?}", content);
        self.skipped_text += 1;
    }
}

/// Paint `image` with `annotations` at natural size and write a PNG.
/// Returns the number of text labels that were left out.
pub fn export_annotated_png(
    path: &Path,
    image: &LoadedImage,
    annotations: &[Annotation],
    renderer: &Renderer,
) -> Result<usize> {
    let mapper = CoordinateMapper::identity(image.width as f64, image.height as f64);
    let mut surface = PixmapSurface::new(image.width, image.height, Some(image))?;
    renderer.render(&mut surface, &mapper, annotations, None, None);

    surface
        .pixmap()
        .save_png(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!(
        "Exported {} annotations to {}",
        annotations.len(),
        path.display()
    );
    if surface.skipped_text() > 0 {
        log::warn!("{} text labels are not included in the export", surface.skipped_text());
    }
    Ok(surface.skipped_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{BoxGeometry, Geometry, LocalKey};
    use crate::models::style::Style;

    fn gray_image(width: u32, height: u32) -> LoadedImage {
        LoadedImage {
            width,
            height,
            pixels: vec![128; (width * height * 4) as usize],
        }
    }

    #[test]
    fn test_export_paints_over_base_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");
        let image = gray_image(64, 64);
        let annotations = vec![
            Annotation::new(
                LocalKey(1),
                Geometry::Rectangle(BoxGeometry::new(Point::new(10.0, 10.0), 40.0, 40.0)),
                Style { stroke_width: 4.0, ..Style::default() },
            ),
            Annotation::new(
                LocalKey(2),
                Geometry::Text { anchor: Point::new(5.0, 60.0), content: "pop-in".to_string() },
                Style::default(),
            ),
        ];

        let skipped = export_annotated_png(&path, &image, &annotations, &Renderer::default()).unwrap();
        assert_eq!(skipped, 1);

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (64, 64));
        // On the rectangle's left edge: red stroke
        let edge = written.get_pixel(10, 30);
        assert!(edge[0] > 200 && edge[1] < 60, "edge pixel {:?}", edge);
        // Centre untouched: base image shows through
        let centre = written.get_pixel(30, 30);
        assert!((centre[0] as i32 - 128).abs() <= 2, "centre pixel {:?}", centre);
    }
}
