// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the mapping between natural image pixels and the
//! scaled display surface, plus the point/segment math shared by hit
//! testing and rendering.

use crate::models::annotation::Point;

/// Converts between natural image space and display space.
///
/// The display surface is the image scaled uniformly to fit its container,
/// never enlarged beyond natural resolution, and centred in the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    natural_width: f64,
    natural_height: f64,
    container_width: f64,
    container_height: f64,
    scale: f64,
}

impl CoordinateMapper {
    pub fn new(
        natural_width: f64,
        natural_height: f64,
        container_width: f64,
        container_height: f64,
    ) -> Self {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        let scale = if valid(natural_width)
            && valid(natural_height)
            && valid(container_width)
            && valid(container_height)
        {
            (container_width / natural_width)
                .min(container_height / natural_height)
                .min(1.0)
        } else {
            log::warn!(
                "Degenerate mapping {}x{} into {}x{}, using scale 1",
                natural_width,
                natural_height,
                container_width,
                container_height
            );
            1.0
        };

        Self {
            natural_width,
            natural_height,
            container_width,
            container_height,
            scale,
        }
    }

    /// Mapping at natural resolution, used for exports.
    pub fn identity(natural_width: f64, natural_height: f64) -> Self {
        Self::new(natural_width, natural_height, natural_width, natural_height)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn natural_size(&self) -> (f64, f64) {
        (self.natural_width, self.natural_height)
    }

    /// Size of the scaled drawing surface.
    pub fn surface_size(&self) -> (f64, f64) {
        (self.natural_width * self.scale, self.natural_height * self.scale)
    }

    /// Offset of the surface's top-left corner inside the container.
    pub fn surface_offset(&self) -> (f64, f64) {
        let (w, h) = self.surface_size();
        (
            ((self.container_width - w) / 2.0).max(0.0),
            ((self.container_height - h) / 2.0).max(0.0),
        )
    }

    pub fn to_natural(&self, display: Point) -> Point {
        Point::new(display.x / self.scale, display.y / self.scale)
    }

    pub fn to_display(&self, natural: Point) -> Point {
        Point::new(natural.x * self.scale, natural.y * self.scale)
    }

    pub fn to_display_len(&self, natural: f64) -> f64 {
        natural * self.scale
    }
}

/// Distance from `p` to the segment `a`-`b`, projecting onto the segment
/// with the parameter clamped to `[0, 1]`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return p.distance(&a);
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_natural_to_display_roundtrip() {
        let scales = [(800.0, 600.0, 400.0, 300.0), (1920.0, 1080.0, 1280.0, 720.0), (333.0, 777.0, 1000.0, 250.0)];
        for (nw, nh, cw, ch) in scales {
            let mapper = CoordinateMapper::new(nw, nh, cw, ch);
            for i in 0..20 {
                for j in 0..20 {
                    let p = Point::new(i as f64 * 37.3, j as f64 * 11.9);
                    let back = mapper.to_display(mapper.to_natural(p));
                    assert!((back.x - p.x).abs() < 1e-9);
                    assert!((back.y - p.y).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_scale_fits_container() {
        let mapper = CoordinateMapper::new(800.0, 600.0, 400.0, 300.0);
        assert_eq!(mapper.scale(), 0.5);
        assert_eq!(mapper.surface_size(), (400.0, 300.0));
        assert_eq!(mapper.surface_offset(), (0.0, 0.0));

        // Taller container: width limits, surface centred vertically
        let mapper = CoordinateMapper::new(800.0, 600.0, 400.0, 500.0);
        assert_eq!(mapper.scale(), 0.5);
        assert_eq!(mapper.surface_offset(), (0.0, 100.0));
    }

    #[test]
    fn test_never_upscales() {
        let mapper = CoordinateMapper::new(200.0, 100.0, 1000.0, 1000.0);
        assert_eq!(mapper.scale(), 1.0);
        assert_eq!(mapper.surface_offset(), (400.0, 450.0));
    }

    #[test]
    fn test_degenerate_sizes_fall_back() {
        assert_eq!(CoordinateMapper::new(0.0, 100.0, 50.0, 50.0).scale(), 1.0);
        assert_eq!(CoordinateMapper::new(100.0, 100.0, f64::NAN, 50.0).scale(), 1.0);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        // Beyond the end clamps to the endpoint
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        // Zero-length segment is a point
        assert_eq!(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0);
    }
}
