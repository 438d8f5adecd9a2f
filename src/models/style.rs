// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation styling.
//!
//! Colours travel as CSS-style hex strings so stored records stay readable;
//! they are parsed into [`Color`] only when painting.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#ff0000";
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;
pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Visual style of an annotation. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    pub color: String,
    pub stroke_width: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    pub opacity: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill_color: None,
            font_size: None,
            opacity: DEFAULT_OPACITY,
        }
    }
}

impl Style {
    pub fn stroke_color(&self) -> Color {
        Color::parse_or(&self.color, Color::RED).with_opacity(self.opacity)
    }

    pub fn fill(&self) -> Option<Color> {
        self.fill_color
            .as_deref()
            .map(|c| Color::parse_or(c, Color::RED).with_opacity(self.opacity))
    }

    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }
}

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(0xff, 0x00, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0xff, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
                Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: byte(6)? }),
            _ => None,
        }
    }

    pub fn parse_or(value: &str, fallback: Color) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            log::warn!("Invalid colour {:?}, using fallback", value);
            fallback
        })
    }

    /// Scale alpha by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 };
        Self { a: (self.a as f32 * opacity).round() as u8, ..self }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Color::parse("#ff0000"), Some(Color::RED));
        assert_eq!(Color::parse("#0f0"), Some(Color::GREEN));
        assert_eq!(
            Color::parse("#11223380"),
            Some(Color { r: 0x11, g: 0x22, b: 0x33, a: 0x80 })
        );
        assert_eq!(Color::parse("red"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#gg0000"), None);
    }

    #[test]
    fn test_opacity_scales_alpha() {
        assert_eq!(Color::RED.with_opacity(0.5).a, 128);
        assert_eq!(Color::RED.with_opacity(2.0).a, 255);
        assert_eq!(Color::RED.with_opacity(f32::NAN).a, 255);
    }

    #[test]
    fn test_style_defaults_from_partial_json() {
        let style: Style = serde_json::from_str(r##"{"color":"#00ff00"}"##).unwrap();
        assert_eq!(style.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(style.opacity, DEFAULT_OPACITY);
        assert_eq!(style.font_size(), DEFAULT_FONT_SIZE);
        assert_eq!(style.stroke_color(), Color::GREEN);
        assert_eq!(style.fill(), None);
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let style = Style { color: "not-a-colour".to_string(), ..Style::default() };
        assert_eq!(style.stroke_color(), Color::RED);
    }

    #[test]
    fn test_hex_roundtrip_string() {
        assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203");
    }
}
