// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the image under review.
//!
//! This module paints the scaled image and its annotations through an egui
//! painter, and translates pointer input into surface-local display
//! coordinates for the drawing controller.

use crate::editor::controller::DrawingController;
use crate::editor::render::{StrokeStyle, Surface};
use crate::models::annotation::Point;
use crate::models::style::Color;

/// Pointer input on the drawing surface, in display coordinates relative to
/// the surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Click(Point),
}

/// egui painter backend for the renderer.
pub struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    texture: Option<egui::TextureId>,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a egui::Painter, origin: egui::Pos2, texture: Option<egui::TextureId>) -> Self {
        Self { painter, origin, texture }
    }

    fn pos(&self, p: Point) -> egui::Pos2 {
        self.origin + egui::vec2(p.x as f32, p.y as f32)
    }

    fn rect(&self, min: Point, width: f64, height: f64) -> egui::Rect {
        egui::Rect::from_min_size(self.pos(min), egui::vec2(width as f32, height as f32))
    }
}

fn color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn stroke(style: StrokeStyle) -> egui::Stroke {
    egui::Stroke::new(style.width, color32(style.color))
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self) {
        // egui repaints from scratch every frame
    }

    fn draw_base_image(&mut self, width: f64, height: f64) {
        let rect = self.rect(Point::default(), width, height);
        match self.texture {
            Some(texture) => {
                self.painter.image(
                    texture,
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                self.painter.rect_filled(rect, 0.0, egui::Color32::from_gray(60));
            }
        }
    }

    fn stroke_rect(&mut self, min: Point, width: f64, height: f64, style: StrokeStyle) {
        self.painter
            .rect_stroke(self.rect(min, width, height), 0.0, stroke(style));
    }

    fn fill_rect(&mut self, min: Point, width: f64, height: f64, color: Color) {
        self.painter
            .rect_filled(self.rect(min, width, height), 0.0, color32(color));
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, style: StrokeStyle) {
        self.painter
            .circle_stroke(self.pos(center), radius as f32, stroke(style));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.painter
            .circle_filled(self.pos(center), radius as f32, color32(color));
    }

    fn polyline(&mut self, points: &[Point], style: StrokeStyle) {
        let points: Vec<egui::Pos2> = points.iter().map(|p| self.pos(*p)).collect();
        self.painter.add(egui::Shape::line(points, stroke(style)));
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        let points: Vec<egui::Pos2> = points.iter().map(|p| self.pos(*p)).collect();
        self.painter.add(egui::Shape::convex_polygon(
            points,
            color32(color),
            egui::Stroke::NONE,
        ));
    }

    fn text(&mut self, anchor: Point, content: &str, font_size: f64, color: Color) {
        self.painter.text(
            self.pos(anchor),
            egui::Align2::LEFT_BOTTOM,
            content,
            egui::FontId::proportional(font_size as f32),
            color32(color),
        );
    }
}

/// Display the canvas and collect this frame's pointer input.
///
/// The controller's container is updated to the space available here, so
/// the image is fitted (never enlarged) and centred.
pub fn show(
    ui: &mut egui::Ui,
    controller: &mut DrawingController,
    texture: Option<&egui::TextureHandle>,
) -> Vec<CanvasAction> {
    let mut actions = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available = ui.available_size();
    controller.set_container(available.x as f64, available.y as f64);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available);

        let mapper = *controller.mapper();
        let (width, height) = mapper.surface_size();
        let (dx, dy) = mapper.surface_offset();
        let surface_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(dx as f32, dy as f32),
            egui::vec2(width as f32, height as f32),
        );

        let response = ui.allocate_rect(surface_rect, egui::Sense::click_and_drag());
        let local = |pos: egui::Pos2| {
            let offset = pos - surface_rect.min;
            Point::new(offset.x as f64, offset.y as f64)
        };

        let (pressed, released, moved, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.pointer.interact_pos().or(i.pointer.hover_pos()),
            )
        });

        if let Some(pos) = pos {
            if pressed && response.hovered() {
                actions.push(CanvasAction::PointerDown(local(pos)));
            }
            if moved && controller.is_drafting() {
                actions.push(CanvasAction::PointerMove(local(pos)));
            }
            // Released anywhere, so a drag ending off the image still finishes
            if released {
                actions.push(CanvasAction::PointerUp(local(pos)));
            }
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                actions.push(CanvasAction::Click(local(pos)));
            }
        }

        let painter = ui.painter_at(ui.max_rect());
        let mut surface = PainterSurface::new(&painter, surface_rect.min, texture.map(|t| t.id()));
        controller.render(&mut surface);

        if response.hovered() && controller.tool().drafts().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Tool: {}", controller.tool().label()));
        ui.separator();
        ui.label(egui::RichText::new(controller.tool().hint()).italics().weak());
        ui.separator();
        ui.label(format!("Scale {:.0}%", controller.mapper().scale() * 100.0));
    });

    actions
}
