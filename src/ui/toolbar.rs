// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and style controls.
//!
//! Tool selection plus the colour, stroke, fill, opacity and font size
//! applied to the next annotation drawn.

use crate::editor::controller::DrawingController;
use crate::editor::tool::Tool;
use crate::models::style::{Color, DEFAULT_FONT_SIZE};

/// Display the toolbar with tool selection buttons.
pub fn show(ui: &mut egui::Ui, controller: &mut DrawingController) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        let current = controller.tool();
        for (index, tool) in Tool::ALL.into_iter().enumerate() {
            let shortcut = match Tool::from_digit(index as u8 + 1) {
                Some(t) if t == tool => format!(" ({})", index + 1),
                _ => String::new(),
            };
            if ui
                .selectable_label(current == tool, tool.label())
                .on_hover_text(format!("{}{}", tool.hint(), shortcut))
                .clicked()
            {
                controller.set_tool(tool);
            }
        }
    });

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;
        let style = controller.style_mut();

        ui.label("Colour:");
        let mut stroke = color32(Color::parse_or(&style.color, Color::RED));
        if ui.color_edit_button_srgba(&mut stroke).changed() {
            style.color = from_color32(stroke).to_hex();
        }

        ui.separator();
        ui.add(egui::Slider::new(&mut style.stroke_width, 1.0..=20.0).text("Stroke"));

        ui.separator();
        let mut filled = style.fill_color.is_some();
        if ui.checkbox(&mut filled, "Fill").changed() {
            style.fill_color = filled.then(|| style.color.clone());
        }
        if let Some(fill) = style.fill_color.as_mut() {
            let mut fill32 = color32(Color::parse_or(fill, Color::RED));
            if ui.color_edit_button_srgba(&mut fill32).changed() {
                *fill = from_color32(fill32).to_hex();
            }
        }

        ui.separator();
        ui.add(egui::Slider::new(&mut style.opacity, 0.1..=1.0).text("Opacity"));

        ui.separator();
        let font_size = style.font_size.get_or_insert(DEFAULT_FONT_SIZE);
        ui.add(egui::Slider::new(font_size, 8.0..=72.0).text("Font"));
    });
}

fn color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn from_color32(color: egui::Color32) -> Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color { r, g, b, a }
}
