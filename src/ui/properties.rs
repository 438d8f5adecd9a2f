// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation list panel.
//!
//! Lists the scene's annotations in paint order with their storage state,
//! and lets the reviewer select or delete one.

use crate::models::annotation::{Annotation, Geometry, LocalKey};
use crate::models::scene::Scene;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    Select(LocalKey),
    Delete(LocalKey),
}

/// Display the annotation list.
pub fn show(ui: &mut egui::Ui, scene: &Scene, pending_saves: usize) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Annotations");
    ui.label(format!("{} on this image", scene.len()));
    if pending_saves > 0 {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Saving {}...", pending_saves));
        });
    }
    ui.separator();

    if scene.is_empty() {
        ui.label(egui::RichText::new("Nothing marked up yet").weak());
        return action;
    }

    let selected = scene.selected_key();
    egui::ScrollArea::vertical().show(ui, |ui| {
        for annotation in scene.annotations().iter().rev() {
            let is_selected = selected == Some(annotation.key);
            ui.horizontal(|ui| {
                if ui.selectable_label(is_selected, summary(annotation)).clicked() {
                    action = PropertiesAction::Select(annotation.key);
                }
                if is_selected && ui.small_button("🗑").on_hover_text("Delete").clicked() {
                    action = PropertiesAction::Delete(annotation.key);
                }
            });

            if is_selected {
                ui.indent(annotation.key.0, |ui| details(ui, annotation));
            }
        }
    });

    action
}

fn summary(annotation: &Annotation) -> String {
    match &annotation.geometry {
        Geometry::Text { content, .. } => format!("{} \"{}\"", annotation.kind(), content),
        Geometry::Freehand { points } => format!("{} ({} points)", annotation.kind(), points.len()),
        _ => annotation.kind().to_string(),
    }
}

fn details(ui: &mut egui::Ui, annotation: &Annotation) {
    match &annotation.id {
        Some(id) => ui.label(egui::RichText::new(format!("id: {}", id)).small()),
        None => ui.label(egui::RichText::new("not saved").small().italics()),
    };
    if let Some(author) = &annotation.author {
        ui.label(egui::RichText::new(format!("by {}", author)).small());
    }
    if let Some(created) = annotation.created_at {
        ui.label(egui::RichText::new(created.format("%Y-%m-%d %H:%M").to_string()).small());
    }
    ui.label(
        egui::RichText::new(format!(
            "{} · {}px",
            annotation.style.color, annotation.style.stroke_width
        ))
        .small()
        .weak(),
    );
}
