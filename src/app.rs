// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app hosts one editing session: it loads the image and its stored
//! annotations in the background, then routes canvas, panel and keyboard
//! input to the drawing controller and reports save results in the status
//! bar.

use crate::config::EditorConfig;
use crate::editor::controller::{DrawingController, KeyCommand, KeyOutcome, SaveStatus, TextPrompt};
use crate::editor::history::History;
use crate::io::gateway::{load_or_empty, PersistenceGateway};
use crate::io::media::LoadedImage;
use crate::io::wire::AnnotationRecord;
use crate::models::annotation::Point;
use crate::ui::{canvas, properties, toolbar};
use crate::util::geometry::CoordinateMapper;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

/// Result of background session loading.
struct LoadedSession {
    image: LoadedImage,
    records: Vec<AnnotationRecord>,
}

/// Text label waiting for the reviewer to type it.
struct TextDialog {
    display: Point,
    content: String,
}

/// Opens the label dialog; the label is placed once the dialog is confirmed.
struct DialogPrompt<'a> {
    dialog: &'a mut Option<TextDialog>,
    display: Point,
}

impl TextPrompt for DialogPrompt<'_> {
    fn request_text(&mut self, _anchor: Point) -> Option<String> {
        *self.dialog = Some(TextDialog {
            display: self.display,
            content: String::new(),
        });
        None
    }
}

/// Main application state.
pub struct ReviewApp {
    config: EditorConfig,
    gateway: Arc<dyn PersistenceGateway>,
    target: String,
    image_path: PathBuf,

    /// Editing session, once the image has loaded
    controller: Option<DrawingController>,

    /// Base image, kept for export
    image: Option<LoadedImage>,
    texture: Option<egui::TextureHandle>,

    /// Receiver for background loading
    loader: Option<Receiver<Result<LoadedSession, String>>>,
    loading_message: Option<String>,

    /// Last message for the status bar
    status: Option<String>,
    text_dialog: Option<TextDialog>,
}

impl ReviewApp {
    pub fn new(
        config: EditorConfig,
        gateway: Arc<dyn PersistenceGateway>,
        target: String,
        image_path: PathBuf,
    ) -> Self {
        let mut app = Self {
            config,
            gateway,
            target,
            image_path,
            controller: None,
            image: None,
            texture: None,
            loader: None,
            loading_message: None,
            status: None,
            text_dialog: None,
        };
        app.start_loading();
        app
    }

    /// Load the image and the target's annotations (asynchronously).
    fn start_loading(&mut self) {
        let (sender, receiver) = channel();
        self.loader = Some(receiver);
        self.loading_message = Some(format!("Loading {}...", self.image_path.display()));

        let path = self.image_path.clone();
        let gateway = Arc::clone(&self.gateway);
        let target = self.target.clone();

        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedSession, String> {
                let image = crate::io::media::load_image(&path)
                    .map_err(|e| format!("Failed to load image: {:#}", e))?;
                log::info!("Loaded image: {} ({}x{})", path.display(), image.width, image.height);

                let records = load_or_empty(gateway.as_ref(), &target);
                Ok(LoadedSession { image, records })
            })();

            let _ = sender.send(result);
        });
    }

    fn open_session(&mut self, ctx: &egui::Context, session: LoadedSession) {
        let LoadedSession { image, records } = session;
        let size = [image.width as usize, image.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
        self.texture = Some(ctx.load_texture("review_image", color_image, egui::TextureOptions::LINEAR));

        let (width, height) = (image.width as f64, image.height as f64);
        let mut controller = DrawingController::new(
            self.target.clone(),
            CoordinateMapper::new(width, height, width, height),
            self.config.renderer(),
            Arc::clone(&self.gateway),
            History::new(self.config.editor.history_limit),
            self.config.editor_settings(),
        );
        controller.seed(records);
        self.status = Some(format!("{} annotations loaded", controller.scene().len()));
        self.controller = Some(controller);
        self.image = Some(image);
    }

    fn export_png(&mut self) {
        let (Some(controller), Some(image)) = (&self.controller, &self.image) else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(format!("{}-annotated.png", self.target))
            .save_file()
        else {
            return;
        };

        let result = crate::io::export::export_annotated_png(
            &path,
            image,
            controller.scene().annotations(),
            controller.renderer(),
        );
        self.status = Some(match result {
            Ok(0) => format!("Exported {}", path.display()),
            Ok(skipped) => format!("Exported {} ({} text labels left out)", path.display(), skipped),
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    fn show_text_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.text_dialog.as_mut() else {
            return;
        };

        let mut submit = false;
        let mut cancel = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        egui::Window::new("Add label")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let edit = ui.text_edit_singleline(&mut dialog.content);
                edit.request_focus();
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    submit |= ui.button("Add").clicked();
                    cancel |= ui.button("Cancel").clicked();
                });
            });

        if submit {
            if let (Some(dialog), Some(controller)) = (self.text_dialog.take(), self.controller.as_mut()) {
                controller.place_text(dialog.display, dialog.content);
            }
        } else if cancel {
            self.text_dialog = None;
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let commands: Vec<KeyCommand> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key { key, pressed: true, modifiers, .. } => {
                        key_command(*key, *modifiers)
                    }
                    _ => None,
                })
                .collect()
        });

        for command in commands {
            let Some(controller) = self.controller.as_mut() else {
                if command == KeyCommand::Escape {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                continue;
            };
            if controller.handle_key(command) == KeyOutcome::Close {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn apply_canvas_actions(&mut self, actions: Vec<canvas::CanvasAction>) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        for action in actions {
            match action {
                canvas::CanvasAction::PointerDown(p) => controller.pointer_down(p),
                canvas::CanvasAction::PointerMove(p) => controller.pointer_move(p),
                canvas::CanvasAction::PointerUp(p) => controller.pointer_up(p),
                canvas::CanvasAction::Click(p) => {
                    let mut prompt = DialogPrompt { dialog: &mut self.text_dialog, display: p };
                    controller.click(p, &mut prompt);
                }
            }
        }
    }
}

/// Map a key press to an editor command.
pub fn key_command(key: egui::Key, modifiers: egui::Modifiers) -> Option<KeyCommand> {
    if modifiers.command {
        return match key {
            egui::Key::Z if modifiers.shift => Some(KeyCommand::Redo),
            egui::Key::Z => Some(KeyCommand::Undo),
            egui::Key::Y => Some(KeyCommand::Redo),
            _ => None,
        };
    }
    let digit = match key {
        egui::Key::Num1 => 1,
        egui::Key::Num2 => 2,
        egui::Key::Num3 => 3,
        egui::Key::Num4 => 4,
        egui::Key::Num5 => 5,
        egui::Key::Num6 => 6,
        egui::Key::Num7 => 7,
        egui::Key::Num8 => 8,
        egui::Key::Num9 => 9,
        egui::Key::Num0 => 0,
        egui::Key::Escape => return Some(KeyCommand::Escape),
        egui::Key::Delete => return Some(KeyCommand::Delete),
        egui::Key::Backspace => return Some(KeyCommand::Backspace),
        _ => return None,
    };
    Some(KeyCommand::Digit(digit))
}

impl eframe::App for ReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed loading
        if let Some(ref receiver) = self.loader {
            if let Ok(result) = receiver.try_recv() {
                self.loader = None;
                self.loading_message = None;
                match result {
                    Ok(session) => self.open_session(ctx, session),
                    Err(e) => {
                        log::error!("{}", e);
                        self.status = Some(e);
                    }
                }
            }
        }

        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        if let Some(controller) = self.controller.as_mut() {
            for status in controller.poll_saves() {
                if let SaveStatus::Failed { .. } = status {
                    log::warn!("{}", status.message());
                }
                self.status = Some(status.message());
            }
            if controller.pending_saves() > 0 {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
        }

        // Top menu bar
        let mut export_requested = false;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let ready = self.controller.is_some();
                    if ui.add_enabled(ready, egui::Button::new("Export Annotated PNG...")).clicked() {
                        export_requested = true;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Close (Esc)").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let Some(controller) = self.controller.as_mut() else {
                        ui.label("Loading...");
                        return;
                    };
                    if ui
                        .add_enabled(controller.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        controller.undo();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(controller.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)"))
                        .clicked()
                    {
                        controller.redo();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_selection = controller.scene().selected_key().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        controller.delete_selection();
                        ui.close_menu();
                    }
                    let has_any = !controller.scene().is_empty();
                    if ui.add_enabled(has_any, egui::Button::new("Clear All")).clicked() {
                        controller.clear_all();
                        ui.close_menu();
                    }
                });
            });
        });
        if export_requested {
            self.export_png();
        }

        // Toolbar
        if let Some(controller) = self.controller.as_mut() {
            egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
                toolbar::show(ui, controller);
            });
        }

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Reviewing {}", self.target));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        // Annotation list (right side)
        if let Some(controller) = self.controller.as_mut() {
            let action = egui::SidePanel::right("properties")
                .default_width(250.0)
                .show(ctx, |ui| properties::show(ui, controller.scene(), controller.pending_saves()))
                .inner;
            match action {
                properties::PropertiesAction::Select(key) => {
                    controller.select(key);
                }
                properties::PropertiesAction::Delete(key) => {
                    if controller.select(key) {
                        controller.delete_selection();
                    }
                }
                properties::PropertiesAction::None => {}
            }
        }

        // The label dialog owns the keyboard while it is open
        let dialog_open = self.text_dialog.is_some();
        self.show_text_dialog(ctx);
        if !dialog_open {
            self.handle_keys(ctx);
        }

        // Main canvas (center)
        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    Vec::new()
                } else if let Some(controller) = self.controller.as_mut() {
                    if self.text_dialog.is_some() {
                        // Modal: the canvas only paints while the label dialog is open
                        canvas::show(ui, controller, self.texture.as_ref());
                        Vec::new()
                    } else {
                        canvas::show(ui, controller, self.texture.as_ref())
                    }
                } else {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            egui::RichText::new("Could not open the image, see the status bar")
                                .color(egui::Color32::from_gray(180)),
                        );
                    });
                    Vec::new()
                }
            })
            .inner;
        self.apply_canvas_actions(actions);
    }
}
