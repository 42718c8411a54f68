use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use eframe::egui::{self, Color32, RichText};
use eframe::egui::{FontData, FontDefinitions, FontFamily};
use odia_annotator_common::keyboard::{KEYBOARD, SPACE_KEY};
use odia_annotator_common::{
    Gateway, ImageRef, RequestKind, SessionState, DEFAULT_IMAGE_FOLDER, SUPPORTED_IMAGE_TYPES,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::worker::{ImageKind, UiMessage, Worker};

const KEY_SIZE: egui::Vec2 = egui::vec2(44.0, 36.0);
const THUMB_VIEW: egui::Vec2 = egui::vec2(40.0, 40.0);

type TextureKey = (ImageRef, ImageKind);

pub struct AnnotatorApp {
    state: SessionState,
    worker: Worker,
    rx: Receiver<UiMessage>,
    textures: HashMap<TextureKey, egui::TextureHandle>,
    inflight: HashSet<TextureKey>,
    broken: HashSet<TextureKey>,
    status: String,
}

impl AnnotatorApp {
    pub fn new(ctx: &egui::Context, gateway: Arc<dyn Gateway>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            state: SessionState::new(),
            worker: Worker::new(gateway, runtime, tx, ctx.clone()),
            rx,
            textures: HashMap::new(),
            inflight: HashSet::new(),
            broken: HashSet::new(),
            status: String::new(),
        };
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            app.state.set_api_key(key);
        }
        app.hydrate();
        app
    }

    fn hydrate(&mut self) {
        if let Ok(permit) = self.state.acquire(RequestKind::ListAnnotations) {
            self.worker.list_annotations(permit);
        }
    }

    fn load_folder(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", SUPPORTED_IMAGE_TYPES)
            .pick_files()
        else {
            return;
        };
        if paths.is_empty() {
            return;
        }
        if let Ok(permit) = self.state.acquire(RequestKind::Upload) {
            self.status = format!("Uploading {} images...", paths.len());
            self.worker.upload_images(paths, permit);
        }
    }

    fn load_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new().add_filter("CSV", &["csv"]).pick_file() else {
            return;
        };
        if let Ok(permit) = self.state.acquire(RequestKind::ImportCsv) {
            self.status = format!("Loading {}...", path.display());
            self.worker.import_csv(path, DEFAULT_IMAGE_FOLDER.to_string(), permit);
        }
    }

    fn process_ocr(&mut self) {
        let Ok(request) = self.state.begin_ocr() else {
            return;
        };
        if let Ok(permit) = self.state.acquire(RequestKind::Ocr) {
            self.status = format!("Running OCR on {} images...", request.image_filenames.len());
            self.worker.process_ocr(request, permit);
        }
    }

    fn save_current(&mut self) {
        let Ok(request) = self.state.save_request() else {
            return;
        };
        if let Ok(permit) = self.state.acquire(RequestKind::Save) {
            self.worker.save_annotations(request, permit);
        }
    }

    fn request_image(&mut self, image: &ImageRef, kind: ImageKind) {
        let key = (image.clone(), kind);
        if self.textures.contains_key(&key) || self.inflight.contains(&key) || self.broken.contains(&key) {
            return;
        }
        self.inflight.insert(key);
        self.worker.fetch_image(image.clone(), kind);
    }

    fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply(ctx, message);
        }
    }

    fn apply(&mut self, ctx: &egui::Context, message: UiMessage) {
        // permits are dropped at the end of each arm, after the state update
        match message {
            UiMessage::Listed { outcome, permit: _permit } => {
                if self.state.complete_initialize(outcome).is_ok() {
                    self.status = format!("{} images", self.state.images().len());
                }
            }
            UiMessage::Imported { outcome, permit: _permit } => {
                if self.state.complete_import(outcome).is_ok() {
                    self.status = format!("{} images loaded from CSV", self.state.images().len());
                }
            }
            UiMessage::Uploaded { outcome, permit: _permit } => {
                if let Ok(accepted) = self.state.complete_upload(outcome) {
                    self.status = format!("{} images uploaded", accepted);
                }
            }
            UiMessage::Processed { outcome, permit: _permit } => {
                if self.state.complete_ocr(outcome).is_ok() {
                    self.status = "OCR complete".to_string();
                }
            }
            UiMessage::Saved { outcome, permit: _permit } => {
                if let Ok(ack) = self.state.complete_save(outcome) {
                    self.status = ack.message.unwrap_or_else(|| "Annotation saved".to_string());
                }
            }
            UiMessage::Image { image, kind, decoded } => {
                let key = (image, kind);
                self.inflight.remove(&key);
                match decoded {
                    Ok(decoded) => {
                        let color_image = egui::ColorImage::from_rgba_unmultiplied(decoded.size, &decoded.pixels);
                        let name = format!("{:?}:{}", key.1, key.0);
                        let texture = ctx.load_texture(name, color_image, egui::TextureOptions::default());
                        self.textures.insert(key, texture);
                    }
                    Err(err) => {
                        warn!(image = %key.0, "image unavailable: {err:#}");
                        if kind == ImageKind::Full && self.state.current_image() == Some(&key.0) {
                            self.state.report_failure(RequestKind::FetchImage, &format!("{err:#}"));
                        }
                        self.broken.insert(key);
                    }
                }
            }
        }
    }

    fn render_error(&mut self, ui: &mut egui::Ui) {
        let Some(message) = self.state.last_error().map(str::to_string) else {
            return;
        };
        egui::Frame::none()
            .fill(Color32::from_rgb(120, 30, 30))
            .rounding(egui::Rounding::same(6.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(message).color(Color32::WHITE));
                    if ui.small_button("✕").clicked() {
                        self.state.clear_error();
                    }
                });
            });
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_busy();
        ui.horizontal(|ui| {
            let mut key = self.state.api_key().to_string();
            let field = egui::TextEdit::singleline(&mut key)
                .password(true)
                .hint_text("Gemini API Key")
                .desired_width(220.0);
            if ui.add(field).changed() {
                self.state.set_api_key(key);
            }

            if ui.button("Load Folder").clicked() {
                self.load_folder();
            }
            if ui.add_enabled(!busy, egui::Button::new("Process OCR")).clicked() {
                self.process_ocr();
            }
            if ui.add_enabled(!busy, egui::Button::new("Load CSV")).clicked() {
                self.load_csv();
            }
            // writes the current image's row into the backend's annotation CSV
            if ui.button("Save CSV").clicked() {
                self.save_current();
            }

            ui.separator();
            if busy {
                ui.spinner();
            }
            if !self.status.is_empty() {
                ui.label(RichText::new(&self.status).color(Color32::from_gray(170)));
            }
        });
    }

    fn render_selector(&mut self, ui: &mut egui::Ui) {
        let images = self.state.images().to_vec();
        let current = self.state.current_index();

        ui.horizontal(|ui| {
            let at_start = current.map_or(true, |index| index == 0);
            let at_end = current.map_or(true, |index| index + 1 >= images.len());
            if ui.add_enabled(!at_start, egui::Button::new("◀ Previous")).clicked() {
                self.state.move_previous();
            }

            let label = match (current, self.state.current_image()) {
                (Some(index), Some(image)) => format!("{} ({}/{}) ▾", image, index + 1, images.len()),
                _ => "No images loaded".to_string(),
            };
            if ui.add_enabled(!images.is_empty(), egui::Button::new(label)).clicked() {
                self.state.toggle_selector();
            }

            if ui.add_enabled(!at_end, egui::Button::new("Next ▶")).clicked() {
                self.state.move_next();
            }
        });

        if !self.state.selector_open() {
            return;
        }

        let mut picked = None;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            egui::ScrollArea::vertical()
                .max_height(320.0)
                .show_rows(ui, THUMB_VIEW.y + 4.0, images.len(), |ui, range| {
                    for index in range {
                        let image = &images[index];
                        ui.horizontal(|ui| {
                            match self.textures.get(&(image.clone(), ImageKind::Thumb)) {
                                Some(texture) => {
                                    ui.add(egui::Image::new(texture).fit_to_exact_size(THUMB_VIEW));
                                }
                                None => {
                                    self.request_image(image, ImageKind::Thumb);
                                    ui.allocate_space(THUMB_VIEW);
                                }
                            }
                            if ui.selectable_label(current == Some(index), image.as_str()).clicked() {
                                picked = Some(index);
                            }
                        });
                    }
                });
        });
        if let Some(index) = picked {
            debug!(index, "image picked from selector");
            let _ = self.state.select_image(index);
        }
    }

    fn render_image_pane(&mut self, ui: &mut egui::Ui) {
        let Some(image) = self.state.current_image().cloned() else {
            ui.centered_and_justified(|ui| {
                ui.label("Upload images or load a CSV to start annotating.");
            });
            return;
        };
        let key = (image.clone(), ImageKind::Full);
        if let Some(texture) = self.textures.get(&key) {
            ui.add(egui::Image::new(texture).max_size(ui.available_size()).maintain_aspect_ratio(true));
        } else if self.broken.contains(&key) {
            ui.label(format!("{} could not be displayed", image));
        } else {
            self.request_image(&image, ImageKind::Full);
            ui.spinner();
        }
    }

    fn render_editor(&mut self, ui: &mut egui::Ui) {
        let mut enabled = self.state.keyboard_enabled();
        if ui.checkbox(&mut enabled, "Enable Odia Keyboard").changed() {
            self.state.set_keyboard_enabled(enabled);
        }

        let mut text = self.state.text_buffer().to_string();
        let editor = egui::TextEdit::multiline(&mut text)
            .desired_rows(8)
            .desired_width(f32::INFINITY)
            .font(egui::TextStyle::Heading);
        if ui.add(editor).changed() {
            self.state.edit_text(text);
        }

        let can_save = self.state.current_image().is_some();
        if ui.add_enabled(can_save, egui::Button::new("Save Current Annotation")).clicked() {
            self.save_current();
        }

        if let Some(record) = self.state.current_record() {
            ui.add_space(8.0);
            ui.label(RichText::new("Extracted Text").strong());
            ui.label(&record.extracted_text);
        }

        ui.add_space(8.0);
        self.render_keyboard(ui);
    }

    fn render_keyboard(&mut self, ui: &mut egui::Ui) {
        let mut typed = None;
        egui::Grid::new("odia_keyboard").spacing([4.0, 4.0]).show(ui, |ui| {
            for row in KEYBOARD.iter() {
                for cell in row.iter() {
                    let button = egui::Button::new(RichText::new(cell.glyph).size(20.0)).min_size(KEY_SIZE);
                    if ui.add(button).on_hover_text(cell.latin).clicked() {
                        typed = Some(cell.glyph);
                    }
                }
                ui.end_row();
            }
        });
        let space = egui::Button::new("Space").min_size(egui::vec2(KEY_SIZE.x * 6.0, KEY_SIZE.y));
        if ui.add(space).clicked() {
            typed = Some(SPACE_KEY.glyph);
        }
        if let Some(glyph) = typed {
            self.state.insert_character(glyph);
        }
    }
}

/// Use the first Odia-capable system font as a fallback face
pub fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();
    let candidates = [
        r"C:\Windows\Fonts\kalinga.ttf",
        "/System/Library/Fonts/Supplemental/Oriya Sangam MN.ttc",
        "/usr/share/fonts/truetype/noto/NotoSansOriya-Regular.ttf",
        "/usr/share/fonts/opentype/noto/NotoSansOriya-Regular.ttf",
        "/usr/share/fonts/truetype/lohit-oriya/Lohit-Odia.ttf",
        "/usr/share/fonts/google-noto/NotoSansOriya-Regular.ttf",
    ];

    for path in candidates {
        if let Ok(data) = std::fs::read(path) {
            fonts.font_data.insert("odia_fallback".to_string(), FontData::from_owned(data));
            for family in [FontFamily::Proportional, FontFamily::Monospace] {
                fonts.families.entry(family).or_default().push("odia_fallback".to_string());
            }
            ctx.set_fonts(fonts);
            debug!(path, "odia font loaded");
            return;
        }
    }
    warn!("no Odia font found; glyphs may render as boxes");
}

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.heading("Odia OCR Annotation Tool");
            self.render_error(ui);
            self.render_controls(ui);
            self.render_selector(ui);
            ui.add_space(4.0);
        });

        egui::SidePanel::right("editor")
            .resizable(true)
            .default_width(620.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_editor(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_image_pane(ui);
        });
    }
}
