//! Main window: clip list, preview and export controls.

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use montage_core::{format_timecode, video_extensions, MediaFile, MontageConfig};
use montage_media::{ExportArtifact, ExportError, FfprobeProber, SidecarLoader};
use montage_preview::PreviewState;
use montage_session::{probe_sources, ProbedSource, Session};
use montage_timeline::{ClipId, MoveDirection, TrimUpdate};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::surface::ClockSurface;

type ExportOutcome = Result<ExportArtifact, ExportError>;

/// Edits requested from the clip list, applied after it is drawn.
enum ClipAction {
    Remove(ClipId),
    Move(ClipId, MoveDirection),
    Trim(ClipId, TrimUpdate),
}

pub struct MontageApp {
    session: Session<ClockSurface, SidecarLoader>,
    prober: FfprobeProber,
    runtime: Runtime,
    import_tx: Sender<Vec<ProbedSource>>,
    import_rx: Receiver<Vec<ProbedSource>>,
    importing: bool,
    export_tx: Sender<ExportOutcome>,
    export_rx: Receiver<ExportOutcome>,
    export_poll: Duration,
}

impl MontageApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: MontageConfig, runtime: Runtime) -> Self {
        let interval = Duration::from_millis(config.time_update_interval_ms);
        let loader = SidecarLoader::new(config.work_dir.clone()).with_auto_download(true);
        let (import_tx, import_rx) = crossbeam_channel::unbounded();
        let (export_tx, export_rx) = crossbeam_channel::unbounded();

        Self {
            session: Session::new(config, ClockSurface::new(interval), loader),
            prober: FfprobeProber::locate(),
            runtime,
            import_tx,
            import_rx,
            importing: false,
            export_tx,
            export_rx,
            export_poll: interval,
        }
    }

    fn import(&mut self, ctx: &egui::Context) {
        let extensions = video_extensions();
        let picked = {
            let _guard = self.runtime.enter();
            rfd::FileDialog::new()
                .set_title("Add clips")
                .add_filter("Video", extensions.as_slice())
                .pick_files()
        };
        let Some(paths) = picked else {
            return;
        };

        let files: Vec<MediaFile> = paths.into_iter().map(MediaFile::from_path).collect();
        let sources = self.session.begin_import(files);
        if sources.is_empty() {
            return;
        }

        self.importing = true;
        let prober = self.prober.clone();
        let tx = self.import_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let probed = probe_sources(&prober, sources).await;
            if tx.send(probed).is_err() {
                error!("Import finished after the window closed");
            }
            ctx.request_repaint();
        });
    }

    fn collect_import(&mut self) {
        while let Ok(probed) = self.import_rx.try_recv() {
            self.importing = false;
            let added = self.session.finish_import(probed);
            info!(added = added.len(), "Import finished");
        }
    }

    fn start_export(&mut self, ctx: &egui::Context) {
        let job = match self.session.prepare_export() {
            Ok(job) => job,
            Err(e) => {
                info!("Export not started: {e}");
                return;
            }
        };
        let tx = self.export_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = job.await;
            if tx.send(outcome).is_err() {
                error!("Export finished after the window closed");
            }
            ctx.request_repaint();
        });
    }

    fn collect_export(&mut self) {
        while let Ok(outcome) = self.export_rx.try_recv() {
            if self.session.finish_export(outcome).is_ok() {
                info!("Montage ready to save");
            }
        }
    }

    fn save_result(&self) {
        let Some(artifact) = self.session.result() else {
            return;
        };
        let picked = {
            let _guard = self.runtime.enter();
            rfd::FileDialog::new()
                .set_title("Save montage")
                .set_file_name(&artifact.file_name)
                .add_filter("MP4 video", &["mp4"])
                .save_file()
        };
        if let Some(path) = picked {
            if let Err(e) = artifact.save_to(&path) {
                error!(path = %path.display(), "Failed to save montage: {e}");
            }
        }
    }

    /// Feed due surface events to the scheduler.
    fn pump_preview(&mut self) {
        let events = self.session.surface_mut().poll(Instant::now());
        for event in events {
            self.session.handle_surface_event(event);
        }
    }

    fn clip_list(&mut self, ui: &mut egui::Ui) {
        let mut actions = Vec::new();
        let timeline = self.session.timeline();
        let count = timeline.len();
        let active = self.session.preview().active_clip_id();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, clip) in timeline.iter().enumerate() {
                let id = clip.id();
                ui.group(|ui| {
                    let title = format!("{}. {}", index + 1, clip.name());
                    if active == Some(id) {
                        ui.colored_label(egui::Color32::LIGHT_GREEN, title);
                    } else {
                        ui.strong(title);
                    }
                    ui.label(format!(
                        "{} of {}",
                        format_timecode(clip.trimmed_duration()),
                        format_timecode(clip.total_duration())
                    ));

                    let mut start = clip.trim_start();
                    let mut end = clip.trim_end();
                    ui.horizontal(|ui| {
                        ui.label("Start");
                        let drag = egui::DragValue::new(&mut start)
                            .speed(0.05)
                            .range(0.0..=clip.total_duration())
                            .max_decimals(2)
                            .suffix(" s");
                        if ui.add(drag).changed() {
                            actions.push(ClipAction::Trim(id, TrimUpdate::start(start)));
                        }
                        ui.label("End");
                        let drag = egui::DragValue::new(&mut end)
                            .speed(0.05)
                            .range(0.0..=clip.total_duration())
                            .max_decimals(2)
                            .suffix(" s");
                        if ui.add(drag).changed() {
                            actions.push(ClipAction::Trim(id, TrimUpdate::end(end)));
                        }
                    });

                    ui.horizontal(|ui| {
                        if ui.add_enabled(index > 0, egui::Button::new("Up")).clicked() {
                            actions.push(ClipAction::Move(id, MoveDirection::Earlier));
                        }
                        if ui.add_enabled(index + 1 < count, egui::Button::new("Down")).clicked() {
                            actions.push(ClipAction::Move(id, MoveDirection::Later));
                        }
                        if ui.button("Remove").clicked() {
                            actions.push(ClipAction::Remove(id));
                        }
                    });
                });
            }
            if count == 0 {
                ui.label("No clips yet. Use \"Add clips...\" to import videos.");
            }
        });

        for action in actions {
            match action {
                ClipAction::Remove(id) => {
                    self.session.remove_clip(id);
                }
                ClipAction::Move(id, direction) => {
                    self.session.move_clip(id, direction);
                }
                ClipAction::Trim(id, update) => {
                    self.session.set_trim(id, update);
                }
            }
        }
    }

    fn preview_view(&self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(20, 20, 20));

        let preview = self.session.preview();
        let surface = preview.surface();
        match (preview.state(), surface.bound()) {
            (PreviewState::PlayingClip(index), Some(name)) => {
                let frame_size = egui::vec2(
                    (rect.width() * 0.6).min(640.0),
                    (rect.height() * 0.6).min(360.0),
                );
                let frame = egui::Rect::from_center_size(rect.center(), frame_size);
                painter.rect_filled(frame, 4.0, egui::Color32::from_rgb(45, 45, 55));
                painter.text(
                    frame.center(),
                    egui::Align2::CENTER_CENTER,
                    name,
                    egui::FontId::proportional(18.0),
                    egui::Color32::WHITE,
                );

                let info = format!(
                    "Clip {} of {} | {}",
                    index + 1,
                    self.session.timeline().len(),
                    format_timecode(surface.position())
                );
                painter.text(
                    egui::pos2(rect.center().x, frame.bottom() + 20.0),
                    egui::Align2::CENTER_TOP,
                    info,
                    egui::FontId::proportional(14.0),
                    egui::Color32::WHITE,
                );
            }
            _ => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Add clips and press Preview",
                    egui::FontId::proportional(16.0),
                    egui::Color32::GRAY,
                );
            }
        }
    }
}

impl eframe::App for MontageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_import();
        self.collect_export();
        self.pump_preview();

        if self.session.preview().is_playing() {
            ctx.request_repaint();
        } else if self.session.is_processing() || self.importing {
            ctx.request_repaint_after(self.export_poll);
        }

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.importing, egui::Button::new("Add clips..."))
                    .clicked()
                {
                    self.import(ctx);
                }
                ui.separator();

                if self.session.preview().is_playing() {
                    if ui.button("Stop").clicked() {
                        self.session.stop_preview();
                    }
                } else if ui.button("Preview").clicked() {
                    if let Err(e) = self.session.start_preview() {
                        info!("Preview not started: {e}");
                    }
                }
                ui.separator();

                let idle = !self.session.is_processing();
                if ui.add_enabled(idle, egui::Button::new("Export")).clicked() {
                    self.start_export(ctx);
                }
                let has_result = self.session.result().is_some();
                if ui
                    .add_enabled(has_result, egui::Button::new("Save montage..."))
                    .clicked()
                {
                    self.save_result();
                }
                ui.separator();
                ui.label(format!(
                    "Total: {}",
                    format_timecode(self.session.total_duration())
                ));
            });
        });

        // Status line and export progress
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let status = self.session.status();
            if status.is_error() {
                ui.colored_label(egui::Color32::LIGHT_RED, status.to_string());
            } else {
                ui.label(status.to_string());
            }
            if self.session.is_processing() {
                let progress = self.session.progress() as f32;
                ui.add(egui::ProgressBar::new(progress).show_percentage());
            }
        });

        // Clip list on left
        egui::SidePanel::left("clip_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Clips");
                ui.separator();
                self.clip_list(ui);
            });

        // Preview viewport
        egui::CentralPanel::default().show(ctx, |ui| {
            self.preview_view(ui);
        });
    }
}
