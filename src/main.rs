//! Main application for the video download form

use std::{path::PathBuf, sync::Arc};

// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::{Color32, Visuals};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tokio::runtime::Runtime;

use video_fetch_gui::{
    config::{self, AppConfig},
    controller::FormController,
    logging,
    model::OutputFormat,
};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 38, 38);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(22, 163, 74);

/// Program entry point: logging, config, runtime, then the window
fn main() -> anyhow::Result<()> {
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {e:#}");
    }

    let cfg = config::load_or_init().unwrap_or_else(|e| {
        tracing::warn!("config unavailable, using defaults: {e:#}");
        AppConfig::default().with_env(std::env::var(config::BACKEND_URL_ENV).ok())
    });
    tracing::info!(backend = %cfg.backend_url, dir = %cfg.download_dir.display(), "starting");

    let rt = RUNTIME.get_or_try_init(|| Runtime::new().map(Arc::new))?;
    let controller = FormController::from_config(&cfg, rt.handle().clone())?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([440.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            // Wake the UI as soon as a download settles
            let ctx = cc.egui_ctx.clone();
            let controller = controller.with_repaint(Arc::new(move || ctx.request_repaint()));
            Box::new(DownloaderApp::new(controller))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}

/// Application state for the GUI
struct DownloaderApp {
    /// Form state and the running request
    controller: FormController,
    /// Editable text of the destination folder
    folder_input: String,
}

impl DownloaderApp {
    fn new(controller: FormController) -> Self {
        let folder_input = controller.download_dir().display().to_string();
        Self {
            controller,
            folder_input,
        }
    }

    fn start_download(&mut self) {
        let folder = self.folder_input.trim();
        if !folder.is_empty() {
            self.controller.set_download_dir(PathBuf::from(folder));
        }
        self.controller.submit();
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.controller.poll();
        let enabled = self.controller.state.inputs_enabled();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("⬇ YouTube Downloader");
                ui.label("Baixe vídeos do YouTube de forma simples");
            });
            ui.add_space(12.0);

            // URL input field; Enter submits
            ui.label("🔗 Link do YouTube");
            let url_field = ui.add_enabled(
                enabled,
                egui::TextEdit::singleline(&mut self.controller.state.url)
                    .hint_text("https://www.youtube.com/watch?v=...")
                    .desired_width(f32::INFINITY),
            );
            let enter_pressed =
                url_field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            // Format dropdown
            ui.label("Formato");
            ui.add_enabled_ui(enabled, |ui| {
                egui::ComboBox::from_id_source("format")
                    .selected_text(self.controller.state.format.label())
                    .show_ui(ui, |ui| {
                        for format in OutputFormat::ALL {
                            ui.selectable_value(
                                &mut self.controller.state.format,
                                format,
                                format.label(),
                            );
                        }
                    });
            });

            // Folder selection
            ui.label("Pasta de destino");
            ui.add_enabled_ui(enabled, |ui| {
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.folder_input);
                    if ui.button("Procurar…").clicked() {
                        if let Some(folder) = FileDialog::new()
                            .set_directory(&self.folder_input)
                            .pick_folder()
                        {
                            self.folder_input = folder.display().to_string();
                        }
                    }
                });
            });
            ui.add_space(8.0);

            // Download button, or spinner + cancel while a request is in flight
            ui.horizontal(|ui| {
                if self.controller.is_loading() {
                    ui.add_enabled(false, egui::Button::new("Baixando..."));
                    ui.spinner();
                    if ui.button("Cancelar").clicked() {
                        self.controller.cancel();
                    }
                } else if ui.button("⬇ Baixar").clicked() || enter_pressed {
                    self.start_download();
                }
            });

            if let Some(progress) = self.controller.progress() {
                match progress.fraction() {
                    Some(f) => {
                        ui.add(egui::ProgressBar::new(f).show_percentage());
                    }
                    None => {
                        ui.label(format!("{} KiB recebidos", progress.received / 1024));
                    }
                }
            }

            let state = &self.controller.state;
            if !state.message.is_empty() {
                let color = if state.is_error() { ERROR_COLOR } else { SUCCESS_COLOR };
                ui.vertical_centered(|ui| {
                    ui.colored_label(color, state.message.as_str());
                });
            }

            if !self.controller.is_loading() && !self.controller.state.is_error() {
                if let Some(saved) = self.controller.last_saved() {
                    if ui.button("Abrir pasta").clicked() {
                        if let Some(folder) = saved.path.parent() {
                            open_folder(folder.to_path_buf());
                        }
                    }
                }
            }

            ui.add_space(16.0);
            ui.vertical_centered(|ui| {
                ui.small("Respeite os direitos autorais dos criadores de conteúdo");
            });
        });

        // Keep progress moving while downloading
        if self.controller.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

/// Opens the folder in the platform file manager without blocking the UI
fn open_folder(folder: PathBuf) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";

        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            tracing::warn!("could not open {}: {e}", folder.display());
        }
    });
}
