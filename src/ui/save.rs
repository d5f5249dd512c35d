use eframe::egui;
use std::path::{Path, PathBuf};

use crate::{log_sink::SaveError, LogSink};

const DEFAULT_FILE_NAME: &str = "dump.txt";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Overwrite {
    Yes,
    ChooseAgain,
    Cancel,
}

/// Picks the file the dumps are saved to, asking before overwriting.
#[derive(Default)]
pub struct SaveDialog {
    pub last_dir: Option<PathBuf>,
    existing: Option<PathBuf>,
}

impl SaveDialog {
    pub fn new(last_dir: Option<PathBuf>) -> Self {
        Self {
            last_dir,
            existing: None,
        }
    }

    /// Asks for a file and saves to it, unless it exists: in that case
    /// the overwrite confirmation is shown by [`Self::show`].
    pub fn choose(&mut self, log: &LogSink) -> Result<(), SaveError> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Select file for dumps...")
            .set_file_name(DEFAULT_FILE_NAME);
        if let Some(ref dir) = self.last_dir {
            dialog = dialog.set_directory(dir);
        }

        let path = match dialog.save_file() {
            Some(path) => path,
            None => return Ok(()),
        };

        self.last_dir = path.parent().map(Path::to_path_buf);

        if path.exists() {
            self.existing = Some(path);
            return Ok(());
        }

        log.save(&path)
    }

    /// Shows the overwrite confirmation if one is pending.
    pub fn show(&mut self, ctx: &egui::Context, log: &LogSink) -> Result<(), SaveError> {
        let path = match self.existing {
            Some(ref path) => path,
            None => return Ok(()),
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        let mut answer = None;
        egui::Window::new("File exists...")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Overwrite existing file '{}' ?", file_name));
                ui.horizontal(|ui| {
                    if ui.button("Overwrite").clicked() {
                        answer = Some(Overwrite::Yes);
                    }
                    if ui.button("Choose again").clicked() {
                        answer = Some(Overwrite::ChooseAgain);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(Overwrite::Cancel);
                    }
                });
            });

        match answer {
            Some(answer) => {
                let path = self.existing.take();
                match (answer, path) {
                    (Overwrite::Yes, Some(path)) => log.save(&path),
                    (Overwrite::ChooseAgain, _) => self.choose(log),
                    _ => Ok(()),
                }
            }
            None => Ok(()),
        }
    }
}
