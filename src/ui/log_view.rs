use eframe::egui;

use crate::LogSink;

#[derive(Debug)]
pub enum Response {
    Save,
}

pub struct LogWidget {
    log: LogSink,
    text: String,
    generation: u64,
    pub auto_scroll: bool,
}

impl LogWidget {
    pub fn new(log: LogSink, auto_scroll: bool) -> Self {
        Self {
            log,
            text: String::new(),
            generation: u64::MAX,
            auto_scroll,
        }
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    #[must_use]
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<Response> {
        let mut response = None;

        // Only copy the dumps when they changed, so as not to hold the
        // log sink while the relays are appending.
        if let Some((generation, text)) = self.log.snapshot_if_changed(self.generation) {
            self.generation = generation;
            self.text = text;
        }

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.checkbox(&mut self.auto_scroll, "automatic scrolling");

                if ui.button("Clear").on_hover_text("clear dumps").clicked() {
                    self.log.clear();
                }

                #[cfg(feature = "save")]
                if ui
                    .add_enabled(!self.text.is_empty(), egui::Button::new("Save"))
                    .on_hover_text("save shown dumps to a file")
                    .clicked()
                {
                    response = Some(Response::Save);
                }
            });

            ui.separator();
            egui::ScrollArea::both()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.monospace(self.text.as_str());

                    if self.auto_scroll {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
        });

        response
    }
}
