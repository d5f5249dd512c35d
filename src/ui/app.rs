use crossbeam_channel as channel;
use eframe::egui;
use std::sync::{Arc, Mutex};

use super::controller::{self, Request};
use crate::{midi::MidirBackend, LogSink};

pub struct App {
    controller: controller::Handle,
    err_rx: channel::Receiver<anyhow::Error>,
    devices_widget: Arc<Mutex<super::DevicesWidget>>,
    log_widget: super::LogWidget,
    #[cfg(feature = "save")]
    save_dialog: super::save::SaveDialog,
    last_err: Option<anyhow::Error>,
}

impl App {
    pub fn new(client_name: &str, cc: &eframe::CreationContext) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let settings = super::Settings::load(cc.storage);

        let log = LogSink::default();
        let egui_ctx = cc.egui_ctx.clone();
        log.set_waker(move || egui_ctx.request_repaint());

        let (err_tx, err_rx) = channel::unbounded();

        let devices_widget = Arc::new(Mutex::new(super::DevicesWidget::new(&settings)));

        let controller = controller::Spawner {
            err_tx,
            log: log.clone(),
            backend: Box::new(MidirBackend::new(client_name.into())),
            devices_widget: devices_widget.clone(),
            egui_ctx: cc.egui_ctx.clone(),
        }
        .spawn();

        Self {
            controller,
            err_rx,
            devices_widget,
            log_widget: super::LogWidget::new(log, settings.auto_scroll),
            #[cfg(feature = "save")]
            save_dialog: super::save::SaveDialog::new(settings.save_dir),
            last_err: None,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pop_error();

        let devices_widget = &self.devices_widget;
        let resp = egui::TopBottomPanel::top("devices")
            .show(ctx, |ui| {
                ui.add_space(4f32);
                let resp = devices_widget.lock().unwrap().show(ui);
                ui.add_space(4f32);

                resp
            })
            .inner;

        if let Some(resp) = resp {
            use super::devices::Response::*;

            self.last_err = None;
            match resp {
                Start(selection) => self.controller.send(Request::Start(selection)),
                Stop => self.controller.send(Request::Stop),
                RefreshDevices => self.controller.send(Request::RefreshDevices),
            }
        }

        if let Some(ref err) = self.last_err {
            let text = egui::RichText::new(format!("{:#}", err))
                .color(egui::Color32::WHITE)
                .background_color(egui::Color32::DARK_RED);

            let mut dismissed = false;
            egui::TopBottomPanel::bottom("error").show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    use egui::Widget;
                    let label = egui::Label::new(text).sense(egui::Sense::click());
                    if label.ui(ui).clicked() {
                        dismissed = true;
                    }
                })
            });

            if dismissed {
                self.last_err = None;
            }
        }

        let log_widget = &mut self.log_widget;
        let resp = egui::CentralPanel::default()
            .show(ctx, |ui| log_widget.show(ui))
            .inner;

        #[cfg(feature = "save")]
        if let Some(super::log_view::Response::Save) = resp {
            self.last_err = None;
            if let Err(err) = self.save_dialog.choose(self.log_widget.log()) {
                self.save_failed(err);
            }
        }

        #[cfg(not(feature = "save"))]
        let _ = resp;

        #[cfg(feature = "save")]
        if let Err(err) = self.save_dialog.show(ctx, self.log_widget.log()) {
            self.save_failed(err);
        }
    }

    #[cfg(feature = "save")]
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings().store(storage);
    }

    fn on_exit(&mut self, _gl: &eframe::glow::Context) {
        log::debug!("Shutting down");
        self.controller.shutdown();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // In case the app is dropped without going through `on_exit`.
        self.controller.shutdown();
    }
}

impl App {

    fn pop_error(&mut self) {
        if let Ok(err) = self.err_rx.try_recv() {
            self.last_err = Some(err);
        }
    }

    #[cfg(feature = "save")]
    fn save_failed(&mut self, err: crate::log_sink::SaveError) {
        log::error!("{}", err);
        self.last_err = Some(err.into());
    }

    #[cfg(feature = "save")]
    fn settings(&self) -> super::Settings {
        let (ins, outs) = self.devices_widget.lock().unwrap().selected_names();

        super::Settings {
            ins,
            outs,
            auto_scroll: self.log_widget.auto_scroll,
            save_dir: self.save_dialog.last_dir.clone(),
        }
    }
}
