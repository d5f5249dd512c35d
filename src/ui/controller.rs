use anyhow::Context;
use crossbeam_channel as channel;
use eframe::egui;
use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex},
};

use crate::{
    midi::{Backend, Directory},
    session::Selection,
    LogSink, Session,
};

#[derive(Debug)]
pub enum Request {
    Start(Selection),
    Stop,
    RefreshDevices,
    Shutdown,
}

pub struct Spawner {
    pub err_tx: channel::Sender<anyhow::Error>,
    pub log: LogSink,
    pub backend: Box<dyn Backend + Send>,
    pub devices_widget: Arc<Mutex<super::DevicesWidget>>,
    pub egui_ctx: egui::Context,
}

impl Spawner {
    pub fn spawn(self) -> Handle {
        let (req_tx, req_rx) = channel::unbounded();

        let thread = std::thread::spawn(move || {
            Controller::run(
                req_rx,
                self.err_tx,
                self.log,
                self.backend,
                self.devices_widget,
                self.egui_ctx,
            );
        });

        Handle {
            req_tx,
            thread: Some(thread),
        }
    }
}

/// The UI side of the controller thread.
pub struct Handle {
    req_tx: channel::Sender<Request>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Handle {
    pub fn send(&self, request: Request) {
        if let Err(err) = self.req_tx.send(request) {
            log::error!("Controller is gone: {}", err);
        }
    }

    /// Stops the controller, which closes the devices.
    ///
    /// Only the first call has an effect.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            if let Err(err) = self.req_tx.send(Request::Shutdown) {
                log::error!("Couldn't request shutdown: {}", err);
            } else {
                let _ = thread.join();
            }
        }
    }
}

/// Owns the session: start & stop requests are handled one at a time here,
/// never from the MIDI delivery threads.
struct Controller {
    err_tx: channel::Sender<anyhow::Error>,

    backend: Box<dyn Backend + Send>,
    directory: Directory,
    session: Session,

    devices_widget: Arc<Mutex<super::DevicesWidget>>,
    egui_ctx: egui::Context,
}

impl Controller {
    fn run(
        req_rx: channel::Receiver<Request>,
        err_tx: channel::Sender<anyhow::Error>,
        log: LogSink,
        backend: Box<dyn Backend + Send>,
        devices_widget: Arc<Mutex<super::DevicesWidget>>,
        egui_ctx: egui::Context,
    ) {
        let (fault_tx, fault_rx) = channel::unbounded();

        Self {
            err_tx,

            backend,
            directory: Directory::default(),
            session: Session::new(log, fault_tx),

            devices_widget,
            egui_ctx,
        }
        .run_loop(req_rx, fault_rx);
    }

    fn handle(&mut self, request: Request) -> anyhow::Result<ControlFlow<(), ()>> {
        use Request::*;
        match request {
            Start(selection) => self.start(selection)?,
            Stop => self.stop(),
            RefreshDevices => self.refresh_devices()?,
            Shutdown => {
                self.session.stop();
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    fn start(&mut self, selection: Selection) -> anyhow::Result<()> {
        let res = self
            .session
            .start(&self.directory, &selection)
            .context("Couldn't start relaying");
        self.update_widget();

        res
    }

    fn stop(&mut self) {
        self.session.stop();
        self.update_widget();
    }

    fn refresh_devices(&mut self) -> anyhow::Result<()> {
        if self.session.is_running() {
            anyhow::bail!("Stop relaying before refreshing devices");
        }

        self.directory =
            Directory::enumerate(self.backend.as_ref()).context("Failed to refresh devices")?;
        self.update_widget();

        Ok(())
    }

    fn update_widget(&self) {
        self.devices_widget
            .lock()
            .unwrap()
            .update(&self.directory, self.session.state());
        self.egui_ctx.request_repaint();
    }

    fn report(&self, err: anyhow::Error) {
        log::error!("{:#}", err);
        let _ = self.err_tx.send(err);
        self.egui_ctx.request_repaint();
    }

    fn run_loop(
        mut self,
        req_rx: channel::Receiver<Request>,
        fault_rx: channel::Receiver<crate::relay::Fault>,
    ) {
        if let Err(err) = self.refresh_devices() {
            self.report(err);
        }

        loop {
            channel::select! {
                recv(req_rx) -> request => {
                    match request {
                        Ok(request) => match self.handle(request) {
                            Ok(ControlFlow::Continue(())) => (),
                            Ok(ControlFlow::Break(())) => break,
                            Err(err) => self.report(err),
                        }
                        Err(err) => {
                            log::error!("Error UI request channel: {err}");
                            break;
                        }
                    }
                }
                recv(fault_rx) -> fault => {
                    if let Ok(fault) = fault {
                        let err = anyhow::Error::new(fault)
                            .context("Forwarding failed, relaying needs to be stopped");
                        self.report(err);
                    }
                }
            }
        }

        self.session.stop();
        log::debug!("Shutting down Controller loop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        midi::{
            mock::{MockBackend, MockDevice},
            Capabilities,
        },
        ui::{DevicesWidget, Settings},
    };

    fn spawn(devices: &[Arc<MockDevice>]) -> (Handle, channel::Receiver<anyhow::Error>) {
        let (err_tx, err_rx) = channel::unbounded();
        let handle = Spawner {
            err_tx,
            log: LogSink::default(),
            backend: Box::new(MockBackend::new(devices.to_vec())),
            devices_widget: Arc::new(Mutex::new(DevicesWidget::new(&Settings::default()))),
            egui_ctx: egui::Context::default(),
        }
        .spawn();

        (handle, err_rx)
    }

    fn opens_and_closes(device: &MockDevice) -> (usize, usize) {
        let input = device.input_port();
        let output = device.output_port();
        (input.opens + output.opens, input.closes + output.closes)
    }

    #[test]
    fn shutdown_closes_the_running_session() {
        let devices = [
            MockDevice::new("Keyboard", Capabilities::INPUT),
            MockDevice::new("Pads", Capabilities::INPUT),
            MockDevice::new("Synth", Capabilities::OUTPUT),
            MockDevice::new("DAW", Capabilities::OUTPUT),
        ];
        let (mut handle, err_rx) = spawn(&devices);

        handle.send(Request::Start(Selection::new(0, 0, 1, 1)));
        handle.shutdown();

        assert!(err_rx.try_recv().is_err());
        for device in &devices {
            assert_eq!(opens_and_closes(device), (1, 1));
        }

        // Nothing left to stop.
        handle.shutdown();
        for device in &devices {
            assert_eq!(opens_and_closes(device), (1, 1));
        }
    }

    #[test]
    fn failed_start_is_reported() {
        let devices = [
            MockDevice::new("Keyboard", Capabilities::INPUT),
            MockDevice::new("Synth", Capabilities::OUTPUT),
        ];
        let (mut handle, err_rx) = spawn(&devices);

        handle.send(Request::Start(Selection::new(0, 0, 0, 0)));
        handle.shutdown();

        let err = err_rx.try_recv().unwrap();
        assert!(format!("{:#}", err).starts_with("Couldn't start relaying"));
        for device in &devices {
            assert_eq!(opens_and_closes(device), (0, 0));
        }
    }
}
