use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    Backend, Capabilities, Device, DeviceError, Endpoint, ForwardError, InputEndpoint,
    MessageSink, Msg, OutputEndpoint,
};

pub type MidiIn = MidiIO<midir::MidiInput, midir::MidiInputConnection<()>>;
pub type MidiOut = MidiIO<midir::MidiOutput, midir::MidiOutputConnection>;

pub enum MidiIO<IO, C> {
    Connected(C),
    Disconnected(IO),
    None,
}

impl<IO, C> Default for MidiIO<IO, C> {
    fn default() -> Self {
        Self::None
    }
}

impl<IO, C> MidiIO<IO, C> {
    pub fn io(&self) -> Option<&IO> {
        match self {
            Self::Disconnected(io) => Some(io),
            _ => None,
        }
    }

    pub fn conn(&mut self) -> Option<&mut C> {
        match self {
            Self::Connected(conn) => Some(conn),
            _ => None,
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Enumerates the ports of the system MIDI API through `midir`.
pub struct MidirBackend {
    client_name: Arc<str>,
}

impl MidirBackend {
    pub fn new(client_name: Arc<str>) -> Self {
        Self { client_name }
    }

    /// Returns the name to list for `port_name`, `None` for our own ports.
    fn listed_name(&self, port_name: &str) -> Option<Arc<str>> {
        if port_name.starts_with(self.client_name.as_ref()) {
            return None;
        }

        #[cfg(feature = "jack")]
        let port_name = port_name.strip_prefix("Midi-Bridge:").unwrap_or(port_name);

        Some(port_name.into())
    }
}

impl Backend for MidirBackend {
    fn devices(&self) -> Result<Vec<Arc<dyn Device>>, DeviceError> {
        let midi_in = midir::MidiInput::new(&format!("{} enumeration", self.client_name))?;
        let midi_out = midir::MidiOutput::new(&format!("{} enumeration", self.client_name))?;

        let mut devices = Vec::<Arc<dyn Device>>::new();

        for port in midi_in.ports() {
            match midi_in.port_name(&port) {
                Ok(port_name) => {
                    if let Some(name) = self.listed_name(&port_name) {
                        devices.push(Arc::new(MidirDevice {
                            name,
                            client_name: self.client_name.clone(),
                            port: MidirPort::Input(port),
                        }));
                    }
                }
                Err(err) => log::warn!("Skipping input port: {}", err),
            }
        }

        for port in midi_out.ports() {
            match midi_out.port_name(&port) {
                Ok(port_name) => {
                    if let Some(name) = self.listed_name(&port_name) {
                        devices.push(Arc::new(MidirDevice {
                            name,
                            client_name: self.client_name.clone(),
                            port: MidirPort::Output(port),
                        }));
                    }
                }
                Err(err) => log::warn!("Skipping output port: {}", err),
            }
        }

        log::debug!("Found {} MIDI port(s)", devices.len());

        Ok(devices)
    }
}

enum MidirPort {
    Input(midir::MidiInputPort),
    Output(midir::MidiOutputPort),
}

/// A `midir` port.
///
/// `midir` lists inputs and outputs separately: each port is a device
/// with a single capability.
pub struct MidirDevice {
    name: Arc<str>,
    client_name: Arc<str>,
    port: MidirPort,
}

impl Device for MidirDevice {
    fn name(&self) -> &Arc<str> {
        &self.name
    }

    fn capabilities(&self) -> Result<Capabilities, DeviceError> {
        Ok(match self.port {
            MidirPort::Input(_) => Capabilities::INPUT,
            MidirPort::Output(_) => Capabilities::OUTPUT,
        })
    }

    fn input(&self) -> Result<Box<dyn InputEndpoint>, DeviceError> {
        match &self.port {
            MidirPort::Input(port) => Ok(Box::new(MidirInput {
                port: port.clone(),
                name: self.name.clone(),
                client_name: self.client_name.clone(),
                midi_in: MidiIn::None,
            })),
            MidirPort::Output(_) => Err(DeviceError::NotAnInput(self.name.clone())),
        }
    }

    fn output(&self) -> Result<Box<dyn OutputEndpoint>, DeviceError> {
        match &self.port {
            MidirPort::Output(port) => Ok(Box::new(MidirOutput {
                port: port.clone(),
                name: self.name.clone(),
                client_name: self.client_name.clone(),
                midi_out: Arc::new(Mutex::new(MidiOut::None)),
            })),
            MidirPort::Input(_) => Err(DeviceError::NotAnOutput(self.name.clone())),
        }
    }
}

pub struct MidirInput {
    port: midir::MidiInputPort,
    name: Arc<str>,
    client_name: Arc<str>,
    midi_in: MidiIn,
}

impl MidirInput {
    fn disconnect(&mut self) {
        if self.midi_in.is_connected() {
            match std::mem::take(&mut self.midi_in) {
                MidiIn::Connected(conn) => {
                    let (io, _) = conn.close();
                    self.midi_in = MidiIn::Disconnected(io);
                    log::debug!("Disconnected Input {}", self.name);
                }
                _ => unreachable!(),
            }
        }
    }
}

impl Endpoint for MidirInput {
    fn name(&self) -> &Arc<str> {
        &self.name
    }

    fn is_open(&self) -> bool {
        !self.midi_in.is_none()
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if self.is_open() {
            return Ok(());
        }

        let mut midi_input = midir::MidiInput::new(&self.client_name)?;
        midi_input.ignore(midir::Ignore::None);
        if midi_input.port_name(&self.port).is_err() {
            return Err(DeviceError::Unavailable(self.name.clone()));
        }

        self.midi_in = MidiIn::Disconnected(midi_input);
        log::debug!("Opened Input {}", self.name);

        Ok(())
    }

    fn close(&mut self) {
        self.disconnect();
        if self.midi_in.io().is_some() {
            self.midi_in = MidiIn::None;
            log::info!("Closed Input {}", self.name);
        }
    }
}

impl InputEndpoint for MidirInput {
    fn set_sink(&mut self, mut sink: Box<dyn MessageSink>) -> Result<(), DeviceError> {
        self.disconnect();

        match std::mem::take(&mut self.midi_in) {
            MidiIn::Disconnected(midi_input) => {
                let name = self.name.clone();
                match midi_input.connect(
                    &self.port,
                    &format!("{} in", self.client_name),
                    move |ts, buf, _| {
                        if let Err(err) = sink.on_message(Msg::new(Some(ts), buf)) {
                            log::trace!("Input {}: {}", name, err);
                        }
                    },
                    (),
                ) {
                    Ok(conn) => {
                        log::info!("Connected Input to {}", self.name);
                        self.midi_in = MidiIn::Connected(conn);
                    }
                    Err(err) => {
                        self.midi_in = MidiIn::Disconnected(err.into_inner());
                        let err = DeviceError::Connection(self.name.clone());
                        log::error!("{}", err);
                        return Err(err);
                    }
                }
            }
            MidiIn::None => return Err(DeviceError::NotOpen(self.name.clone())),
            MidiIn::Connected(_) => unreachable!(),
        }

        Ok(())
    }
}

fn lock_out(midi_out: &Mutex<MidiOut>) -> MutexGuard<'_, MidiOut> {
    midi_out.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MidirOutput {
    port: midir::MidiOutputPort,
    name: Arc<str>,
    client_name: Arc<str>,
    midi_out: Arc<Mutex<MidiOut>>,
}

impl Endpoint for MidirOutput {
    fn name(&self) -> &Arc<str> {
        &self.name
    }

    fn is_open(&self) -> bool {
        lock_out(&self.midi_out).is_connected()
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        let mut midi_out = lock_out(&self.midi_out);
        if midi_out.is_connected() {
            return Ok(());
        }

        let midi_output = midir::MidiOutput::new(&self.client_name)?;
        match midi_output.connect(&self.port, &format!("{} out", self.client_name)) {
            Ok(conn) => {
                log::info!("Connected Output to {}", self.name);
                *midi_out = MidiOut::Connected(conn);
            }
            Err(_) => {
                let err = DeviceError::Connection(self.name.clone());
                log::error!("{}", err);
                return Err(err);
            }
        }

        Ok(())
    }

    fn close(&mut self) {
        if let MidiOut::Connected(conn) = std::mem::take(&mut *lock_out(&self.midi_out)) {
            let _ = conn.close();
            log::info!("Closed Output {}", self.name);
        }
    }
}

impl OutputEndpoint for MidirOutput {
    fn receiver(&mut self) -> Result<Box<dyn MessageSink>, DeviceError> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }

        Ok(Box::new(OutputReceiver {
            name: self.name.clone(),
            midi_out: self.midi_out.clone(),
        }))
    }
}

/// Sends messages to a [`MidirOutput`] until it is closed.
struct OutputReceiver {
    name: Arc<str>,
    midi_out: Arc<Mutex<MidiOut>>,
}

impl MessageSink for OutputReceiver {
    fn on_message(&mut self, msg: Msg<'_>) -> Result<(), ForwardError> {
        // midir sends immediately: the timestamp can't be honoured.
        match lock_out(&self.midi_out).conn() {
            Some(conn) => conn.send(msg.bytes).map_err(|source| ForwardError::Send {
                name: self.name.clone(),
                source,
            }),
            None => Err(ForwardError::Closed(self.name.clone())),
        }
    }
}
