use crossbeam_channel as channel;

use crate::{
    midi::{DeviceError, Directory, Endpoint, InputEndpoint, OutputEndpoint, PortNb},
    relay::{Fault, Relay, INBOUND_PREFIX, OUTBOUND_PREFIX},
    LogSink,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No {0} input device selected!")]
    MissingInput(PortNb),

    #[error("No {0} output device selected!")]
    MissingOutput(PortNb),

    #[error("Same device chosen for both outputs!")]
    SameOutputs,

    #[error("Same device chosen for both inputs!")]
    SameInputs,

    #[error("Unknown input device #{0}")]
    UnknownInput(usize),

    #[error("Unknown output device #{0}")]
    UnknownOutput(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Selection(#[from] SelectionError),

    #[error("{0}")]
    Device(#[from] DeviceError),

    #[error("Session already running")]
    AlreadyRunning,
}

/// Indices of the selected devices in the [`Directory`] lists.
///
/// Devices are selected by position, not by name: display names
/// are not guaranteed to be unique.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub ins: [Option<usize>; 2],
    pub outs: [Option<usize>; 2],
}

impl Selection {
    #[cfg(test)]
    pub fn new(input1: usize, output1: usize, input2: usize, output2: usize) -> Self {
        Self {
            ins: [Some(input1), Some(input2)],
            outs: [Some(output1), Some(output2)],
        }
    }

    pub fn input(&self, port_nb: PortNb) -> Option<usize> {
        self.ins[port_nb.idx()]
    }

    pub fn output(&self, port_nb: PortNb) -> Option<usize> {
        self.outs[port_nb.idx()]
    }

    /// Checks the selection is complete and consistent.
    ///
    /// Returns the indices as `[input1, output1, input2, output2]`.
    pub fn validate(&self) -> Result<[usize; 4], SelectionError> {
        use PortNb::*;

        let input1 = self.input(One).ok_or(SelectionError::MissingInput(One))?;
        let output1 = self.output(One).ok_or(SelectionError::MissingOutput(One))?;
        let input2 = self.input(Two).ok_or(SelectionError::MissingInput(Two))?;
        let output2 = self.output(Two).ok_or(SelectionError::MissingOutput(Two))?;

        if output1 == output2 {
            return Err(SelectionError::SameOutputs);
        }
        if input1 == input2 {
            return Err(SelectionError::SameInputs);
        }

        Ok([input1, output1, input2, output2])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
}

/// Two crossed relays: input 1 to output 2 and input 2 to output 1.
pub struct Session {
    relays: Option<(Relay, Relay)>,
    log: LogSink,
    faults: channel::Sender<Fault>,
}

impl Session {
    /// `faults` receives the messages which couldn't be forwarded.
    pub fn new(log: LogSink, faults: channel::Sender<Fault>) -> Self {
        Self {
            relays: None,
            log,
            faults,
        }
    }

    pub fn state(&self) -> State {
        if self.relays.is_some() {
            State::Running
        } else {
            State::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.relays.is_some()
    }

    /// Opens the selected devices and wires the relays.
    ///
    /// The selection is checked before any device is touched. If a device
    /// can't be opened or wired, the devices opened so far are closed and
    /// the session stays idle.
    pub fn start(
        &mut self,
        directory: &Directory,
        selection: &Selection,
    ) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }

        let [input1, output1, input2, output2] = selection.validate()?;

        let input = |idx: usize| {
            directory
                .input(idx)
                .ok_or(SelectionError::UnknownInput(idx))
        };
        let output = |idx: usize| {
            directory
                .output(idx)
                .ok_or(SelectionError::UnknownOutput(idx))
        };

        let mut input1 = input(input1)??;
        let mut output1 = output(output1)??;
        let mut input2 = input(input2)??;
        let mut output2 = output(output2)??;

        open_all(
            input1.as_mut(),
            output1.as_mut(),
            input2.as_mut(),
            output2.as_mut(),
        )?;

        let relay1 = match Relay::create(
            input1,
            OUTBOUND_PREFIX,
            output2,
            self.log.clone(),
            self.faults.clone(),
        ) {
            Ok(relay) => relay,
            Err(err) => {
                input2.close();
                output1.close();
                return Err(err.into());
            }
        };

        let relay2 = match Relay::create(
            input2,
            INBOUND_PREFIX,
            output1,
            self.log.clone(),
            self.faults.clone(),
        ) {
            Ok(relay) => relay,
            Err(err) => {
                relay1.close();
                return Err(err.into());
            }
        };

        self.relays = Some((relay1, relay2));
        log::info!("Session started");

        Ok(())
    }

    /// Closes both relays and their devices. Does nothing if idle.
    pub fn stop(&mut self) {
        if let Some((relay1, relay2)) = self.relays.take() {
            relay1.close();
            relay2.close();
            log::info!("Session stopped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Opens the endpoints in order, closing the opened ones on failure.
fn open_all(
    input1: &mut dyn InputEndpoint,
    output1: &mut dyn OutputEndpoint,
    input2: &mut dyn InputEndpoint,
    output2: &mut dyn OutputEndpoint,
) -> Result<(), DeviceError> {
    input1.open()?;

    if let Err(err) = output1.open() {
        input1.close();
        return Err(err);
    }

    if let Err(err) = input2.open() {
        output1.close();
        input1.close();
        return Err(err);
    }

    if let Err(err) = output2.open() {
        input2.close();
        output1.close();
        input1.close();
        return Err(err);
    }

    Ok(())
}
